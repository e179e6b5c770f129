//! Connection pool management for the active database instance.
//!
//! The pool is created lazily on first acquire from the loader's active
//! instance and pool settings. A `tokio::sync::Mutex` around the pool slot
//! serializes racing first users so exactly one initialization proceeds;
//! later acquires clone the pool handle out of the slot.
//!
//! Releasing is by RAII: dropping the [`PoolConnection`] returns it to the
//! pool on every exit path, so a failed statement can never leak a
//! connection.

use std::sync::Arc;
use std::time::Duration;

use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::MySql;
use tokio::sync::Mutex;

use crate::config::{ConfigLoader, DbInstance, LoadedConfig};
use crate::error::{DbError, DbResult};

/// Lazily initialized, bounded pool of connections to the active instance.
pub struct DbPool {
    loader: Arc<ConfigLoader>,
    slot: Mutex<Option<MySqlPool>>,
}

impl DbPool {
    pub fn new(loader: Arc<ConfigLoader>) -> Self {
        Self {
            loader,
            slot: Mutex::new(None),
        }
    }

    fn connect_options(instance: &DbInstance) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&instance.db_host)
            .port(instance.db_port)
            .username(&instance.db_username)
            .password(&instance.db_password)
            .database(&instance.db_database)
    }

    async fn initialize(
        config: &LoadedConfig,
        instance: &DbInstance,
    ) -> DbResult<MySqlPool> {
        let max_connections = config.max_connections();
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(config.db_pool_timeout))
            .connect_with(Self::connect_options(instance))
            .await
            .map_err(DbError::PoolInitFailed)?;

        tracing::info!(
            instance = %instance.db_instance_id,
            pool_size = config.db_pool_size,
            max_connections,
            acquire_timeout_secs = config.db_pool_timeout,
            "database connection pool initialized"
        );
        Ok(pool)
    }

    /// Pool handle, initializing on first use. An acquire after [`close`]
    /// revives the pool; the slot mutex keeps revival race-free.
    ///
    /// [`close`]: DbPool::close
    async fn ensure_pool(&self) -> DbResult<MySqlPool> {
        let mut slot = self.slot.lock().await;
        if let Some(pool) = slot.as_ref() {
            if !pool.is_closed() {
                return Ok(pool.clone());
            }
        }
        let (config, instance) = self.loader.active_instance()?;
        let pool = Self::initialize(&config, &instance).await?;
        *slot = Some(pool.clone());
        Ok(pool)
    }

    /// Check one connection out of the pool, waiting up to the configured
    /// acquire timeout for one to free up.
    pub async fn acquire(&self) -> DbResult<PoolConnection<MySql>> {
        let pool = self.ensure_pool().await?;
        match pool.acquire().await {
            Ok(conn) => {
                tracing::debug!("connection checked out from pool");
                Ok(conn)
            }
            Err(sqlx::Error::PoolTimedOut) => Err(DbError::PoolExhausted),
            Err(e) => Err(DbError::PoolInitFailed(e)),
        }
    }

    /// Drain and invalidate the pool. Safe to call when the pool was never
    /// opened or is already closed.
    pub async fn close(&self) {
        let mut slot = self.slot.lock().await;
        match slot.take() {
            Some(pool) => {
                pool.close().await;
                tracing::info!("database connection pool closed");
            }
            None => {
                tracing::warn!("connection pool does not exist, nothing to close");
            }
        }
    }

    /// Number of live connections, `None` before first initialization.
    /// Exposed for connection-accounting checks.
    pub async fn live_connections(&self) -> Option<u32> {
        self.slot.lock().await.as_ref().map(MySqlPool::size)
    }
}
