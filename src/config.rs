//! Configuration loading for database instances and pool sizing.
//!
//! The configuration is a JSON file declaring a list of database instances
//! plus pool settings. The file path comes from the `config_file`
//! environment variable when it points at an existing file, otherwise
//! `dbconfig.json` in the working directory.
//!
//! The loader is an explicitly constructed service object handed to whoever
//! needs it; the first successful load is cached for the process lifetime
//! and shared as an `Arc`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::{DbError, DbResult};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "dbconfig.json";

/// Environment variable overriding the configuration file location.
pub const CONFIG_FILE_ENV: &str = "config_file";

fn default_pool_size() -> u32 {
    5
}

fn default_max_overflow() -> u32 {
    10
}

fn default_pool_timeout() -> u64 {
    30
}

/// One configured connection target.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbInstance {
    pub db_instance_id: String,
    pub db_host: String,
    pub db_port: u16,
    pub db_database: String,
    pub db_username: String,
    pub db_password: String,
    pub db_type: String,
    #[serde(default)]
    pub db_version: Option<String>,
    pub db_active: bool,
}

/// Parsed configuration file: instance list plus pool and log settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedConfig {
    pub db_list: Vec<DbInstance>,

    /// Base pool size.
    #[serde(default = "default_pool_size")]
    pub db_pool_size: u32,

    /// Additional connections allowed beyond the base size.
    #[serde(default = "default_max_overflow")]
    pub db_max_overflow: u32,

    /// Acquire timeout in seconds.
    #[serde(default = "default_pool_timeout")]
    pub db_pool_timeout: u64,

    /// Directory for the log file. Stderr-only logging when absent.
    #[serde(default)]
    pub log_path: Option<String>,

    /// One of error, warn, info, verbose, debug, silly.
    #[serde(default)]
    pub log_level: Option<String>,
}

impl LoadedConfig {
    /// Effective maximum number of pooled connections.
    pub fn max_connections(&self) -> u32 {
        self.db_pool_size + self.db_max_overflow
    }

    /// First instance flagged active, in declaration order. Multiple active
    /// instances are not an error; the first one wins.
    pub fn active_instance(&self) -> DbResult<&DbInstance> {
        self.db_list
            .iter()
            .find(|db| db.db_active)
            .ok_or(DbError::NoActiveInstance)
    }
}

const REQUIRED_INSTANCE_KEYS: &[&str] = &[
    "dbInstanceId",
    "dbHost",
    "dbPort",
    "dbDatabase",
    "dbUsername",
    "dbPassword",
    "dbType",
    "dbActive",
];

fn read_config(path: &Path) -> DbResult<LoadedConfig> {
    if !path.exists() {
        return Err(DbError::ConfigNotFound(path.display().to_string()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DbError::ConfigNotFound(path.display().to_string())
        } else {
            // The file exists but cannot be read (permissions, a directory
            // in its place, ...). That is not a missing file.
            DbError::ConfigMalformed(format!(
                "unreadable configuration file {}: {e}",
                path.display()
            ))
        }
    })?;

    let raw: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| DbError::ConfigMalformed(e.to_string()))?;

    // Validate required keys explicitly so the error can name the missing
    // key rather than surfacing a serde path.
    let db_list = raw
        .get("dbList")
        .ok_or_else(|| DbError::ConfigIncomplete("dbList".to_string()))?;
    let instances = db_list
        .as_array()
        .ok_or_else(|| DbError::ConfigMalformed("dbList must be an array".to_string()))?;
    for instance in instances {
        for key in REQUIRED_INSTANCE_KEYS {
            if instance.get(key).is_none() {
                return Err(DbError::ConfigIncomplete((*key).to_string()));
            }
        }
    }

    let config: LoadedConfig =
        serde_json::from_value(raw).map_err(|e| DbError::ConfigMalformed(e.to_string()))?;

    tracing::debug!(
        instances = config.db_list.len(),
        pool_size = config.db_pool_size,
        max_overflow = config.db_max_overflow,
        "configuration loaded from {}",
        path.display()
    );

    Ok(config)
}

/// Resolve the configuration file path. The `config_file` environment
/// variable wins when it names an existing file; otherwise the default is
/// used silently.
pub fn resolve_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
        let candidate = PathBuf::from(&path);
        if candidate.exists() {
            return candidate;
        }
    }
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Memoizing configuration loader.
///
/// Loading is idempotent: the first successful load is cached and every
/// later call returns the same `Arc` without re-reading the file.
#[derive(Debug)]
pub struct ConfigLoader {
    path: PathBuf,
    cache: Mutex<Option<Arc<LoadedConfig>>>,
}

impl ConfigLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    /// Loader pointed at the path resolved from the environment.
    pub fn from_env() -> Self {
        Self::new(resolve_config_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration, returning the cached copy after the first
    /// successful load.
    pub fn load(&self) -> DbResult<Arc<LoadedConfig>> {
        let mut cache = self.cache.lock().expect("config cache lock poisoned");
        if let Some(config) = cache.as_ref() {
            return Ok(Arc::clone(config));
        }
        let config = Arc::new(read_config(&self.path)?);
        *cache = Some(Arc::clone(&config));
        Ok(config)
    }

    /// Load and select the active instance in one step.
    pub fn active_instance(&self) -> DbResult<(Arc<LoadedConfig>, DbInstance)> {
        let config = self.load()?;
        let instance = config.active_instance()?.clone();
        Ok((config, instance))
    }
}
