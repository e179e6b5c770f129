//! MySQL MCP Server
//!
//! Exposes a MySQL-compatible database to MCP clients through a pooled SQL
//! execution gateway: `sql_exec`, `describe_table`, and
//! `generate_demo_data` tools, plus read-only table-summary and
//! redacted-configuration resources.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mysql_mcp::{config::ConfigLoader, MysqlMcpServer};
//!
//! let loader = Arc::new(ConfigLoader::from_env());
//! let server = MysqlMcpServer::new(loader);
//! // Serve via stdio or call the gateway directly
//! ```

pub mod config;
pub mod datagen;
pub mod error;
pub mod executor;
pub mod logging;
pub mod pool;
pub mod resources;
pub mod response;
pub mod server;

// Re-export the main server type and gateway surface
pub use error::{DbError, DbResult};
pub use executor::{ExecutionResult, SqlGateway, StatementKind};
pub use pool::DbPool;
pub use server::MysqlMcpServer;
