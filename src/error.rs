//! Error taxonomy for the configuration loader, connection pool, and
//! execution gateway.
//!
//! Loader and pool errors are fatal at startup; per-call execution errors
//! are recovered at the tool boundary and turned into a structured
//! `{success: false, ...}` response instead of crashing the server.

use rmcp::ErrorData as McpError;

/// Errors raised by the configuration loader, pool manager, and gateway.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The resolved configuration file does not exist.
    #[error("configuration file not found: {0}")]
    ConfigNotFound(String),

    /// The configuration file exists but is not valid JSON.
    #[error("configuration file is not valid JSON: {0}")]
    ConfigMalformed(String),

    /// A required top-level or per-instance key is absent.
    #[error("missing required configuration key: {0}")]
    ConfigIncomplete(String),

    /// No instance in `dbList` has `dbActive: true`.
    #[error("no active database instance found")]
    NoActiveInstance,

    /// The driver could not establish the pool (bad host, auth failure, ...).
    #[error("connection pool initialization failed: {0}")]
    PoolInitFailed(#[source] sqlx::Error),

    /// No connection freed up within the configured acquire timeout.
    #[error("connection pool exhausted: no connection available within the acquire timeout")]
    PoolExhausted,

    /// A statement failed at the driver level. The SQL text is carried for
    /// logging only and must not be surfaced to the protocol caller.
    #[error("{source}")]
    ExecutionError {
        sql: String,
        #[source]
        source: sqlx::Error,
    },
}

impl DbError {
    /// Message safe to return to the protocol caller. Never includes the
    /// SQL text or connection details.
    pub fn caller_message(&self) -> String {
        match self {
            DbError::ExecutionError { source, .. } => source.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<DbError> for McpError {
    fn from(err: DbError) -> Self {
        McpError::internal_error(err.caller_message(), None)
    }
}

/// Result alias used throughout the database layer.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_error_message_omits_sql_text() {
        let err = DbError::ExecutionError {
            sql: "SELECT secret FROM vault".to_string(),
            source: sqlx::Error::PoolClosed,
        };
        let msg = err.caller_message();
        assert!(!msg.contains("vault"));
    }

    #[test]
    fn config_incomplete_names_the_key() {
        let err = DbError::ConfigIncomplete("dbHost".to_string());
        assert!(err.to_string().contains("dbHost"));
    }
}
