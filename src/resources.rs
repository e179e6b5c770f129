//! Read-only resources: a per-table schema summary and a
//! credential-redacted view of the active configuration.

use serde::Serialize;
use serde_json::Value;

use crate::config::ConfigLoader;
use crate::error::DbResult;
use crate::executor::{ExecutionResult, SqlGateway};

pub const TABLES_URI: &str = "database://tables";
pub const CONFIG_URI: &str = "database://config";

/// Fixed placeholder substituted for the password, whatever its real value.
pub const PASSWORD_PLACEHOLDER: &str = "***hidden***";

/// One table with its DESCRIBE output and row count.
#[derive(Debug, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub columns: Vec<serde_json::Map<String, Value>>,
    pub record_count: i64,
}

/// Active instance and pool sizing with the password redacted.
#[derive(Debug, Serialize)]
pub struct RedactedConfig {
    #[serde(rename = "dbInstanceId")]
    pub db_instance_id: String,
    #[serde(rename = "dbHost")]
    pub db_host: String,
    #[serde(rename = "dbPort")]
    pub db_port: u16,
    #[serde(rename = "dbDatabase")]
    pub db_database: String,
    #[serde(rename = "dbUsername")]
    pub db_username: String,
    #[serde(rename = "dbPassword")]
    pub db_password: String,
    #[serde(rename = "dbType")]
    pub db_type: String,
    #[serde(rename = "dbVersion")]
    pub db_version: Option<String>,
    pub pool_size: u32,
    pub max_overflow: u32,
    pub pool_timeout: u64,
}

fn rows_or_empty(result: ExecutionResult) -> Vec<serde_json::Map<String, Value>> {
    match result {
        ExecutionResult::Rows(rows) => rows,
        _ => Vec::new(),
    }
}

/// Summarize every table: name, DESCRIBE column metadata, row count.
pub async fn database_tables(gateway: &SqlGateway) -> DbResult<Vec<TableSummary>> {
    let tables = rows_or_empty(gateway.execute("SHOW TABLES", &[]).await?);

    let mut summaries = Vec::with_capacity(tables.len());
    for row in tables {
        // SHOW TABLES yields one column (Tables_in_<database>) per row.
        let Some(name) = row
            .values()
            .next()
            .and_then(Value::as_str)
            .map(str::to_string)
        else {
            continue;
        };

        let columns = rows_or_empty(gateway.execute(&format!("DESCRIBE {name}"), &[]).await?);

        let count_rows = rows_or_empty(
            gateway
                .execute(&format!("SELECT COUNT(*) as count FROM {name}"), &[])
                .await?,
        );
        let record_count = count_rows
            .first()
            .and_then(|r| r.get("count"))
            .and_then(Value::as_i64)
            .unwrap_or(0);

        summaries.push(TableSummary {
            name,
            columns,
            record_count,
        });
    }

    tracing::info!(tables = summaries.len(), "collected table summaries");
    Ok(summaries)
}

/// Redacted view of the active instance and pool settings.
pub fn database_config(loader: &ConfigLoader) -> DbResult<RedactedConfig> {
    let (config, active) = loader.active_instance()?;
    Ok(RedactedConfig {
        db_instance_id: active.db_instance_id,
        db_host: active.db_host,
        db_port: active.db_port,
        db_database: active.db_database,
        db_username: active.db_username,
        db_password: PASSWORD_PLACEHOLDER.to_string(),
        db_type: active.db_type,
        db_version: active.db_version,
        pool_size: config.db_pool_size,
        max_overflow: config.db_max_overflow,
        pool_timeout: config.db_pool_timeout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn loader_with_password(password: &str) -> (ConfigLoader, tempfile::NamedTempFile) {
        let config = serde_json::json!({
            "dbList": [{
                "dbInstanceId": "db1",
                "dbHost": "127.0.0.1",
                "dbPort": 3306,
                "dbDatabase": "testdb",
                "dbUsername": "root",
                "dbPassword": password,
                "dbType": "mysql",
                "dbActive": true,
            }],
        });
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{config}").unwrap();
        let loader = ConfigLoader::new(file.path());
        (loader, file)
    }

    #[test]
    fn password_is_always_the_placeholder() {
        let (loader, _file) = loader_with_password("super-secret");
        let redacted = database_config(&loader).unwrap();
        assert_eq!(redacted.db_password, PASSWORD_PLACEHOLDER);
        let json = serde_json::to_string(&redacted).unwrap();
        assert!(!json.contains("super-secret"));
    }

    #[test]
    fn empty_password_is_still_redacted() {
        let (loader, _file) = loader_with_password("");
        let redacted = database_config(&loader).unwrap();
        assert_eq!(redacted.db_password, PASSWORD_PLACEHOLDER);
    }

    #[test]
    fn redacted_config_uses_original_key_names() {
        let (loader, _file) = loader_with_password("pw");
        let json = serde_json::to_value(database_config(&loader).unwrap()).unwrap();
        assert!(json.get("dbInstanceId").is_some());
        assert!(json.get("dbHost").is_some());
        assert!(json.get("pool_size").is_some());
        assert!(json.get("max_overflow").is_some());
        assert!(json.get("pool_timeout").is_some());
    }
}
