//! Pooled SQL execution gateway.
//!
//! One call means one pooled connection: acquire, execute with positional
//! parameter binding, classify the result by statement kind, and let the
//! connection guard drop back into the pool on every exit path.
//!
//! Classification is purely lexical on the trimmed lower-cased statement
//! prefix; there is no SQL parsing anywhere in this path, and no retries.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use sqlx::mysql::{MySqlArguments, MySqlRow};
use sqlx::pool::PoolConnection;
use sqlx::query::Query;
use sqlx::{Column, MySql, Row, TypeInfo};

use crate::error::{DbError, DbResult};
use crate::pool::DbPool;

/// Marker returned for statements that produce neither rows nor an
/// affected-row count (DDL and everything else).
pub const SUCCESS_MARKER: &str = "Query executed successfully";

/// Statement kind, decided by prefix match on the trimmed lower-cased SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// select / show / describe / desc
    RowReturning,
    /// insert / update / delete
    Mutation,
    /// DDL and anything else
    Other,
}

impl StatementKind {
    pub fn classify(sql: &str) -> Self {
        let lower = sql.trim().to_lowercase();
        const ROW_PREFIXES: [&str; 4] = ["select", "show", "describe", "desc"];
        const MUTATION_PREFIXES: [&str; 3] = ["insert", "update", "delete"];

        if ROW_PREFIXES.iter().any(|p| lower.starts_with(p)) {
            StatementKind::RowReturning
        } else if MUTATION_PREFIXES.iter().any(|p| lower.starts_with(p)) {
            StatementKind::Mutation
        } else {
            StatementKind::Other
        }
    }
}

/// Outcome of one statement, shaped by its [`StatementKind`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExecutionResult {
    /// Ordered rows of column name → value, for row-returning statements.
    Rows(Vec<serde_json::Map<String, Value>>),
    /// Driver-reported affected-row count, for mutations.
    Affected(u64),
    /// Fixed success marker, for everything else.
    Message(String),
}

impl ExecutionResult {
    /// Short description used in logs.
    fn summary(&self) -> String {
        match self {
            ExecutionResult::Rows(rows) => format!("{} rows", rows.len()),
            ExecutionResult::Affected(n) => format!("{n} affected rows"),
            ExecutionResult::Message(_) => "ok".to_string(),
        }
    }
}

fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &'q Value,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) if n.is_i64() => query.bind(n.as_i64()),
        Value::Number(n) if n.is_u64() => query.bind(n.as_u64()),
        Value::Number(n) => query.bind(n.as_f64()),
        Value::String(s) => query.bind(s.as_str()),
        // Arrays and objects have no scalar binding; send their JSON text.
        other => query.bind(other.to_string()),
    }
}

fn opt<T: Into<Value>>(value: Option<T>) -> Value {
    value.map_or(Value::Null, Into::into)
}

/// Decode one column of a MySQL row into a JSON value, keyed off the
/// driver-reported column type name.
fn decode_column(row: &MySqlRow, idx: usize) -> Value {
    let type_name = row.column(idx).type_info().name();
    match type_name {
        "NULL" => Value::Null,
        "BOOLEAN" => row.try_get::<Option<bool>, _>(idx).map(opt).unwrap_or(Value::Null),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => row
            .try_get::<Option<i64>, _>(idx)
            .map(opt)
            .unwrap_or(Value::Null),
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => row
            .try_get::<Option<u64>, _>(idx)
            .map(opt)
            .unwrap_or(Value::Null),
        "FLOAT" => row
            .try_get::<Option<f32>, _>(idx)
            .map(|v| opt(v.map(f64::from)))
            .unwrap_or(Value::Null),
        "DOUBLE" => row.try_get::<Option<f64>, _>(idx).map(opt).unwrap_or(Value::Null),
        "DECIMAL" => row
            .try_get::<Option<sqlx::types::BigDecimal>, _>(idx)
            .map(|v| opt(v.map(|d| d.to_string())))
            .unwrap_or(Value::Null),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(idx)
            .map(|v| opt(v.map(|d| d.format("%Y-%m-%d").to_string())))
            .unwrap_or(Value::Null),
        "TIME" => row
            .try_get::<Option<chrono::NaiveTime>, _>(idx)
            .map(|v| opt(v.map(|t| t.format("%H:%M:%S").to_string())))
            .unwrap_or(Value::Null),
        "DATETIME" | "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(idx)
            .map(|v| opt(v.map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())))
            .unwrap_or(Value::Null),
        "JSON" => row.try_get::<Option<Value>, _>(idx).map(opt).unwrap_or(Value::Null),
        "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" => row
            .try_get::<Option<Vec<u8>>, _>(idx)
            .map(|v| opt(v.map(|b| format!("<blob {} bytes>", b.len()))))
            .unwrap_or(Value::Null),
        // CHAR / VARCHAR / TEXT / ENUM and anything unanticipated: try the
        // textual decode first, then widen through the numeric decodes.
        _ => {
            if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
                opt(v)
            } else if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
                opt(v)
            } else if let Ok(v) = row.try_get::<Option<u64>, _>(idx) {
                opt(v)
            } else if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
                opt(v)
            } else {
                tracing::warn!(column_type = type_name, "undecodable column, returning null");
                Value::Null
            }
        }
    }
}

fn row_to_map(row: &MySqlRow) -> serde_json::Map<String, Value> {
    let mut map = serde_json::Map::with_capacity(row.columns().len());
    for (idx, column) in row.columns().iter().enumerate() {
        map.insert(column.name().to_string(), decode_column(row, idx));
    }
    map
}

/// SQL execution gateway over a shared [`DbPool`].
#[derive(Clone)]
pub struct SqlGateway {
    pool: Arc<DbPool>,
}

impl SqlGateway {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Arc<DbPool> {
        &self.pool
    }

    /// Execute one statement with positional `?` parameters.
    ///
    /// Parameters go through driver prepared-statement binding; they are
    /// never interpolated into the SQL text.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> DbResult<ExecutionResult> {
        let kind = StatementKind::classify(sql);
        let mut conn = self.pool.acquire().await?;

        tracing::debug!(sql, params = params.len(), "executing statement");
        let result = Self::run(&mut conn, sql, params, kind).await;
        // `conn` drops here, returning to the pool whether or not the
        // statement succeeded.
        drop(conn);

        match &result {
            Ok(outcome) => {
                tracing::debug!(outcome = %outcome.summary(), "statement executed");
            }
            Err(err) => {
                tracing::error!(sql, error = %err, "statement execution failed");
            }
        }
        result
    }

    async fn run<'q>(
        conn: &mut PoolConnection<MySql>,
        sql: &'q str,
        params: &'q [Value],
        kind: StatementKind,
    ) -> DbResult<ExecutionResult> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_value(query, param);
        }

        let wrap = |source: sqlx::Error| DbError::ExecutionError {
            sql: sql.to_string(),
            source,
        };

        match kind {
            StatementKind::RowReturning => {
                let rows = query.fetch_all(&mut **conn).await.map_err(wrap)?;
                Ok(ExecutionResult::Rows(rows.iter().map(row_to_map).collect()))
            }
            StatementKind::Mutation => {
                let done = query.execute(&mut **conn).await.map_err(wrap)?;
                Ok(ExecutionResult::Affected(done.rows_affected()))
            }
            StatementKind::Other => {
                query.execute(&mut **conn).await.map_err(wrap)?;
                Ok(ExecutionResult::Message(SUCCESS_MARKER.to_string()))
            }
        }
    }
}
