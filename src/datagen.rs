//! Demo data generation.
//!
//! Builds one INSERT per requested row with a fresh 8-character random
//! alphabetic filler string per column, and runs each row through the
//! gateway individually. No batching and no wrapping transaction: the first
//! failing row aborts the loop and earlier rows stay committed. That
//! partial-failure behavior is intentional and documented.

use rand::Rng;

use crate::error::DbError;
use crate::executor::SqlGateway;

/// Length of the random filler value for every column.
pub const FILLER_LEN: usize = 8;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// A row insert failed; earlier rows are not rolled back.
#[derive(Debug, thiserror::Error)]
#[error("failed to insert row {row} of {total}: {source}")]
pub struct GenerateError {
    /// 1-based index of the failing row.
    pub row: u32,
    pub total: u32,
    #[source]
    pub source: DbError,
}

pub(crate) fn random_alphabetic(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// INSERT statement with one positional placeholder per column.
pub(crate) fn build_insert_sql(table: &str, columns: &[String]) -> String {
    let placeholders = vec!["?"; columns.len()].join(",");
    format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders})",
        columns.join(",")
    )
}

/// Insert `count` rows of filler data into `table`.
pub async fn generate(
    gateway: &SqlGateway,
    table: &str,
    columns: &[String],
    count: u32,
) -> Result<String, GenerateError> {
    tracing::info!(table, count, "generating demo data");
    let sql = build_insert_sql(table, columns);

    for row in 1..=count {
        let values: Vec<serde_json::Value> = columns
            .iter()
            .map(|_| serde_json::Value::String(random_alphabetic(FILLER_LEN)))
            .collect();

        tracing::debug!(table, row, count, "inserting demo row");
        gateway
            .execute(&sql, &values)
            .await
            .map_err(|source| GenerateError {
                row,
                total: count,
                source,
            })?;
    }

    let message = format!("Successfully generated {count} test records for table '{table}'");
    tracing::info!(table, count, "demo data generated");
    Ok(message)
}
