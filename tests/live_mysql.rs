//! End-to-end tests against a real MySQL server.
//!
//! Ignored by default; run with a reachable test database:
//!
//! ```sh
//! MYSQL_MCP_TEST_HOST=127.0.0.1 MYSQL_MCP_TEST_USER=root \
//! MYSQL_MCP_TEST_PASSWORD=secret MYSQL_MCP_TEST_DATABASE=testdb \
//! cargo test --test live_mysql -- --ignored
//! ```

use std::io::Write;
use std::sync::Arc;

use mysql_mcp::config::ConfigLoader;
use mysql_mcp::datagen;
use mysql_mcp::{DbError, DbPool, ExecutionResult, SqlGateway};

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn live_gateway() -> (SqlGateway, Arc<DbPool>, tempfile::NamedTempFile) {
    let config = serde_json::json!({
        "dbList": [{
            "dbInstanceId": "live-test",
            "dbHost": env_or("MYSQL_MCP_TEST_HOST", "127.0.0.1"),
            "dbPort": env_or("MYSQL_MCP_TEST_PORT", "3306").parse::<u16>().unwrap(),
            "dbDatabase": env_or("MYSQL_MCP_TEST_DATABASE", "testdb"),
            "dbUsername": env_or("MYSQL_MCP_TEST_USER", "root"),
            "dbPassword": env_or("MYSQL_MCP_TEST_PASSWORD", ""),
            "dbType": "mysql",
            "dbActive": true,
        }],
        "dbPoolSize": 2,
        "dbMaxOverflow": 2,
        "dbPoolTimeout": 5,
    });
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{config}").unwrap();

    let loader = Arc::new(ConfigLoader::new(file.path()));
    let pool = Arc::new(DbPool::new(loader));
    (SqlGateway::new(Arc::clone(&pool)), pool, file)
}

#[tokio::test]
#[ignore = "requires a live MySQL server"]
async fn select_one_returns_a_row_mapping() {
    let (gateway, _pool, _file) = live_gateway();

    let result = gateway.execute("SELECT 1 as x", &[]).await.unwrap();
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        serde_json::json!([{"x": 1}])
    );
}

#[tokio::test]
#[ignore = "requires a live MySQL server"]
async fn malformed_statement_fails_without_leaking_a_connection() {
    let (gateway, pool, _file) = live_gateway();

    // Warm the pool so there is a pre-call connection count to compare.
    gateway.execute("SELECT 1", &[]).await.unwrap();
    let before = pool.live_connections().await.unwrap();

    let err = gateway.execute("SELEC 1", &[]).await.unwrap_err();
    assert!(matches!(err, DbError::ExecutionError { .. }));

    let after = pool.live_connections().await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
#[ignore = "requires a live MySQL server"]
async fn statement_kinds_shape_the_result() {
    let (gateway, _pool, _file) = live_gateway();
    let table = "mysql_mcp_kind_check";

    let created = gateway
        .execute(
            &format!("CREATE TABLE {table} (a VARCHAR(16), b VARCHAR(16))"),
            &[],
        )
        .await
        .unwrap();
    assert!(matches!(created, ExecutionResult::Message(_)));

    let inserted = gateway
        .execute(
            &format!("INSERT INTO {table} (a, b) VALUES (?, ?)"),
            &[serde_json::json!("one"), serde_json::json!("two")],
        )
        .await
        .unwrap();
    assert_eq!(inserted, ExecutionResult::Affected(1));

    let rows = gateway
        .execute(&format!("SELECT a, b FROM {table}"), &[])
        .await
        .unwrap();
    match rows {
        ExecutionResult::Rows(rows) => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0]["a"], serde_json::json!("one"));
        }
        other => panic!("expected rows, got {other:?}"),
    }

    let dropped = gateway
        .execute(&format!("DROP TABLE {table}"), &[])
        .await
        .unwrap();
    assert!(matches!(dropped, ExecutionResult::Message(_)));
}

#[tokio::test]
#[ignore = "requires a live MySQL server"]
async fn generate_inserts_the_requested_rows() {
    let (gateway, _pool, _file) = live_gateway();
    let table = "mysql_mcp_datagen_check";

    gateway
        .execute(
            &format!("CREATE TABLE {table} (a VARCHAR(16), b VARCHAR(16))"),
            &[],
        )
        .await
        .unwrap();

    let columns = vec!["a".to_string(), "b".to_string()];
    datagen::generate(&gateway, table, &columns, 3).await.unwrap();

    let rows = gateway
        .execute(&format!("SELECT a, b FROM {table}"), &[])
        .await
        .unwrap();
    match rows {
        ExecutionResult::Rows(rows) => {
            assert_eq!(rows.len(), 3);
            for row in rows {
                for column in &columns {
                    let value = row[column].as_str().unwrap();
                    assert_eq!(value.len(), 8);
                    assert!(value.chars().all(|c| c.is_ascii_alphabetic()));
                }
            }
        }
        other => panic!("expected rows, got {other:?}"),
    }

    gateway
        .execute(&format!("DROP TABLE {table}"), &[])
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires a live MySQL server"]
async fn second_row_failure_leaves_the_first_row_committed() {
    let (gateway, _pool, _file) = live_gateway();
    let table = "mysql_mcp_partial_failure_check";

    // A stored generated column that is always 1, with a unique key on it,
    // lets exactly one row in: the second insert hits a duplicate key.
    gateway
        .execute(&format!("DROP TABLE IF EXISTS {table}"), &[])
        .await
        .unwrap();
    gateway
        .execute(
            &format!(
                "CREATE TABLE {table} (a VARCHAR(16), k INT AS (1) STORED, UNIQUE KEY one_row (k))"
            ),
            &[],
        )
        .await
        .unwrap();

    let err = datagen::generate(&gateway, table, &["a".to_string()], 2)
        .await
        .unwrap_err();
    assert_eq!(err.row, 2);
    assert!(err.to_string().contains("row 2 of 2"));

    // No transaction wraps the loop, so the first row stays committed.
    let rows = gateway
        .execute(&format!("SELECT a FROM {table}"), &[])
        .await
        .unwrap();
    match rows {
        ExecutionResult::Rows(rows) => {
            assert_eq!(rows.len(), 1);
            let value = rows[0]["a"].as_str().unwrap();
            assert_eq!(value.len(), 8);
        }
        other => panic!("expected rows, got {other:?}"),
    }

    gateway
        .execute(&format!("DROP TABLE {table}"), &[])
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires a live MySQL server"]
async fn generate_into_a_missing_table_reports_the_failing_row() {
    let (gateway, _pool, _file) = live_gateway();

    let err = datagen::generate(
        &gateway,
        "mysql_mcp_no_such_table",
        &["a".to_string()],
        2,
    )
    .await
    .unwrap_err();
    assert_eq!(err.row, 1);
    assert!(err.to_string().contains("row 1 of 2"));
}

#[tokio::test]
#[ignore = "requires a live MySQL server"]
async fn pool_revives_after_close() {
    let (gateway, pool, _file) = live_gateway();

    gateway.execute("SELECT 1", &[]).await.unwrap();
    pool.close().await;

    // Acquire after close re-initializes a fresh pool.
    let result = gateway.execute("SELECT 1 as x", &[]).await.unwrap();
    assert!(matches!(result, ExecutionResult::Rows(_)));
}
