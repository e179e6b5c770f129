//! MySQL MCP server binary.
//!
//! Loads the database configuration, wires up logging, and serves the MCP
//! protocol over stdio. A missing or unusable configuration is fatal: with
//! no active instance the server cannot answer any tool call.

use std::sync::Arc;

use anyhow::Context;
use rmcp::ServiceExt;

use mysql_mcp::config::ConfigLoader;
use mysql_mcp::logging;
use mysql_mcp::MysqlMcpServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let loader = Arc::new(ConfigLoader::from_env());
    let config = loader.load().with_context(|| {
        format!("loading configuration from {}", loader.path().display())
    })?;
    config
        .active_instance()
        .context("selecting the active database instance")?;

    logging::init_tracing(Some(config.as_ref()))?;

    tracing::info!("Starting mysql-mcp MCP Server");

    let server = MysqlMcpServer::new(loader);
    let service = server.serve(rmcp::transport::stdio()).await?;

    tracing::info!("Server running, waiting for requests...");

    service.waiting().await?;

    tracing::info!("Server shutting down");
    Ok(())
}
