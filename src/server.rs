//! MCP server adapter: tool and resource handlers over the gateway.

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        AnnotateAble, CallToolResult, ListResourcesResult, PaginatedRequestParam, RawResource,
        ReadResourceRequestParam, ReadResourceResult, ResourceContents, ServerCapabilities,
        ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_handler, tool_router,
    ErrorData as McpError,
};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::config::ConfigLoader;
use crate::datagen;
use crate::executor::SqlGateway;
use crate::pool::DbPool;
use crate::resources::{self, CONFIG_URI, TABLES_URI};
use crate::response::{envelope_failure, envelope_success};

// ============================================================================
// Parameter Types
// ============================================================================

/// Parameters for the sql_exec tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExecParams {
    /// SQL statement to execute, supports parameterized queries
    pub sql: String,
}

/// Parameters for the describe_table tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DescribeParams {
    /// Table name to describe, supports database.table format
    pub table_name: String,
}

/// Parameters for the generate_demo_data tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateParams {
    /// Table name to generate test data for
    pub table_name: String,
    /// List of column names to fill with data
    pub columns_name: Vec<String>,
    /// Number of test records to generate
    pub num: u32,
}

// ============================================================================
// Server Implementation
// ============================================================================

/// MySQL MCP server.
///
/// Owns the configuration loader and the pooled execution gateway; each
/// tool call runs through the gateway and is formatted into the uniform
/// success/error envelope.
#[derive(Clone)]
pub struct MysqlMcpServer {
    loader: Arc<ConfigLoader>,
    gateway: SqlGateway,
    tool_router: ToolRouter<Self>,
}

impl MysqlMcpServer {
    pub fn new(loader: Arc<ConfigLoader>) -> Self {
        let pool = Arc::new(DbPool::new(Arc::clone(&loader)));
        Self {
            loader,
            gateway: SqlGateway::new(pool),
            tool_router: Self::tool_router(),
        }
    }

    pub fn gateway(&self) -> &SqlGateway {
        &self.gateway
    }
}

#[tool_router]
impl MysqlMcpServer {
    /// Execute any SQL statement
    #[tool(
        description = "Universal SQL execution tool. Runs one SQL statement against the active database instance. SELECT/SHOW/DESCRIBE statements return rows, INSERT/UPDATE/DELETE return the affected-row count, other statements return a success marker."
    )]
    async fn sql_exec(
        &self,
        Parameters(params): Parameters<ExecParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(sql = %params.sql, "executing SQL via sql_exec");
        match self.gateway.execute(&params.sql, &[]).await {
            Ok(result) => {
                envelope_success(result, Some("SQL executed successfully".to_string()))
            }
            Err(err) => {
                tracing::error!(error = %err, "sql_exec failed");
                envelope_failure(
                    err.caller_message(),
                    Some("SQL execution failed".to_string()),
                )
            }
        }
    }

    /// Describe a table's structure
    #[tool(
        description = "Table structure description tool. Returns the DESCRIBE output (field, type, null, key, default, extra) for the given table."
    )]
    async fn describe_table(
        &self,
        Parameters(params): Parameters<DescribeParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(table = %params.table_name, "describing table");
        let sql = format!("DESCRIBE {};", params.table_name);
        match self.gateway.execute(&sql, &[]).await {
            Ok(result) => {
                envelope_success(result, Some("Table described successfully".to_string()))
            }
            Err(err) => {
                tracing::error!(error = %err, "describe_table failed");
                envelope_failure(
                    err.caller_message(),
                    Some("Table description failed".to_string()),
                )
            }
        }
    }

    /// Generate demo rows for a table
    #[tool(
        description = "Test data generation tool. Inserts the requested number of rows into the table, filling each listed column with an 8-character random string. Rows inserted before a failure are not rolled back."
    )]
    async fn generate_demo_data(
        &self,
        Parameters(params): Parameters<GenerateParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            table = %params.table_name,
            num = params.num,
            "generating demo data"
        );
        match datagen::generate(
            &self.gateway,
            &params.table_name,
            &params.columns_name,
            params.num,
        )
        .await
        {
            Ok(message) => envelope_success(message, None),
            Err(err) => {
                tracing::error!(error = %err, "generate_demo_data failed");
                envelope_failure(err.to_string(), None)
            }
        }
    }
}

#[tool_handler]
impl rmcp::ServerHandler for MysqlMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "MySQL datasource MCP server. Use sql_exec to run SQL statements, \
                 describe_table to inspect a table's structure, and generate_demo_data \
                 to fill a table with test rows. The database://tables and \
                 database://config resources expose a schema summary and the \
                 redacted connection configuration."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let mut tables = RawResource::new(TABLES_URI, "Database Tables");
        tables.description = Some("Database table information resource".to_string());
        tables.mime_type = Some("application/json".to_string());

        let mut config = RawResource::new(CONFIG_URI, "Database Configuration");
        config.description = Some("Database configuration information resource".to_string());
        config.mime_type = Some("application/json".to_string());

        Ok(ListResourcesResult {
            resources: vec![tables.no_annotation(), config.no_annotation()],
            next_cursor: None,
            meta: None,
        })
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParam { uri }: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        match uri.as_str() {
            TABLES_URI => {
                // A failing summary surfaces as a protocol-level error, not
                // as an error-text payload inside the resource contents.
                let summaries = resources::database_tables(&self.gateway)
                    .await
                    .map_err(McpError::from)?;
                let text = serde_json::to_string(&summaries)
                    .map_err(|e| McpError::internal_error(e.to_string(), None))?;
                Ok(ReadResourceResult {
                    contents: vec![ResourceContents::text(text, uri)],
                })
            }
            CONFIG_URI => {
                let redacted =
                    resources::database_config(&self.loader).map_err(McpError::from)?;
                let text = serde_json::to_string(&redacted)
                    .map_err(|e| McpError::internal_error(e.to_string(), None))?;
                Ok(ReadResourceResult {
                    contents: vec![ResourceContents::text(text, uri)],
                })
            }
            other => Err(McpError::resource_not_found(
                format!("unknown resource: {other}"),
                None,
            )),
        }
    }
}
