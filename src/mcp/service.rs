//! MCP service implementation using rmcp.
//!
//! This module defines the McpService struct with all tools and resources
//! exposed via the MCP protocol using the rmcp framework's macros.
//!
//! Database tools report failures as data: a [`crate::models::ToolError`] becomes a tool
//! result flagged as an error whose text is the JSON error object. Utility
//! tools answer bad arguments with an invalid-params protocol error.

use crate::config::Config;
use crate::db::{ConnectionManager, MySqlConnector};
use crate::mcp::resources::StaticResource;
use crate::models::ToolOutcome;
use crate::tools::query::{ExecuteQueryInput, QueryToolHandler};
use crate::tools::schema::{SchemaToolHandler, TableNameInput};
use crate::tools::sql_validator::ValidationMode;
use crate::tools::utility::{
    self, CalculateInput, CurrentTimeInput, EchoInput, ReverseTextInput,
};
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{
        AnnotateAble, CallToolResult, Content, Implementation, ListResourcesResult,
        PaginatedRequestParam, ProtocolVersion, RawResource, ReadResourceRequestParam,
        ReadResourceResult, ResourceContents, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    tool, tool_handler, tool_router,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

/// Settings the service takes from the process configuration.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub server_name: String,
    pub default_limit: u32,
    pub validation_mode: ValidationMode,
}

impl ServiceSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            server_name: config.server_name.clone(),
            default_limit: config.default_limit,
            validation_mode: ValidationMode::from_strict_flag(config.strict_sql),
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

fn to_json_text<T: Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Failed to serialize result: {}", e), None))
}

fn text_result(text: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text.into())])
}

/// Turn a database tool outcome into a tool result. Failures stay data.
fn outcome_result<T: Serialize>(outcome: ToolOutcome<T>) -> Result<CallToolResult, McpError> {
    match outcome {
        Ok(output) => Ok(text_result(to_json_text(&output)?)),
        Err(error) => Ok(CallToolResult::error(vec![Content::text(to_json_text(
            &error,
        )?)])),
    }
}

fn number_text(value: f64) -> String {
    serde_json::Number::from_f64(value)
        .map(|n| n.to_string())
        .unwrap_or_else(|| value.to_string())
}

#[derive(Clone)]
pub struct McpService {
    server_name: String,
    query_handler: Arc<QueryToolHandler<MySqlConnector>>,
    schema_handler: Arc<SchemaToolHandler<MySqlConnector>>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl McpService {
    /// Create a new McpService instance.
    ///
    /// # Arguments
    ///
    /// * `connection_manager` - Opens one database connection per tool call
    /// * `settings` - Server name, default row limit and validation mode
    pub fn new(
        connection_manager: Arc<ConnectionManager<MySqlConnector>>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            server_name: settings.server_name,
            query_handler: Arc::new(QueryToolHandler::with_settings(
                connection_manager.clone(),
                settings.default_limit,
                settings.validation_mode,
            )),
            schema_handler: Arc::new(SchemaToolHandler::new(connection_manager)),
            tool_router: Self::tool_router(),
        }
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }
}

#[tool_router]
impl McpService {
    #[tool(
        description = "Get the current server time.\nformat uses strftime syntax, default \"%Y-%m-%d %H:%M:%S\"."
    )]
    async fn get_current_time(
        &self,
        Parameters(input): Parameters<CurrentTimeInput>,
    ) -> Result<CallToolResult, McpError> {
        let now = utility::current_time(&input.format)?;
        Ok(text_result(now))
    }

    #[tool(description = "Simple arithmetic on two numbers.\noperation: add, subtract, multiply or divide.")]
    async fn calculate(
        &self,
        Parameters(input): Parameters<CalculateInput>,
    ) -> Result<CallToolResult, McpError> {
        let value = utility::calculate(&input.operation, input.a, input.b)?;
        Ok(text_result(number_text(value)))
    }

    #[tool(description = "Echo a message back, optionally repeated (space separated).")]
    async fn echo(&self, Parameters(input): Parameters<EchoInput>) -> Result<CallToolResult, McpError> {
        let echoed = utility::echo(&input.message, input.repeat)?;
        Ok(text_result(echoed))
    }

    #[tool(
        description = "Get basic server information: hostname, OS name, kernel release, OS version, architecture, server version and time."
    )]
    async fn get_server_info(&self) -> Result<CallToolResult, McpError> {
        Ok(text_result(to_json_text(&utility::server_info())?))
    }

    #[tool(description = "Reverse the characters of a text.")]
    async fn reverse_text(
        &self,
        Parameters(input): Parameters<ReverseTextInput>,
    ) -> Result<CallToolResult, McpError> {
        Ok(text_result(utility::reverse_text(&input.text)))
    }

    #[tool(description = "List all tables in the configured database.")]
    async fn db_list_tables(&self) -> Result<CallToolResult, McpError> {
        outcome_result(self.schema_handler.list_tables().await)
    }

    #[tool(
        description = "Get the column definitions (DESCRIBE) and the row count of a table in the configured database."
    )]
    async fn db_describe_table(
        &self,
        Parameters(input): Parameters<TableNameInput>,
    ) -> Result<CallToolResult, McpError> {
        outcome_result(self.schema_handler.describe_table(input).await)
    }

    #[tool(
        description = "Execute a read-only SQL query.\nOnly SELECT, SHOW, DESCRIBE, DESC, EXPLAIN and WITH statements are accepted.\nStatements containing DROP, DELETE, INSERT, UPDATE, CREATE, ALTER, TRUNCATE, GRANT, REVOKE, COMMIT or ROLLBACK anywhere (including inside identifiers) are rejected.\nA LIMIT clause (default 100) is appended when the statement has none."
    )]
    async fn db_execute_query(
        &self,
        Parameters(input): Parameters<ExecuteQueryInput>,
    ) -> Result<CallToolResult, McpError> {
        outcome_result(self.query_handler.execute_query(input).await)
    }

    #[tool(description = "Count the rows of a table in the configured database.")]
    async fn db_get_row_count(
        &self,
        Parameters(input): Parameters<TableNameInput>,
    ) -> Result<CallToolResult, McpError> {
        outcome_result(self.schema_handler.get_row_count(input).await)
    }

    #[tool(description = "List all databases visible to the configured user.")]
    async fn db_list_databases(&self) -> Result<CallToolResult, McpError> {
        outcome_result(self.schema_handler.list_databases().await)
    }
}

#[tool_handler]
impl ServerHandler for McpService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: self.server_name.clone(),
                title: Some("Simple MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Utility tools plus read-only access to one MySQL database.\n\
                \n\
                ## Database workflow\n\
                1. `db_list_tables` to see what exists\n\
                2. `db_describe_table` for columns and row count\n\
                3. `db_execute_query` for ad-hoc read-only SQL\n\
                \n\
                ## Query rules\n\
                - Statements must start with SELECT, SHOW, DESCRIBE, DESC, EXPLAIN or WITH\n\
                - Write and transaction keywords are rejected anywhere in the text, even inside\n\
                  identifiers (a table named `updates_log` cannot be queried this way)\n\
                - Without a LIMIT clause, `LIMIT 100` (or the `limit` argument) is appended\n\
                \n\
                ## Errors\n\
                Database tools return failures as a JSON object with an `error` field."
                    .to_string(),
            ),
        }
    }

    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        async move {
            let resources = StaticResource::ALL
                .iter()
                .map(|resource| RawResource::new(resource.uri(), resource.name()).no_annotation())
                .collect();
            Ok(ListResourcesResult::with_all_items(resources))
        }
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            let resource = StaticResource::from_uri(&request.uri).ok_or_else(|| {
                McpError::resource_not_found(
                    format!("Unknown resource URI: {}", request.uri),
                    Some(serde_json::json!({ "uri": request.uri })),
                )
            })?;

            Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(resource.render(), request.uri.clone())],
            })
        }
    }
}
