//! Ad-hoc query tool.
//!
//! This module implements the `db_execute_query` MCP tool. The caller's SQL goes
//! through the read-only gate first; only accepted statements reach the
//! connection manager. Statements without a LIMIT clause get one appended.

use crate::db::{ConnectionManager, Connector, QueryExecutor};
use crate::models::{DEFAULT_ROW_LIMIT, Row, ToolError, ToolOutcome};
use crate::tools::sql_validator::{self, ValidationMode};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Input for the db_execute_query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExecuteQueryInput {
    /// Read-only SQL statement. Must start with SELECT, SHOW, DESCRIBE, DESC, EXPLAIN or WITH.
    pub sql: String,
    /// Row limit appended when the statement has no LIMIT clause. Default: 100
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Output from the db_execute_query tool.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteQueryOutput {
    /// The SQL that was executed, including any appended LIMIT
    pub sql: String,
    pub row_count: usize,
    pub results: Vec<Row>,
}

/// Append `LIMIT <limit>` unless the statement already mentions LIMIT.
///
/// The check is a case-insensitive substring match, so a column called
/// `rate_limit` also counts as a LIMIT clause. Trailing whitespace and
/// statement terminators are stripped before appending. When the last line may
/// end in a `--` or `#` comment the clause goes on a line of its own.
///
/// # Examples
///
/// ```
/// use simple_mcp_server::tools::query::apply_row_limit;
///
/// assert_eq!(apply_row_limit("SELECT 1", 100), "SELECT 1 LIMIT 100");
/// assert_eq!(apply_row_limit("SELECT * FROM t;", 10), "SELECT * FROM t LIMIT 10");
/// assert_eq!(apply_row_limit("SELECT 1 LIMIT 5", 100), "SELECT 1 LIMIT 5");
/// ```
pub fn apply_row_limit(sql: &str, limit: u32) -> String {
    if sql.to_uppercase().contains("LIMIT") {
        return sql.to_string();
    }
    let body = sql.trim_end_matches(|c: char| c.is_whitespace() || c == ';');
    // A trailing line comment would swallow the clause, so start a new line
    let last_line = body.rsplit('\n').next().unwrap_or(body);
    let separator = if last_line.contains("--") || last_line.contains('#') {
        "\n"
    } else {
        " "
    };
    format!("{}{}LIMIT {}", body, separator, limit)
}

/// Handler for the ad-hoc query tool.
#[derive(Debug)]
pub struct QueryToolHandler<C: Connector> {
    connection_manager: Arc<ConnectionManager<C>>,
    executor: QueryExecutor,
    default_limit: u32,
    mode: ValidationMode,
}

impl<C: Connector> QueryToolHandler<C> {
    /// Create a new query tool handler.
    pub fn new(connection_manager: Arc<ConnectionManager<C>>) -> Self {
        Self::with_settings(connection_manager, DEFAULT_ROW_LIMIT, ValidationMode::default())
    }

    /// Create a handler with a custom default limit and validation mode.
    pub fn with_settings(
        connection_manager: Arc<ConnectionManager<C>>,
        default_limit: u32,
        mode: ValidationMode,
    ) -> Self {
        Self {
            connection_manager,
            executor: QueryExecutor,
            default_limit,
            mode,
        }
    }

    pub fn default_limit(&self) -> u32 {
        self.default_limit
    }

    /// Handle the db_execute_query tool call.
    ///
    /// Rejected statements are reported with the caller's SQL and never open a
    /// connection. Driver failures are reported with the SQL that was executed.
    pub async fn execute_query(&self, input: ExecuteQueryInput) -> ToolOutcome<ExecuteQueryOutput> {
        if let Err(e) = sql_validator::validate_readonly(&input.sql, self.mode) {
            warn!(sql = %input.sql, reason = %e, "Rejected query");
            return Err(ToolError::from(e).with("sql", input.sql));
        }

        let limit = input.limit.unwrap_or(self.default_limit);
        let sql = apply_row_limit(&input.sql, limit);

        let executor = self.executor;
        let statement = sql.clone();
        let result = self
            .connection_manager
            .with_connection(move |conn| {
                Box::pin(async move { executor.execute(conn, &statement).await })
            })
            .await;

        match result {
            Ok(result) => {
                info!(row_count = result.row_count, "Executed query");
                Ok(ExecuteQueryOutput {
                    sql,
                    row_count: result.row_count,
                    results: result.rows,
                })
            }
            Err(e) => {
                warn!(sql = %sql, error = %e, "Query failed");
                Err(ToolError::from(e).with("sql", sql))
            }
        }
    }
}
