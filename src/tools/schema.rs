//! Schema introspection tools.
//!
//! This module implements the `db_list_tables`, `db_describe_table`,
//! `db_get_row_count` and `db_list_databases` MCP tools. Their SQL is fixed by
//! the handler, so it skips the read-only gate; table names are quoted with
//! [`quote_identifier`] before interpolation.

use crate::db::{ConnectionManager, Connector, QueryExecutor};
use crate::error::{DbError, DbResult};
use crate::models::{QueryResult, Row, ToolError, ToolOutcome};
use crate::tools::identifier::quote_identifier;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use tracing::{info, warn};

/// Input for the db_describe_table and db_get_row_count tools.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TableNameInput {
    /// Name of the table in the configured database
    pub table_name: String,
}

/// Output from the db_list_tables tool.
#[derive(Debug, Clone, Serialize)]
pub struct ListTablesOutput {
    /// Configured database the tables belong to
    pub database: String,
    pub table_count: usize,
    pub tables: Vec<String>,
}

/// Output from the db_describe_table tool.
#[derive(Debug, Clone, Serialize)]
pub struct DescribeTableOutput {
    pub table: String,
    pub row_count: u64,
    /// DESCRIBE rows: Field, Type, Null, Key, Default, Extra
    pub columns: Vec<Row>,
}

/// Output from the db_get_row_count tool.
#[derive(Debug, Clone, Serialize)]
pub struct RowCountOutput {
    pub table: String,
    pub row_count: u64,
}

/// Output from the db_list_databases tool.
#[derive(Debug, Clone, Serialize)]
pub struct ListDatabasesOutput {
    pub databases: Vec<String>,
    /// Configured default database
    pub current: String,
}

fn count_sql(quoted: &str) -> String {
    format!("SELECT COUNT(*) AS total FROM {}", quoted)
}

/// Render a cell as a plain string, without JSON quoting.
fn value_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Read the `total` column of a COUNT(*) result. No rows counts as zero.
fn extract_total(result: &QueryResult) -> DbResult<u64> {
    let Some(value) = result.column_values("total").next() else {
        return Ok(0);
    };
    let total = match value {
        JsonValue::Number(n) => n.as_u64(),
        // DECIMAL-typed counts arrive as strings
        JsonValue::String(s) => s.parse().ok(),
        _ => None,
    };
    total.ok_or_else(|| DbError::internal(format!("Unexpected COUNT(*) value: {}", value)))
}

/// Handler for the schema introspection tools.
#[derive(Debug)]
pub struct SchemaToolHandler<C: Connector> {
    connection_manager: Arc<ConnectionManager<C>>,
    executor: QueryExecutor,
}

impl<C: Connector> SchemaToolHandler<C> {
    pub fn new(connection_manager: Arc<ConnectionManager<C>>) -> Self {
        Self {
            connection_manager,
            executor: QueryExecutor,
        }
    }

    async fn run(&self, sql: &'static str) -> DbResult<QueryResult> {
        let executor = self.executor;
        self.connection_manager
            .with_connection(move |conn| Box::pin(async move { executor.execute(conn, sql).await }))
            .await
    }

    pub async fn list_tables(&self) -> ToolOutcome<ListTablesOutput> {
        let result = self.run("SHOW TABLES").await.map_err(|e| {
            warn!(error = %e, "Failed to list tables");
            ToolError::from(e).with("tables", json!([]))
        })?;

        let tables: Vec<String> = result.first_column_values().map(value_to_string).collect();

        info!(count = tables.len(), "Listed tables");

        Ok(ListTablesOutput {
            database: self.connection_manager.database().to_string(),
            table_count: tables.len(),
            tables,
        })
    }

    /// Describe a table's columns and count its rows, on a single connection.
    pub async fn describe_table(&self, input: TableNameInput) -> ToolOutcome<DescribeTableOutput> {
        let table = input.table_name;
        let fail = |e: DbError| {
            warn!(table = %table, error = %e, "Failed to describe table");
            ToolError::from(e).with("table", table.as_str())
        };

        let quoted = quote_identifier(&table).map_err(fail)?;
        let describe = format!("DESCRIBE {}", quoted);
        let count = count_sql(&quoted);

        let executor = self.executor;
        let (columns, total) = self
            .connection_manager
            .with_connection(move |conn| {
                Box::pin(async move {
                    let columns = executor.execute(conn, &describe).await?;
                    let counted = executor.execute(conn, &count).await?;
                    Ok((columns, extract_total(&counted)?))
                })
            })
            .await
            .map_err(fail)?;

        info!(table = %table, columns = columns.row_count, row_count = total, "Described table");

        Ok(DescribeTableOutput {
            table,
            row_count: total,
            columns: columns.rows,
        })
    }

    pub async fn get_row_count(&self, input: TableNameInput) -> ToolOutcome<RowCountOutput> {
        let table = input.table_name;
        let fail = |e: DbError| {
            warn!(table = %table, error = %e, "Failed to count rows");
            ToolError::from(e).with("table", table.as_str())
        };

        let sql = count_sql(&quote_identifier(&table).map_err(fail)?);
        let executor = self.executor;
        let total = self
            .connection_manager
            .with_connection(move |conn| {
                Box::pin(async move {
                    let counted = executor.execute(conn, &sql).await?;
                    extract_total(&counted)
                })
            })
            .await
            .map_err(fail)?;

        info!(table = %table, row_count = total, "Counted rows");

        Ok(RowCountOutput {
            table,
            row_count: total,
        })
    }

    pub async fn list_databases(&self) -> ToolOutcome<ListDatabasesOutput> {
        let result = self.run("SHOW DATABASES").await.map_err(|e| {
            warn!(error = %e, "Failed to list databases");
            ToolError::from(e).with("databases", json!([]))
        })?;

        let databases: Vec<String> = result.column_values("Database").map(value_to_string).collect();

        info!(count = databases.len(), "Listed databases");

        Ok(ListDatabasesOutput {
            databases,
            current: self.connection_manager.database().to_string(),
        })
    }
}
