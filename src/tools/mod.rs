//! MCP tool implementations.
//!
//! This module contains all tool handlers:
//! - `query`: `db_execute_query`, ad-hoc read-only SQL
//! - `schema`: `db_list_tables`, `db_describe_table`, `db_get_row_count`, `db_list_databases`
//! - `utility`: clock, calculator, echo, server info and text reversal
//! - `sql_validator`: the read-only gate for ad-hoc SQL
//! - `identifier`: table name quoting for handler-built SQL

pub mod identifier;
pub mod query;
pub mod schema;
pub mod sql_validator;
pub mod utility;

pub use query::{ExecuteQueryInput, ExecuteQueryOutput, QueryToolHandler};
pub use schema::{
    DescribeTableOutput, ListDatabasesOutput, ListTablesOutput, RowCountOutput, SchemaToolHandler,
    TableNameInput,
};
