//! Query-related data models.
//!
//! This module defines types for SQL query results.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Default row limit appended to ad-hoc queries without a LIMIT clause.
pub const DEFAULT_ROW_LIMIT: u32 = 100;

/// One result row: column name to decoded value, in driver column order.
pub type Row = serde_json::Map<String, JsonValue>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub rows: Vec<Row>,
    pub row_count: usize,
}

impl QueryResult {
    /// Wrap fetched rows, counting them.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let row_count = rows.len();
        Self { rows, row_count }
    }

    /// Check if the result is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column across all rows, skipping rows that lack it.
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a JsonValue> {
        self.rows.iter().filter_map(move |row| row.get(column))
    }

    /// Values of the first column of each row.
    pub fn first_column_values(&self) -> impl Iterator<Item = &JsonValue> {
        self.rows.iter().filter_map(|row| row.values().next())
    }
}
