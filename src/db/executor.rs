//! Query execution engine.
//!
//! Runs a single raw statement on an open session and wraps the decoded rows.
//! The executor never validates or rewrites SQL; that is the job of the tool
//! handlers in front of it.

use crate::db::connection::Session;
use crate::error::DbResult;
use crate::models::QueryResult;
use std::time::Instant;
use tracing::debug;

/// Query executor that handles database query execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryExecutor;

impl QueryExecutor {
    /// Execute one statement and return all of its rows.
    pub async fn execute<S: Session>(&self, session: &mut S, sql: &str) -> DbResult<QueryResult> {
        let start = Instant::now();
        debug!(sql = %sql, "Executing query");

        let rows = session.fetch_rows(sql).await?;
        let result = QueryResult::from_rows(rows);

        debug!(
            row_count = result.row_count,
            execution_time_ms = start.elapsed().as_millis() as u64,
            "Query finished"
        );
        Ok(result)
    }
}
