//! Data models for the simple MCP server.
//!
//! This module re-exports all model types used throughout the application.

pub mod query;
pub mod tool_result;

// Re-export commonly used types
pub use query::{DEFAULT_ROW_LIMIT, QueryResult, Row};
pub use tool_result::{ToolError, ToolOutcome};
