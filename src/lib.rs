//! Simple MCP Server Library
//!
//! This library provides MCP (Model Context Protocol) tools for AI assistants:
//! a handful of utility tools plus read-only access to a single MySQL database
//! through a validated SQL gate.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::{Config, DatabaseConfig};
pub use error::DbError;
pub use mcp::McpService;
