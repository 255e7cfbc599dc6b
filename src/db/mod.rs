//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Per-invocation connection management
//! - Query execution
//! - MySQL type mappings

pub mod connection;
pub mod executor;
pub mod types;

pub use connection::{ConnectionManager, Connector, MySqlConnector, Session};
pub use executor::QueryExecutor;
