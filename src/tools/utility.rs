//! General-purpose utility tools.
//!
//! Small, database-free tools: clock, calculator, echo, host information and
//! text reversal. Bad arguments are reported as [`DbError::InvalidInput`], which
//! the service turns into an invalid-params protocol error.

use crate::error::{DbError, DbResult};
use chrono::format::{Item, StrftimeItems};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sysinfo::System;

pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Operations supported by [`calculate`].
pub const SUPPORTED_OPERATIONS: [&str; 4] = ["add", "subtract", "multiply", "divide"];

/// Upper bound on echo repetitions.
pub const MAX_ECHO_REPEAT: i64 = 10_000;

fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.to_string()
}

fn default_repeat() -> i64 {
    1
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CurrentTimeInput {
    /// strftime-style format string. Default: "%Y-%m-%d %H:%M:%S"
    #[serde(default = "default_time_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CalculateInput {
    /// One of: add, subtract, multiply, divide
    pub operation: String,
    /// First operand
    pub a: f64,
    /// Second operand
    pub b: f64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct EchoInput {
    /// Message to echo back
    pub message: String,
    /// How many times to repeat the message, joined by spaces. Default: 1
    #[serde(default = "default_repeat")]
    pub repeat: i64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReverseTextInput {
    /// Text to reverse
    pub text: String,
}

/// Host and server details returned by get_server_info.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub hostname: Option<String>,
    pub system: Option<String>,
    /// Kernel release
    pub release: Option<String>,
    /// OS version
    pub version: Option<String>,
    pub machine: String,
    pub server_version: String,
    /// ISO-8601 local time
    pub server_time: String,
}

/// Format the current local time.
///
/// # Examples
///
/// ```
/// use simple_mcp_server::tools::utility::current_time;
///
/// let year = current_time("%Y").unwrap();
/// assert_eq!(year.len(), 4);
/// assert!(current_time("%Q").is_err());
/// ```
pub fn current_time(format: &str) -> DbResult<String> {
    // Formatting with an invalid specifier panics, so reject it up front
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(DbError::invalid_input(format!(
            "Invalid time format string: {}",
            format
        )));
    }
    Ok(chrono::Local::now().format(format).to_string())
}

pub fn calculate(operation: &str, a: f64, b: f64) -> DbResult<f64> {
    match operation {
        "add" => Ok(a + b),
        "subtract" => Ok(a - b),
        "multiply" => Ok(a * b),
        "divide" if b == 0.0 => Err(DbError::invalid_input("Division by zero")),
        "divide" => Ok(a / b),
        other => Err(DbError::invalid_input(format!(
            "Unsupported operation: {}. Supported operations: {}",
            other,
            SUPPORTED_OPERATIONS.join(", ")
        ))),
    }
}

pub fn echo(message: &str, repeat: i64) -> DbResult<String> {
    if repeat < 1 {
        return Err(DbError::invalid_input("repeat must be at least 1"));
    }
    if repeat > MAX_ECHO_REPEAT {
        return Err(DbError::invalid_input(format!(
            "repeat must be at most {}",
            MAX_ECHO_REPEAT
        )));
    }
    Ok(vec![message; repeat as usize].join(" "))
}

pub fn server_info() -> ServerInfo {
    ServerInfo {
        hostname: System::host_name(),
        system: System::name(),
        release: System::kernel_version(),
        version: System::os_version(),
        machine: std::env::consts::ARCH.to_string(),
        server_version: env!("CARGO_PKG_VERSION").to_string(),
        server_time: chrono::Local::now().to_rfc3339(),
    }
}

pub fn reverse_text(text: &str) -> String {
    text.chars().rev().collect()
}
