//! Static text resources.
//!
//! `server://status` reports the clock and host OS; `server://tools` is a
//! plain-text catalogue of every tool the server exposes.

use sysinfo::System;

pub const STATUS_URI: &str = "server://status";
pub const TOOLS_URI: &str = "server://tools";

/// Tool names and one-line summaries, grouped as they appear in the catalogue.
pub const UTILITY_TOOLS: [(&str, &str); 5] = [
    ("get_current_time", "Current server time"),
    ("calculate", "Arithmetic (add, subtract, multiply, divide)"),
    ("echo", "Echo a message back"),
    ("get_server_info", "Host and server information"),
    ("reverse_text", "Reverse a string"),
];

pub const DATABASE_TOOLS: [(&str, &str); 5] = [
    ("db_list_tables", "List tables in the configured database"),
    ("db_describe_table", "Column definitions and row count of a table"),
    ("db_execute_query", "Run a read-only SQL query"),
    ("db_get_row_count", "Row count of a table"),
    ("db_list_databases", "List databases visible to the configured user"),
];

/// A resource this server can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticResource {
    Status,
    Tools,
}

impl StaticResource {
    pub const ALL: [StaticResource; 2] = [StaticResource::Status, StaticResource::Tools];

    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            STATUS_URI => Some(Self::Status),
            TOOLS_URI => Some(Self::Tools),
            _ => None,
        }
    }

    pub fn uri(self) -> &'static str {
        match self {
            Self::Status => STATUS_URI,
            Self::Tools => TOOLS_URI,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Status => "Server status",
            Self::Tools => "Available tools",
        }
    }

    pub fn render(self) -> String {
        match self {
            Self::Status => status_text(),
            Self::Tools => tools_text(),
        }
    }
}

fn status_text() -> String {
    format!(
        "Server status - {}\nState: running\nSystem: {} {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        System::name().unwrap_or_else(|| "unknown".to_string()),
        System::kernel_version().unwrap_or_default(),
    )
}

fn tools_text() -> String {
    let mut text = String::from("Available tools:\n\nUtility tools:\n");
    for (name, summary) in UTILITY_TOOLS {
        text.push_str(&format!("- {}: {}\n", name, summary));
    }
    text.push_str("\nDatabase tools:\n");
    for (name, summary) in DATABASE_TOOLS {
        text.push_str(&format!("- {}: {}\n", name, summary));
    }
    text
}
