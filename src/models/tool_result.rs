//! Tool result envelope.
//!
//! Database tools never fail at the protocol level. Every failure becomes a
//! [`ToolError`] value that is handed back to the caller as ordinary data.

use crate::error::DbError;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value as JsonValue;

/// Result of a database tool handler.
pub type ToolOutcome<T> = Result<T, ToolError>;

/// A failure reported back to the caller as data.
///
/// Serializes flat as `{"error": message, "kind": kind, ...context}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolError {
    pub message: String,
    pub kind: &'static str,
    /// Auxiliary fields, e.g. the offending SQL or the table name
    pub context: serde_json::Map<String, JsonValue>,
}

impl ToolError {
    pub fn new(message: impl Into<String>, kind: &'static str) -> Self {
        Self {
            message: message.into(),
            kind,
            context: serde_json::Map::new(),
        }
    }

    /// Attach an auxiliary field.
    pub fn with(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.context.get(key)
    }
}

impl From<DbError> for ToolError {
    fn from(err: DbError) -> Self {
        let kind = err.kind();
        let suggestion = err.suggestion().map(str::to_string);
        let tool_error = ToolError::new(err.to_string(), kind);
        match suggestion {
            Some(s) => tool_error.with("suggestion", s),
            None => tool_error,
        }
    }
}

/// Keys written from `message` and `kind`; context entries with these names are dropped.
const RESERVED_KEYS: [&str; 2] = ["error", "kind"];

impl ToolError {
    fn extra_context(&self) -> impl Iterator<Item = (&String, &JsonValue)> {
        self.context
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
    }

    /// Number of entries in the flat serialized object.
    fn serialized_len(&self) -> usize {
        RESERVED_KEYS.len() + self.extra_context().count()
    }
}

impl Serialize for ToolError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.serialized_len()))?;
        map.serialize_entry("error", &self.message)?;
        map.serialize_entry("kind", self.kind)?;
        for (key, value) in self.extra_context() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_flat() {
        let err = ToolError::new("boom", "database").with("sql", "SELECT 1 LIMIT 100");
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(
            value,
            json!({"error": "boom", "kind": "database", "sql": "SELECT 1 LIMIT 100"})
        );
    }

    #[test]
    fn test_context_cannot_shadow_error_fields() {
        let err = ToolError::new("real", "validation").with("error", "fake");
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["error"], "real");
    }

    #[test]
    fn test_length_hint_matches_written_entries() {
        let err = ToolError::new("x", "k")
            .with("error", "shadow")
            .with("kind", "shadow")
            .with("sql", "SELECT 1");
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 3);
        assert_eq!(err.serialized_len(), 3);

        let bare = ToolError::new("x", "k").with("error", "shadow");
        assert_eq!(bare.serialized_len(), 2);
    }

    #[test]
    fn test_from_db_error_carries_kind_and_suggestion() {
        let err: ToolError = DbError::connection("refused", "Check DB_HOST").into();
        assert_eq!(err.kind, "connection");
        assert!(err.message.starts_with("database error: "));
        assert_eq!(err.get("suggestion"), Some(&json!("Check DB_HOST")));

        let err: ToolError = DbError::validation("nope", None).into();
        assert_eq!(err.message, "nope");
        assert!(err.get("suggestion").is_none());
    }
}
