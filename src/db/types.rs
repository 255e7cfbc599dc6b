//! MySQL value decoding.
//!
//! This module turns driver rows into ordered JSON maps.
//!
//! # Architecture
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies column types into logical categories
//! 2. Per-category decoders handle the actual value extraction
//!
//! Anything a decoder cannot handle falls back to the column's raw text, so a
//! value is only reported as NULL when it actually is NULL or has no text form.

use crate::models::Row;
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::{Column, Decode, Row as _, Type, TypeInfo};

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for MySQL column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Temporal,
    Binary,
    Json,
    Text,
}

/// Classify a MySQL type name into a logical category.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let lower = type_name.to_lowercase();

    // Decimal/Numeric - check first as it overlaps with "numeric" in float checks
    if lower.contains("decimal") || lower.contains("numeric") {
        return TypeCategory::Decimal;
    }

    // TINYINT(1) is reported as BOOLEAN
    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    if lower.contains("int") {
        return TypeCategory::Integer;
    }

    if lower.contains("float") || lower.contains("double") || lower == "real" {
        return TypeCategory::Float;
    }

    if lower == "json" {
        return TypeCategory::Json;
    }

    if matches!(
        lower.as_str(),
        "date" | "time" | "datetime" | "timestamp" | "year"
    ) {
        return TypeCategory::Temporal;
    }

    if lower.contains("blob") || lower.contains("binary") || lower == "bit" {
        return TypeCategory::Binary;
    }

    // varchar, char, text, enum, set, geometry, ...
    TypeCategory::Text
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// Wrapper type for raw DECIMAL values as strings.
/// This preserves the exact database representation.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("decimal") || name.contains("numeric")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

// =============================================================================
// Binary Encoding
// =============================================================================

/// Decode binary data to a display-safe JSON string.
///
/// Valid UTF-8 is returned as text; anything else is base64 encoded.
pub fn decode_binary_value(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    match std::str::from_utf8(bytes) {
        Ok(s) => JsonValue::String(s.to_string()),
        Err(_) => JsonValue::String(STANDARD.encode(bytes)),
    }
}

// =============================================================================
// Row to JSON Trait
// =============================================================================

/// Trait for converting database rows to ordered JSON maps.
pub trait RowToJson {
    fn to_json_map(&self) -> Row;
}

impl RowToJson for MySqlRow {
    fn to_json_map(&self) -> Row {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let type_name = col.type_info().name();
                let value = decode_column(self, idx, categorize_type(type_name));
                (col.name().to_string(), value)
            })
            .collect()
    }
}

// =============================================================================
// Per-Category Decoders
// =============================================================================

fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> JsonValue {
    let decoded = match category {
        TypeCategory::Decimal => decode_decimal(row, idx),
        TypeCategory::Integer => decode_integer(row, idx),
        TypeCategory::Boolean => decode_boolean(row, idx),
        TypeCategory::Float => decode_float(row, idx),
        TypeCategory::Temporal => decode_temporal(row, idx),
        TypeCategory::Binary => decode_binary_col(row, idx),
        TypeCategory::Json => decode_json(row, idx),
        TypeCategory::Text => None,
    };
    decoded.unwrap_or_else(|| decode_text(row, idx))
}

fn is_null(row: &MySqlRow, idx: usize) -> bool {
    row.try_get_raw(idx)
        .map(|raw| sqlx::ValueRef::is_null(&raw))
        .unwrap_or(false)
}

fn decode_decimal(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    match row.try_get::<Option<RawDecimal>, _>(idx) {
        Ok(Some(v)) => Some(JsonValue::String(v.0)),
        Ok(None) => Some(JsonValue::Null),
        Err(e) => {
            tracing::error!("Failed to decode DECIMAL: {:?}", e);
            None
        }
    }
}

fn decode_integer(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    if is_null(row, idx) {
        return Some(JsonValue::Null);
    }
    if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    if let Ok(Some(v)) = row.try_get::<Option<i32>, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    if let Ok(Some(v)) = row.try_get::<Option<u64>, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    if let Ok(Some(v)) = row.try_get::<Option<u32>, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    if let Ok(Some(v)) = row.try_get::<Option<i16>, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    if let Ok(Some(v)) = row.try_get::<Option<u16>, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    if let Ok(Some(v)) = row.try_get::<Option<i8>, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    if let Ok(Some(v)) = row.try_get::<Option<u8>, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    None
}

fn decode_boolean(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    match row.try_get::<Option<bool>, _>(idx) {
        Ok(Some(v)) => Some(JsonValue::Bool(v)),
        Ok(None) => Some(JsonValue::Null),
        Err(_) => None,
    }
}

fn decode_float(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return Some(float_to_json(v));
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(idx) {
        return Some(float_to_json(v.map(f64::from)));
    }
    None
}

fn float_to_json(v: Option<f64>) -> JsonValue {
    match v {
        Some(v) => serde_json::Number::from_f64(v)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(v.to_string())),
        None => JsonValue::Null,
    }
}

fn decode_temporal(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

    if is_null(row, idx) {
        return Some(JsonValue::Null);
    }
    if let Ok(Some(v)) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
        return Some(JsonValue::String(v.to_string()));
    }
    if let Ok(Some(v)) = row.try_get::<Option<DateTime<Utc>>, _>(idx) {
        return Some(JsonValue::String(v.naive_utc().to_string()));
    }
    if let Ok(Some(v)) = row.try_get::<Option<NaiveDate>, _>(idx) {
        return Some(JsonValue::String(v.to_string()));
    }
    if let Ok(Some(v)) = row.try_get::<Option<NaiveTime>, _>(idx) {
        return Some(JsonValue::String(v.to_string()));
    }
    // Zero dates, negative TIME values and YEAR fall through to raw text
    None
}

fn decode_binary_col(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    match row.try_get::<Option<Vec<u8>>, _>(idx) {
        Ok(Some(v)) => Some(decode_binary_value(&v)),
        Ok(None) => Some(JsonValue::Null),
        Err(_) => None,
    }
}

fn decode_json(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    match row.try_get::<Option<serde_json::Value>, _>(idx) {
        Ok(v) => Some(v.unwrap_or(JsonValue::Null)),
        Err(_) => None,
    }
}

fn decode_text(row: &MySqlRow, idx: usize) -> JsonValue {
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.map(JsonValue::String).unwrap_or(JsonValue::Null);
    }
    // Text-protocol values always carry their textual form
    match row.try_get_unchecked::<Option<Vec<u8>>, _>(idx) {
        Ok(Some(bytes)) => decode_binary_value(&bytes),
        Ok(None) => JsonValue::Null,
        Err(e) => {
            tracing::warn!(column = idx, error = %e, "Failed to decode column, returning NULL");
            JsonValue::Null
        }
    }
}
