//! Table identifier quoting for handler-built SQL.
//!
//! Identifiers cannot be bound as parameters, so `db_describe_table` and
//! `db_get_row_count` interpolate the table name into the statement text. The
//! name is always backtick-quoted with embedded backticks doubled, so it stays a
//! single identifier no matter what the caller sends.

use crate::error::{DbError, DbResult};

/// MySQL's limit on identifier length, in characters.
pub const MAX_IDENTIFIER_CHARS: usize = 64;

/// Quote a table name as a MySQL identifier.
///
/// # Examples
///
/// ```
/// use simple_mcp_server::tools::identifier::quote_identifier;
///
/// assert_eq!(quote_identifier("orders").unwrap(), "`orders`");
/// assert_eq!(quote_identifier("odd`name").unwrap(), "`odd``name`");
/// assert!(quote_identifier("  ").is_err());
/// ```
pub fn quote_identifier(name: &str) -> DbResult<String> {
    if name.trim().is_empty() {
        return Err(DbError::invalid_input("table_name must not be empty"));
    }
    if name.contains('\0') {
        return Err(DbError::invalid_input(
            "table_name must not contain NUL characters",
        ));
    }
    let len = name.chars().count();
    if len > MAX_IDENTIFIER_CHARS {
        return Err(DbError::invalid_input(format!(
            "table_name is {} characters long, the maximum is {}",
            len, MAX_IDENTIFIER_CHARS
        )));
    }

    Ok(format!("`{}`", name.replace('`', "``")))
}
