//! SQL statement validation for read-only enforcement.
//!
//! This is the read-only gate in front of `db_execute_query`. It is
//! fail-closed and runs in two phases over the trimmed, uppercased statement:
//!
//! 1. **Allow-list**: the statement must start with one of
//!    [`READ_ONLY_PREFIXES`].
//! 2. **Deny-list**: the statement must not contain any of
//!    [`DENIED_KEYWORDS`] anywhere, as a raw substring.
//!
//! The deny-list is deliberately a substring scan, not a tokenizer. Keywords
//! inside identifiers, string literals and comments are rejected too, so
//! `SELECT * FROM updates_log` fails because it contains `UPDATE`. Callers
//! rely on this behaviour; do not narrow it to whole words.
//!
//! [`ValidationMode::Strict`] adds a third phase that parses the statement with
//! [sqlparser](https://docs.rs/sqlparser/) and requires exactly one read-only
//! statement. It only ever rejects more.

use crate::error::{DbError, DbResult};
use sqlparser::ast::Statement;
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;
use tracing::debug;

/// Leading keywords of statements the gate lets through.
pub const READ_ONLY_PREFIXES: [&str; 6] = ["SELECT", "SHOW", "DESCRIBE", "DESC", "EXPLAIN", "WITH"];

/// Keywords that reject a statement wherever they occur.
pub const DENIED_KEYWORDS: [&str; 11] = [
    "DROP", "DELETE", "INSERT", "UPDATE", "CREATE", "ALTER", "TRUNCATE", "GRANT", "REVOKE",
    "COMMIT", "ROLLBACK",
];

/// Outcome of running a statement through the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationVerdict {
    pub accepted: bool,
    /// Human-readable reason, present when rejected
    pub reason: Option<String>,
    /// Deny-listed keyword that matched, if that is why it was rejected
    pub keyword: Option<&'static str>,
}

impl ValidationVerdict {
    fn accept() -> Self {
        Self {
            accepted: true,
            reason: None,
            keyword: None,
        }
    }

    fn reject(reason: impl Into<String>, keyword: Option<&'static str>) -> Self {
        Self {
            accepted: false,
            reason: Some(reason.into()),
            keyword,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    /// Convert into a result, mapping a rejection to [`DbError::Validation`].
    pub fn into_result(self) -> DbResult<()> {
        if self.accepted {
            Ok(())
        } else {
            Err(DbError::validation(
                self.reason
                    .unwrap_or_else(|| "statement rejected".to_string()),
                self.keyword,
            ))
        }
    }
}

/// How thoroughly ad-hoc statements are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Allow-list prefix plus deny-list substring scan
    #[default]
    Substring,
    /// Substring checks, then a parse requiring exactly one read-only statement
    Strict,
}

impl ValidationMode {
    pub fn from_strict_flag(strict: bool) -> Self {
        if strict { Self::Strict } else { Self::Substring }
    }

    pub fn validate(self, sql: &str) -> ValidationVerdict {
        match self {
            Self::Substring => validate(sql),
            Self::Strict => validate_strict(sql),
        }
    }
}

/// Run the two-phase read-only gate.
///
/// # Examples
///
/// ```
/// use simple_mcp_server::tools::sql_validator::validate;
///
/// assert!(validate("SELECT * FROM users").is_accepted());
/// assert!(!validate("DELETE FROM users").is_accepted());
///
/// // Substring match: "updates_log" contains "UPDATE".
/// let verdict = validate("SELECT * FROM updates_log");
/// assert_eq!(verdict.keyword, Some("UPDATE"));
/// ```
pub fn validate(sql: &str) -> ValidationVerdict {
    let normalized = sql.trim().to_uppercase();

    if !READ_ONLY_PREFIXES
        .iter()
        .any(|prefix| normalized.starts_with(prefix))
    {
        let first_token = sql.split_whitespace().next().unwrap_or("empty");
        return ValidationVerdict::reject(
            format!(
                "Only read-only queries are allowed ({}). Not a read-only statement: {}",
                READ_ONLY_PREFIXES.join(", "),
                first_token
            ),
            None,
        );
    }

    if let Some(keyword) = DENIED_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| normalized.contains(keyword))
    {
        return ValidationVerdict::reject(
            format!("Keyword {} is not allowed in a read-only query", keyword),
            Some(keyword),
        );
    }

    ValidationVerdict::accept()
}

/// Run the gate, then require the text to parse as exactly one read-only statement.
pub fn validate_strict(sql: &str) -> ValidationVerdict {
    let verdict = validate(sql);
    if !verdict.is_accepted() {
        return verdict;
    }

    let statements = match Parser::parse_sql(&MySqlDialect {}, sql) {
        Ok(statements) => statements,
        Err(e) => {
            debug!(error = %e, "Strict validation could not parse statement");
            return ValidationVerdict::reject(format!("Failed to parse SQL statement: {}", e), None);
        }
    };

    match statements.as_slice() {
        [] => ValidationVerdict::reject("Empty SQL statement", None),
        [statement] => match read_only_statement_name(statement) {
            Some(_) => ValidationVerdict::accept(),
            None => ValidationVerdict::reject(
                "Statement is not a read-only query. Only SELECT, SHOW, DESCRIBE and EXPLAIN are allowed.",
                None,
            ),
        },
        _ => ValidationVerdict::reject(
            format!(
                "Only a single statement is allowed, found {}",
                statements.len()
            ),
            None,
        ),
    }
}

/// Validate and convert to a result in one step.
pub fn validate_readonly(sql: &str, mode: ValidationMode) -> DbResult<()> {
    mode.validate(sql).into_result()
}

/// Name of a parsed statement if it only reads.
fn read_only_statement_name(stmt: &Statement) -> Option<&'static str> {
    match stmt {
        Statement::Query(_) => Some("SELECT"),
        Statement::ShowTables { .. } => Some("SHOW TABLES"),
        Statement::ShowColumns { .. } => Some("SHOW COLUMNS"),
        Statement::ShowDatabases { .. } => Some("SHOW DATABASES"),
        Statement::ShowSchemas { .. } => Some("SHOW SCHEMAS"),
        Statement::ShowCreate { .. } => Some("SHOW CREATE"),
        Statement::ShowFunctions { .. } => Some("SHOW FUNCTIONS"),
        Statement::ShowVariable { .. } => Some("SHOW VARIABLE"),
        Statement::ShowVariables { .. } => Some("SHOW VARIABLES"),
        Statement::ShowStatus { .. } => Some("SHOW STATUS"),
        Statement::ShowCollation { .. } => Some("SHOW COLLATION"),
        Statement::ExplainTable { .. } => Some("DESCRIBE"),
        // EXPLAIN is only as read-only as the statement it explains
        Statement::Explain { statement, .. } => {
            read_only_statement_name(statement).map(|_| "EXPLAIN")
        }
        _ => None,
    }
}
