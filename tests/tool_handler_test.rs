//! Integration tests for the database tool handlers.
//!
//! A scripted in-memory connector stands in for MySQL so the tests can observe
//! every connection the handlers open and close.

use futures_util::future::join_all;
use serde_json::{Value as JsonValue, json};
use simple_mcp_server::config::DatabaseConfig;
use simple_mcp_server::db::{ConnectionManager, Connector, Session};
use simple_mcp_server::error::{DbError, DbResult};
use simple_mcp_server::models::Row;
use simple_mcp_server::tools::query::{ExecuteQueryInput, QueryToolHandler};
use simple_mcp_server::tools::schema::{SchemaToolHandler, TableNameInput};
use simple_mcp_server::tools::sql_validator::ValidationMode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =============================================================================
// Scripted connector
// =============================================================================

#[derive(Default)]
struct Stats {
    opened: AtomicUsize,
    closed: AtomicUsize,
    open_now: AtomicUsize,
    peak_open: AtomicUsize,
    /// (session id, sql) for every statement sent
    executed: Mutex<Vec<(usize, String)>>,
}

impl Stats {
    fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    fn executed(&self) -> Vec<(usize, String)> {
        self.executed.lock().unwrap().clone()
    }
}

struct ScriptedConnector {
    stats: Arc<Stats>,
    refuse: bool,
    delay: Duration,
}

struct ScriptedSession {
    id: usize,
    stats: Arc<Stats>,
    delay: Duration,
}

impl Connector for ScriptedConnector {
    type Session = ScriptedSession;

    async fn open(&self, _config: &DatabaseConfig) -> DbResult<ScriptedSession> {
        if self.refuse {
            return Err(DbError::connection(
                "Can't connect to MySQL server on 'localhost'",
                "Check DB_HOST",
            ));
        }
        let id = self.stats.opened.fetch_add(1, Ordering::SeqCst);
        let now = self.stats.open_now.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.peak_open.fetch_max(now, Ordering::SeqCst);
        Ok(ScriptedSession {
            id,
            stats: Arc::clone(&self.stats),
            delay: self.delay,
        })
    }
}

fn row(pairs: &[(&str, JsonValue)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

impl Session for ScriptedSession {
    async fn fetch_rows(&mut self, sql: &str) -> DbResult<Vec<Row>> {
        self.stats
            .executed
            .lock()
            .unwrap()
            .push((self.id, sql.to_string()));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match sql {
            "SHOW TABLES" => Ok(vec![
                row(&[("Tables_in_shop", json!("customers"))]),
                row(&[("Tables_in_shop", json!("orders"))]),
            ]),
            "SHOW DATABASES" => Ok(vec![
                row(&[("Database", json!("information_schema"))]),
                row(&[("Database", json!("shop"))]),
            ]),
            "DESCRIBE `orders`" => Ok(vec![
                row(&[
                    ("Field", json!("id")),
                    ("Type", json!("int")),
                    ("Null", json!("NO")),
                    ("Key", json!("PRI")),
                    ("Default", JsonValue::Null),
                    ("Extra", json!("auto_increment")),
                ]),
                row(&[
                    ("Field", json!("total")),
                    ("Type", json!("decimal(10,2)")),
                    ("Null", json!("YES")),
                    ("Key", json!("")),
                    ("Default", JsonValue::Null),
                    ("Extra", json!("")),
                ]),
            ]),
            "SELECT COUNT(*) AS total FROM `orders`" => Ok(vec![row(&[("total", json!(3))])]),
            s if s.contains("missing") => Err(DbError::database(
                "Table 'shop.missing' doesn't exist",
                Some("42S02".to_string()),
            )),
            _ => Ok(vec![row(&[
                ("session", json!(self.id)),
                ("sql", json!(sql)),
            ])]),
        }
    }

    async fn close(self) -> DbResult<()> {
        self.stats.open_now.fetch_sub(1, Ordering::SeqCst);
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn setup_with(refuse: bool, delay: Duration) -> (Arc<ConnectionManager<ScriptedConnector>>, Arc<Stats>) {
    let stats = Arc::new(Stats::default());
    let config = DatabaseConfig {
        database: "shop".to_string(),
        ..DatabaseConfig::default()
    };
    let connector = ScriptedConnector {
        stats: Arc::clone(&stats),
        refuse,
        delay,
    };
    (
        Arc::new(ConnectionManager::new(Arc::new(config), connector)),
        stats,
    )
}

fn setup() -> (Arc<ConnectionManager<ScriptedConnector>>, Arc<Stats>) {
    setup_with(false, Duration::ZERO)
}

fn query(sql: &str) -> ExecuteQueryInput {
    ExecuteQueryInput {
        sql: sql.to_string(),
        limit: None,
    }
}

fn table(name: &str) -> TableNameInput {
    TableNameInput {
        table_name: name.to_string(),
    }
}

// =============================================================================
// db_execute_query
// =============================================================================

#[tokio::test]
async fn test_execute_query_appends_default_limit() {
    let (manager, stats) = setup();
    let handler = QueryToolHandler::new(manager);

    let output = handler.execute_query(query("SELECT 1")).await.unwrap();

    assert_eq!(output.sql, "SELECT 1 LIMIT 100");
    assert_eq!(output.row_count, 1);
    assert_eq!(output.results[0]["sql"], "SELECT 1 LIMIT 100");
    assert_eq!(stats.executed(), vec![(0, "SELECT 1 LIMIT 100".to_string())]);
}

#[tokio::test]
async fn test_execute_query_keeps_existing_limit() {
    let (manager, stats) = setup();
    let handler = QueryToolHandler::new(manager);

    let output = handler.execute_query(query("SELECT 1 LIMIT 5")).await.unwrap();

    assert_eq!(output.sql, "SELECT 1 LIMIT 5");
    assert_eq!(stats.executed()[0].1, "SELECT 1 LIMIT 5");
}

#[tokio::test]
async fn test_execute_query_uses_caller_and_configured_limits() {
    let (manager, _stats) = setup();

    let handler = QueryToolHandler::new(manager.clone());
    let output = handler
        .execute_query(ExecuteQueryInput {
            sql: "SELECT * FROM orders;".to_string(),
            limit: Some(10),
        })
        .await
        .unwrap();
    assert_eq!(output.sql, "SELECT * FROM orders LIMIT 10");

    let handler = QueryToolHandler::with_settings(manager, 25, ValidationMode::Substring);
    let output = handler.execute_query(query("SELECT 1")).await.unwrap();
    assert_eq!(output.sql, "SELECT 1 LIMIT 25");
}

#[tokio::test]
async fn test_rejected_query_never_opens_connection() {
    let (manager, stats) = setup();
    let handler = QueryToolHandler::new(manager);

    let err = handler.execute_query(query("DELETE FROM t")).await.unwrap_err();

    assert_eq!(err.kind, "validation");
    assert_eq!(err.get("sql"), Some(&json!("DELETE FROM t")));
    let body = serde_json::to_value(&err).unwrap();
    assert!(body.get("results").is_none());
    assert_eq!(stats.opened(), 0);
    assert_eq!(stats.closed(), 0);
}

#[tokio::test]
async fn test_keyword_inside_identifier_is_rejected_before_connecting() {
    let (manager, stats) = setup();
    let handler = QueryToolHandler::new(manager);

    let err = handler
        .execute_query(query("SELECT * FROM updates_log"))
        .await
        .unwrap_err();

    assert!(err.message.contains("UPDATE"));
    assert_eq!(stats.opened(), 0);
}

#[tokio::test]
async fn test_driver_failure_is_data_and_connection_is_closed() {
    let (manager, stats) = setup();
    let handler = QueryToolHandler::new(manager);

    let err = handler
        .execute_query(query("SELECT * FROM missing"))
        .await
        .unwrap_err();

    assert_eq!(err.kind, "database");
    assert!(err.message.starts_with("database error: "));
    // Driver failures report the statement that was sent
    assert_eq!(err.get("sql"), Some(&json!("SELECT * FROM missing LIMIT 100")));
    assert_eq!(stats.opened(), 1);
    assert_eq!(stats.closed(), 1);
}

#[tokio::test]
async fn test_connect_failure_is_data() {
    let (manager, stats) = setup_with(true, Duration::ZERO);
    let handler = QueryToolHandler::new(manager);

    let err = handler.execute_query(query("SELECT 1")).await.unwrap_err();

    assert_eq!(err.kind, "connection");
    assert!(err.message.starts_with("database error: "));
    assert_eq!(err.get("suggestion"), Some(&json!("Check DB_HOST")));
    assert_eq!(stats.closed(), 0);
}

#[tokio::test]
async fn test_strict_mode_rejects_stacked_statements() {
    let (manager, stats) = setup();
    let handler = QueryToolHandler::with_settings(manager, 100, ValidationMode::Strict);

    let err = handler
        .execute_query(query("SELECT 1; SELECT 2"))
        .await
        .unwrap_err();

    assert_eq!(err.kind, "validation");
    assert_eq!(stats.opened(), 0);
}

// =============================================================================
// Schema tools
// =============================================================================

#[tokio::test]
async fn test_list_tables() {
    let (manager, stats) = setup();
    let handler = SchemaToolHandler::new(manager);

    let output = handler.list_tables().await.unwrap();

    assert_eq!(output.database, "shop");
    assert_eq!(output.table_count, 2);
    assert_eq!(output.tables, vec!["customers", "orders"]);
    assert_eq!(stats.closed(), 1);
}

#[tokio::test]
async fn test_list_tables_failure_carries_empty_list() {
    let (manager, _stats) = setup_with(true, Duration::ZERO);
    let handler = SchemaToolHandler::new(manager);

    let err = handler.list_tables().await.unwrap_err();

    assert_eq!(err.get("tables"), Some(&json!([])));
}

#[tokio::test]
async fn test_describe_table_matches_independent_count() {
    let (manager, stats) = setup();
    let handler = SchemaToolHandler::new(manager);

    let described = handler.describe_table(table("orders")).await.unwrap();
    let counted = handler.get_row_count(table("orders")).await.unwrap();

    assert_eq!(described.table, "orders");
    assert_eq!(described.row_count, 3);
    assert_eq!(described.row_count, counted.row_count);
    assert_eq!(described.columns.len(), 2);
    assert_eq!(described.columns[0]["Field"], "id");

    // Describe ran both statements on one connection
    let executed = stats.executed();
    assert_eq!(executed[0], (0, "DESCRIBE `orders`".to_string()));
    assert_eq!(
        executed[1],
        (0, "SELECT COUNT(*) AS total FROM `orders`".to_string())
    );
    assert_eq!(stats.opened(), 2);
    assert_eq!(stats.closed(), 2);
}

#[tokio::test]
async fn test_describe_table_failure_carries_table() {
    let (manager, stats) = setup();
    let handler = SchemaToolHandler::new(manager);

    let err = handler.describe_table(table("missing")).await.unwrap_err();

    assert_eq!(err.get("table"), Some(&json!("missing")));
    assert!(err.message.starts_with("database error: "));
    assert_eq!(stats.closed(), 1);
}

#[tokio::test]
async fn test_table_name_with_backtick_is_escaped() {
    let (manager, stats) = setup();
    let handler = SchemaToolHandler::new(manager);

    let _ = handler.get_row_count(table("x` ; DROP TABLE users; --")).await;

    assert_eq!(
        stats.executed()[0].1,
        "SELECT COUNT(*) AS total FROM `x`` ; DROP TABLE users; --`"
    );
}

#[tokio::test]
async fn test_invalid_table_name_never_opens_connection() {
    let (manager, stats) = setup();
    let handler = SchemaToolHandler::new(manager);

    let err = handler.get_row_count(table("")).await.unwrap_err();
    assert_eq!(err.kind, "invalid_input");
    assert_eq!(err.get("table"), Some(&json!("")));

    let err = handler.describe_table(table(&"t".repeat(65))).await.unwrap_err();
    assert_eq!(err.kind, "invalid_input");

    assert_eq!(stats.opened(), 0);
}

#[tokio::test]
async fn test_list_databases() {
    let (manager, _stats) = setup();
    let handler = SchemaToolHandler::new(manager);

    let output = handler.list_databases().await.unwrap();

    assert_eq!(output.databases, vec!["information_schema", "shop"]);
    assert_eq!(output.current, "shop");
}

#[tokio::test]
async fn test_list_databases_failure_carries_empty_list() {
    let (manager, _stats) = setup_with(true, Duration::ZERO);
    let handler = SchemaToolHandler::new(manager);

    let err = handler.list_databases().await.unwrap_err();
    let body = serde_json::to_value(&err).unwrap();

    assert_eq!(body["databases"], json!([]));
    assert_eq!(body["kind"], "connection");
}

// =============================================================================
// Resource model
// =============================================================================

#[tokio::test]
async fn test_concurrent_invocations_use_distinct_connections() {
    let (manager, stats) = setup_with(false, Duration::from_millis(20));
    let handler = Arc::new(QueryToolHandler::new(manager));

    let calls = (0..8).map(|i| {
        let handler = Arc::clone(&handler);
        async move { handler.execute_query(query(&format!("SELECT {}", i))).await }
    });
    let outputs = join_all(calls).await;

    let mut sessions: Vec<u64> = outputs
        .iter()
        .map(|o| o.as_ref().unwrap().results[0]["session"].as_u64().unwrap())
        .collect();
    sessions.sort_unstable();
    sessions.dedup();

    assert_eq!(sessions.len(), 8);
    assert_eq!(stats.opened(), 8);
    assert_eq!(stats.closed(), 8);
    assert!(stats.peak_open.load(Ordering::SeqCst) > 1);
    assert_eq!(stats.open_now.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_every_exit_path_closes_exactly_once() {
    let (manager, stats) = setup();
    let query_handler = QueryToolHandler::new(manager.clone());
    let schema_handler = SchemaToolHandler::new(manager);

    let _ = query_handler.execute_query(query("SELECT 1")).await;
    let _ = query_handler.execute_query(query("SELECT * FROM missing")).await;
    let _ = query_handler.execute_query(query("DROP TABLE t")).await;
    let _ = schema_handler.describe_table(table("orders")).await;
    let _ = schema_handler.describe_table(table("missing")).await;
    let _ = schema_handler.list_tables().await;

    assert_eq!(stats.opened(), 5);
    assert_eq!(stats.closed(), 5);
}
