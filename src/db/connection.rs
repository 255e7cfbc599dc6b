//! Per-invocation database connections.
//!
//! Every database tool call opens exactly one connection, runs its statements on
//! it and closes it again, on success and on failure alike. Nothing is pooled or
//! shared between invocations, so concurrent tool calls never see each other's
//! session state.
//!
//! The [`Connector`] / [`Session`] pair is the seam between the tool handlers and
//! the driver. [`MySqlConnector`] is the production implementation; tests plug in
//! their own.

use crate::config::DatabaseConfig;
use crate::db::types::RowToJson;
use crate::error::{DbError, DbResult};
use crate::models::Row;
use futures_util::future::BoxFuture;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{Connection, Executor};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// An open database session.
pub trait Session: Send {
    /// Run one raw SQL statement and return its rows as ordered JSON maps.
    fn fetch_rows(&mut self, sql: &str) -> impl Future<Output = DbResult<Vec<Row>>> + Send;

    /// Close the session, consuming it.
    fn close(self) -> impl Future<Output = DbResult<()>> + Send;
}

/// Opens new sessions from the frozen database configuration.
pub trait Connector: Send + Sync + 'static {
    type Session: Session;

    fn open(
        &self,
        config: &DatabaseConfig,
    ) -> impl Future<Output = DbResult<Self::Session>> + Send;
}

// =============================================================================
// MySQL
// =============================================================================

/// Connects to MySQL over TCP with the configured credentials and charset.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

impl MySqlConnector {
    fn connect_options(config: &DatabaseConfig) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database)
            .charset(&config.charset)
    }
}

impl Connector for MySqlConnector {
    type Session = MySqlConnection;

    async fn open(&self, config: &DatabaseConfig) -> DbResult<MySqlConnection> {
        debug!(target_db = %config.target(), "Opening database connection");

        MySqlConnection::connect_with(&Self::connect_options(config))
            .await
            .map_err(|e| match DbError::from(e) {
                // Server-side rejections during the handshake (bad credentials,
                // unknown database) are connection failures from the caller's view.
                DbError::Database { message, .. } => DbError::connection(
                    message,
                    "Check DB_USER, DB_PASSWORD and DB_NAME",
                ),
                other => other,
            })
    }
}

impl Session for MySqlConnection {
    async fn fetch_rows(&mut self, sql: &str) -> DbResult<Vec<Row>> {
        // A bare &str goes over the text protocol, so no prepared statement is created
        let rows = self.fetch_all(sql).await?;
        Ok(rows.iter().map(RowToJson::to_json_map).collect())
    }

    async fn close(self) -> DbResult<()> {
        Connection::close(self).await.map_err(DbError::from)
    }
}

// =============================================================================
// Connection Manager
// =============================================================================

/// Hands out one fresh session per tool invocation.
#[derive(Debug)]
pub struct ConnectionManager<C: Connector> {
    config: Arc<DatabaseConfig>,
    connector: C,
}

impl ConnectionManager<MySqlConnector> {
    /// Manager for the production MySQL driver.
    pub fn mysql(config: Arc<DatabaseConfig>) -> Self {
        Self::new(config, MySqlConnector)
    }
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(config: Arc<DatabaseConfig>, connector: C) -> Self {
        Self { config, connector }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Name of the configured default database.
    pub fn database(&self) -> &str {
        &self.config.database
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Open a session, run `f` on it, then close it.
    ///
    /// The session is closed exactly once whether `f` succeeds or fails. A failed
    /// close is logged and does not replace the result of `f`. If opening fails,
    /// `f` never runs.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let result = manager
    ///     .with_connection(move |conn| {
    ///         Box::pin(async move { QueryExecutor.execute(conn, &sql).await })
    ///     })
    ///     .await?;
    /// ```
    pub async fn with_connection<T, F>(&self, f: F) -> DbResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut C::Session) -> BoxFuture<'c, DbResult<T>> + Send,
    {
        let mut session = self.connector.open(&self.config).await?;

        let result = f(&mut session).await;

        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close database connection");
        }

        result
    }
}
