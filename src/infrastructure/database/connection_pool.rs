use crate::shared::config::DatabaseConfig;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite pool backing the task store. File databases are created on first
/// open and run in WAL mode so the CLI can read while the app writes.
#[derive(Clone)]
pub struct ConnectionPool {
    pool: Arc<SqlitePool>,
}

impl ConnectionPool {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let mut options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(BUSY_TIMEOUT);
        if !is_memory_url(database_url) {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        tracing::debug!(target: "sync::state", database_url, max_connections, "sqlite pool opened");
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub async fn from_config(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let max_connections = if is_memory_url(&config.url) {
            1
        } else {
            config.max_connections
        };
        Self::new(&config.url, max_connections).await
    }

    /// Private in-memory database; a single connection so every query sees
    /// the same data.
    pub async fn from_memory() -> Result<Self, sqlx::Error> {
        Self::new("sqlite::memory:", 1).await
    }

    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(self.pool.as_ref()).await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}
