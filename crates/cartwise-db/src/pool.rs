//! # Discount Store Connection
//!
//! Opens the SQLite file that backs [`SqliteDiscountRepository`] and brings
//! its schema up to date.
//!
//! ```text
//! DbConfig::new(path) ──► Database::new(config) ──► db.discounts()
//!                          │                          │
//!                          ├─ WAL journal             └─ repository sharing
//!                          ├─ foreign keys on            the pool handle
//!                          └─ pending migrations
//! ```
//!
//! Usage increments are single conditional UPDATEs, so several pooled
//! connections may race for the last use of a discount; SQLite's write
//! lock serializes them and each one re-checks the cap.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::discount::SqliteDiscountRepository;

/// Where the discount store lives and how many connections may use it.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,
    /// Default: 5
    pub max_connections: u32,
}

impl DbConfig {
    /// A file-backed store; the file is created on first connect.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// A throwaway store for tests.
    ///
    /// Every SQLite connection to `:memory:` sees its own empty database,
    /// so the pool is pinned to one connection.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
        }
    }
}

/// An open, migrated discount store.
///
/// Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connects and applies any pending migrations.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let db = Database::new(DbConfig::new("./cartwise.db")).await?;
    /// let repo = db.discounts();
    /// ```
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening discount store");

        // `sqlite://:memory:` is recognised here too
        let url = format!("sqlite://{}?mode=rwc", config.database_path.display());
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // conditions and products cascade from their discount
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        migrations::run_migrations(&pool).await?;

        info!(max_connections = config.max_connections, "Discount store ready");
        Ok(Database { pool })
    }

    /// Raw pool access for diagnostics and tests.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn discounts(&self) -> SqliteDiscountRepository {
        SqliteDiscountRepository::new(self.pool.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_create_discount_tables() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'discount%' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();

        assert_eq!(
            tables,
            vec!["discount_conditions", "discount_products", "discounts"]
        );

        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
    }

    #[test]
    fn test_config() {
        let config = DbConfig::new("/tmp/cartwise-test.db").max_connections(8);
        assert_eq!(config.database_path, PathBuf::from("/tmp/cartwise-test.db"));
        assert_eq!(config.max_connections, 8);
        assert_eq!(DbConfig::in_memory().max_connections, 1);
    }
}
