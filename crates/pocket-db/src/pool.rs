//! # Database Handle
//!
//! Opens the SQLite pool for a till and hands out repositories.
//!
//! ```text
//!   DbConfig::new("pocket.db") ─┐
//!   DbConfig::in_memory()   ────┴─► Database::new ─► migrations ─► items()
//!                                                                ─► transactions()
//! ```
//!
//! File databases use WAL so report reads do not block a checkout write.
//! Foreign keys are switched on for every connection; recorded sales pin the
//! items they reference.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::item::ItemRepository;
use crate::repository::transaction::TransactionRepository;

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    /// Private to the pool; gone when the pool closes.
    Memory,
}

impl fmt::Display for DbLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbLocation::File(path) => write!(f, "{}", path.display()),
            DbLocation::Memory => f.write_str(":memory:"),
        }
    }
}

/// How to open a [`Database`].
///
/// ```rust
/// use pocket_db::DbConfig;
///
/// let config = DbConfig::new("/data/pocket.db").max_connections(2);
/// assert_eq!(config.max_connections, 2);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub location: DbLocation,
    pub max_connections: u32,
    /// How long a statement waits on another writer's lock, and how long
    /// acquiring a pooled connection may take.
    pub busy_timeout: Duration,
    pub run_migrations: bool,
}

impl DbConfig {
    /// File database at `path`, created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            location: DbLocation::File(path.into()),
            max_connections: 4,
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Fresh empty database. One connection, since each SQLite memory
    /// connection would otherwise see its own database.
    pub fn in_memory() -> Self {
        DbConfig {
            location: DbLocation::Memory,
            max_connections: 1,
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match &self.location {
            DbLocation::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal),
            DbLocation::Memory => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?,
        };

        Ok(options
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(self.busy_timeout)
            .foreign_keys(true))
    }
}

/// Cloneable handle over the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(location = %config.location, "Opening database");

        if let DbLocation::File(path) = &config.location {
            if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)
                    .map_err(|e| DbError::ConnectionFailed(format!("{}: {e}", dir.display())))?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.busy_timeout)
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        let db = Database { pool };
        if config.run_migrations {
            migrations::run_migrations(&db.pool).await?;
        }

        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn items(&self) -> ItemRepository {
        ItemRepository::new(self.pool.clone())
    }

    pub fn transactions(&self) -> TransactionRepository {
        TransactionRepository::new(self.pool.clone())
    }

    /// Closes every connection. Later repository calls fail with
    /// [`DbError::ConnectionFailed`].
    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pocket_core::{InventoryItem, Money};

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
    }

    #[tokio::test]
    async fn test_closed_database_is_unhealthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        assert!(!db.health_check().await);
        assert!(matches!(
            db.items().count().await,
            Err(DbError::ConnectionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_file_database_survives_reopen() {
        let path = std::env::temp_dir().join(format!("pocket-db-reopen-{}.db", std::process::id()));
        let remove = |path: &PathBuf| {
            for suffix in ["", "-wal", "-shm"] {
                let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
            }
        };
        remove(&path);

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        db.items()
            .insert(&InventoryItem::new("item-1", "Coca-Cola 330ml", "CC330ML", Money::from_cents(150), 45))
            .await
            .unwrap();
        db.close().await;

        // Migrations run again on an already-migrated file
        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        assert_eq!(db.items().count().await.unwrap(), 1);
        db.close().await;

        remove(&path);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(0)
            .run_migrations(false);

        assert_eq!(config.max_connections, 1);
        assert!(!config.run_migrations);
        assert_eq!(config.location.to_string(), "/tmp/test.db");
        assert_eq!(DbConfig::in_memory().location, DbLocation::Memory);
    }
}
