//! SQLite pool for the note cache
//!
//! File databases run in WAL mode with a small pool; in-memory databases
//! use exactly one connection, since every SQLite memory database is private
//! to its connection.
//!
//! The schema is versioned with `PRAGMA user_version`. [`MIGRATIONS`] is
//! applied in order, each step in its own transaction, skipping the steps a
//! database already has.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::CacheError;

/// Ordered schema steps; entry `i` brings the database to version `i + 1`
const MIGRATIONS: &[&str] = &[include_str!("migrations/0001_notes.sql")];

const MAX_FILE_CONNECTIONS: u32 = 4;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Migrated connection pool for a note database
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens the database at `db_path`, creating the file and its directory
    ///
    /// # Errors
    ///
    /// `CacheError::ConnectionFailed` when the directory or the connection
    /// cannot be created, `CacheError::MigrationFailed` when a schema step
    /// fails.
    pub async fn new(db_path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CacheError::ConnectionFailed(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let db = Self::connect(options, MAX_FILE_CONNECTIONS).await?;
        info!(
            path = %db_path.display(),
            schema_version = db.schema_version().await?,
            "Note database opened"
        );
        Ok(db)
    }

    /// Fresh private in-memory database
    pub async fn in_memory() -> Result<Self, CacheError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| CacheError::ConnectionFailed(e.to_string()))?;
        Self::connect(options, 1).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Schema version currently recorded in the database
    pub async fn schema_version(&self) -> Result<i64, CacheError> {
        user_version(&self.pool).await
    }

    async fn connect(options: SqliteConnectOptions, max: u32) -> Result<Self, CacheError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max)
            // an in-memory database dies with its connection
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| CacheError::ConnectionFailed(e.to_string()))?;

        migrate(&pool).await?;
        Ok(Self { pool })
    }
}

async fn user_version(pool: &SqlitePool) -> Result<i64, CacheError> {
    let version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;
    Ok(version)
}

async fn migrate(pool: &SqlitePool) -> Result<(), CacheError> {
    let current = user_version(pool).await?;

    for (index, step) in MIGRATIONS.iter().enumerate() {
        let version = index as i64 + 1;
        if version <= current {
            continue;
        }

        let migration_failed =
            |e: sqlx::Error| CacheError::MigrationFailed(format!("schema step {version}: {e}"));

        let mut tx = pool.begin().await.map_err(migration_failed)?;
        sqlx::raw_sql(step)
            .execute(&mut *tx)
            .await
            .map_err(migration_failed)?;
        // PRAGMA does not take bind parameters
        sqlx::raw_sql(&format!("PRAGMA user_version = {version}"))
            .execute(&mut *tx)
            .await
            .map_err(migration_failed)?;
        tx.commit().await.map_err(migration_failed)?;

        debug!(version, "Applied schema step");
    }
    Ok(())
}
