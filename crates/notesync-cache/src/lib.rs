//! notesync Cache - Durable local note storage
//!
//! Two interchangeable implementations of the `INoteStore` port:
//! - [`JsonFileNoteStore`] - the whole collection as one JSON document,
//!   rewritten atomically on every write
//! - [`SqliteNoteStore`] - one row per note in a SQLite database
//!
//! ## Architecture
//!
//! Both stores keep the current collection in a shared [`NoteSnapshot`]
//! so reads never touch the disk. Writes are serialized, persisted first
//! and published to subscribers only after the durable write succeeded.
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use notesync_cache::{DatabasePool, SqliteNoteStore};
//!
//! # async fn example() -> Result<(), notesync_cache::CacheError> {
//! let pool = DatabasePool::new(Path::new("/home/user/.local/share/notesync/notes.db")).await?;
//! let store = SqliteNoteStore::new(pool.pool().clone()).await?;
//! // Use store as INoteStore...
//! # Ok(())
//! # }
//! ```

pub mod file_store;
pub mod pool;
pub mod snapshot;
pub mod sqlite_store;

pub use file_store::JsonFileNoteStore;
pub use pool::DatabasePool;
pub use snapshot::NoteSnapshot;
pub use sqlite_store::SqliteNoteStore;

use notesync_core::domain::SyncError;

/// Errors that can occur during cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Serialization or deserialization of domain types failed
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Reading or writing the cache file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for CacheError {
    fn from(e: sqlx::Error) -> Self {
        CacheError::QueryFailed(e.to_string())
    }
}

impl From<CacheError> for SyncError {
    fn from(e: CacheError) -> Self {
        SyncError::Storage(e.to_string())
    }
}
