//! SQLite implementation of INoteStore
//!
//! ## Type Mapping
//!
//! | Domain Type     | SQL Type | Strategy                                  |
//! |-----------------|----------|-------------------------------------------|
//! | NoteId          | TEXT     | `.as_str()` / `FromStr`                   |
//! | NoteColor       | INTEGER  | `0xRRGGBB` via `.rgb()` / `from_rgb()`    |
//! | Importance      | TEXT     | `.as_str()` / `FromStr`                   |
//! | DateTime<Utc>   | TEXT     | RFC 3339 with milliseconds, `Z` suffix    |
//!
//! The fixed-width timestamp format keeps `ORDER BY created_at` in
//! chronological order.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use notesync_core::domain::{Importance, Note, NoteColor, NoteId, SyncError};
use notesync_core::ports::{INoteStore, NoteSubscription};

use crate::pool::DatabasePool;
use crate::snapshot::{dedup_by_id, NoteSnapshot};
use crate::CacheError;

/// SQLite-backed note store
///
/// All rows are loaded once at construction; afterwards reads are served
/// from memory and every write goes to the database before it becomes
/// visible.
#[derive(Debug)]
pub struct SqliteNoteStore {
    pool: SqlitePool,
    snapshot: NoteSnapshot,
}

impl SqliteNoteStore {
    /// Creates a store over an already-migrated pool
    pub async fn new(pool: SqlitePool) -> Result<Self, CacheError> {
        let rows = sqlx::query("SELECT * FROM notes ORDER BY created_at DESC, id ASC")
            .fetch_all(&pool)
            .await?;
        let notes = rows
            .iter()
            .map(note_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(count = notes.len(), "Loaded notes from database");

        Ok(Self {
            pool,
            snapshot: NoteSnapshot::new(notes),
        })
    }

    /// Opens (or creates) the database at `path` and loads it
    pub async fn open(path: &Path) -> Result<Self, CacheError> {
        let db = DatabasePool::new(path).await?;
        Self::new(db.pool().clone()).await
    }

    /// Fresh in-memory store, used by tests
    pub async fn in_memory() -> Result<Self, CacheError> {
        let db = DatabasePool::in_memory().await?;
        Self::new(db.pool().clone()).await
    }

    /// Returns the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// ============================================================================
// Helper functions for type conversion
// ============================================================================

fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, CacheError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            CacheError::SerializationError(format!("Failed to parse datetime '{}': {}", s, e))
        })
}

fn note_from_row(row: &SqliteRow) -> Result<Note, CacheError> {
    let id: String = row.try_get("id")?;
    let color: i64 = row.try_get("color")?;
    let importance: String = row.try_get("importance")?;
    let self_destruct_at: Option<String> = row.try_get("self_destruct_at")?;
    let created_at: String = row.try_get("created_at")?;
    let last_modified_at: String = row.try_get("last_modified_at")?;

    let id = id
        .parse::<NoteId>()
        .map_err(|e| CacheError::SerializationError(e.to_string()))?;
    let importance = importance
        .parse::<Importance>()
        .map_err(|e| CacheError::SerializationError(e.to_string()))?;
    let self_destruct_at = match self_destruct_at {
        Some(ref s) if !s.is_empty() => Some(parse_datetime(s)?),
        _ => None,
    };

    Ok(Note::with_id(
        id,
        row.try_get("title")?,
        row.try_get("body")?,
        NoteColor::from_rgb(color as u32),
        importance,
        self_destruct_at,
        parse_datetime(&created_at)?,
        parse_datetime(&last_modified_at)?,
        row.try_get("last_modified_by")?,
    ))
}

async fn upsert<'e, E>(executor: E, note: &Note) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        "INSERT OR REPLACE INTO notes \
         (id, title, body, color, importance, self_destruct_at, \
          created_at, last_modified_at, last_modified_by) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(note.id().as_str())
    .bind(note.title())
    .bind(note.body())
    .bind(i64::from(note.color().rgb()))
    .bind(note.importance().as_str())
    .bind(note.self_destruct_at().map(format_datetime))
    .bind(format_datetime(note.created_at()))
    .bind(format_datetime(note.last_modified_at()))
    .bind(note.last_modified_by())
    .execute(executor)
    .await?;
    Ok(())
}

// ============================================================================
// INoteStore implementation
// ============================================================================

#[async_trait::async_trait]
impl INoteStore for SqliteNoteStore {
    fn read_all(&self) -> Vec<Note> {
        self.snapshot.current().as_ref().clone()
    }

    fn read_by_id(&self, id: &NoteId) -> Option<Note> {
        self.snapshot.find(id)
    }

    async fn write(&self, note: &Note) -> Result<(), SyncError> {
        let _guard = self.snapshot.lock().await;

        upsert(&self.pool, note)
            .await
            .map_err(CacheError::from)?;

        self.snapshot.publish(self.snapshot.with_upserted(note));
        tracing::trace!(note_id = %note.id(), "Saved note");
        Ok(())
    }

    async fn write_all(&self, notes: &[Note]) -> Result<(), SyncError> {
        let _guard = self.snapshot.lock().await;
        let notes = dedup_by_id(notes);

        let mut tx = self.pool.begin().await.map_err(CacheError::from)?;
        sqlx::query("DELETE FROM notes")
            .execute(&mut *tx)
            .await
            .map_err(CacheError::from)?;
        for note in &notes {
            upsert(&mut *tx, note).await.map_err(CacheError::from)?;
        }
        tx.commit().await.map_err(CacheError::from)?;

        tracing::debug!(count = notes.len(), "Replaced note table");
        self.snapshot.publish(notes);
        Ok(())
    }

    async fn remove(&self, id: &NoteId) -> Result<(), SyncError> {
        let _guard = self.snapshot.lock().await;

        sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(CacheError::from)?;

        if let Some(next) = self.snapshot.without(id) {
            self.snapshot.publish(next);
        }
        tracing::trace!(note_id = %id, "Removed note");
        Ok(())
    }

    fn subscribe(&self) -> NoteSubscription {
        self.snapshot.subscribe()
    }
}
