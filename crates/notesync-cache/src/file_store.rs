//! JSON document implementation of INoteStore
//!
//! The whole collection lives in a single file holding a JSON array of
//! notes. Every write serializes the next collection to `<path>.tmp` and
//! renames it over the target, so a crash never leaves a half-written
//! document behind.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use notesync_core::domain::{Note, NoteId, SyncError};
use notesync_core::ports::{INoteStore, NoteSubscription};

use crate::snapshot::{dedup_by_id, NoteSnapshot};
use crate::CacheError;

/// Note store backed by a single JSON file
#[derive(Debug)]
pub struct JsonFileNoteStore {
    path: PathBuf,
    snapshot: NoteSnapshot,
}

impl JsonFileNoteStore {
    /// Open the store at `path`, loading any existing document
    ///
    /// A missing file is an empty collection. A file that exists but cannot
    /// be parsed is an error rather than an empty collection, so a corrupt
    /// cache is never silently overwritten.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();

        let notes = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => serde_json::from_slice::<Vec<Note>>(&bytes).map_err(|e| {
                CacheError::SerializationError(format!(
                    "Failed to parse note file {}: {}",
                    path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(CacheError::Io(e)),
        };

        info!(path = %path.display(), count = notes.len(), "Note file loaded");

        Ok(Self {
            path,
            snapshot: NoteSnapshot::new(notes),
        })
    }

    /// Location of the backing document
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[instrument(skip(self, notes), fields(path = %self.path.display(), count = notes.len()))]
    async fn persist(&self, notes: &[Note]) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let data = serde_json::to_vec_pretty(notes)
            .map_err(|e| CacheError::SerializationError(e.to_string()))?;

        let tmp_path = {
            let mut p = self.path.as_os_str().to_owned();
            p.push(".tmp");
            PathBuf::from(p)
        };

        debug!(?tmp_path, "writing to temporary file");
        tokio::fs::write(&tmp_path, &data).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        debug!("note file written");
        Ok(())
    }

    async fn commit(&self, next: Vec<Note>) -> Result<(), SyncError> {
        if let Err(e) = self.persist(&next).await {
            warn!(path = %self.path.display(), error = %e, "Failed to persist note file");
            return Err(e.into());
        }
        self.snapshot.publish(next);
        Ok(())
    }
}

#[async_trait::async_trait]
impl INoteStore for JsonFileNoteStore {
    fn read_all(&self) -> Vec<Note> {
        self.snapshot.current().as_ref().clone()
    }

    fn read_by_id(&self, id: &NoteId) -> Option<Note> {
        self.snapshot.find(id)
    }

    async fn write(&self, note: &Note) -> Result<(), SyncError> {
        let _guard = self.snapshot.lock().await;
        let next = self.snapshot.with_upserted(note);
        self.commit(next).await
    }

    async fn write_all(&self, notes: &[Note]) -> Result<(), SyncError> {
        let _guard = self.snapshot.lock().await;
        self.commit(dedup_by_id(notes)).await
    }

    async fn remove(&self, id: &NoteId) -> Result<(), SyncError> {
        let _guard = self.snapshot.lock().await;
        match self.snapshot.without(id) {
            Some(next) => self.commit(next).await,
            None => Ok(()),
        }
    }

    fn subscribe(&self) -> NoteSubscription {
        self.snapshot.subscribe()
    }
}
