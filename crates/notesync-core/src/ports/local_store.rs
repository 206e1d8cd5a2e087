//! Local store port (driven/secondary port)
//!
//! This module defines the interface for the durable local note cache.
//!
//! ## Design Notes
//!
//! - Reads are synchronous and served from an in-memory snapshot; they
//!   never wait for disk I/O.
//! - Writes are async and durable. A write that fails leaves the snapshot
//!   untouched, so subscribers never observe state that was not persisted.
//! - Every write publishes the full collection to subscribers. A new
//!   subscriber receives the current collection immediately.

use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::{Note, NoteId, SyncError};

// ============================================================================
// Change stream
// ============================================================================

/// Subscription to the full note collection of a store
///
/// The first call to [`NoteSubscription::next`] yields the collection as it
/// was when the subscription was created; later calls wait for the next
/// write. The stream ends only when the store is dropped.
#[derive(Debug, Clone)]
pub struct NoteSubscription {
    rx: watch::Receiver<Arc<Vec<Note>>>,
    primed: bool,
}

impl NoteSubscription {
    /// Wrap a watch receiver handed out by a store
    pub fn new(rx: watch::Receiver<Arc<Vec<Note>>>) -> Self {
        Self { rx, primed: true }
    }

    /// Collection as currently published, without waiting
    pub fn current(&self) -> Arc<Vec<Note>> {
        Arc::clone(&self.rx.borrow())
    }

    /// Wait for the next emission
    ///
    /// Returns `None` once the store has been dropped.
    pub async fn next(&mut self) -> Option<Arc<Vec<Note>>> {
        if self.primed {
            self.primed = false;
            return Some(Arc::clone(&self.rx.borrow_and_update()));
        }
        self.rx.changed().await.ok()?;
        Some(Arc::clone(&self.rx.borrow_and_update()))
    }

    /// Narrow the subscription to a single note
    pub fn for_note(self, id: NoteId) -> NoteByIdSubscription {
        NoteByIdSubscription {
            inner: self,
            id,
            last: None,
        }
    }
}

/// Subscription to a single note, derived from a [`NoteSubscription`]
///
/// Yields `Some(note)` while the note exists and `None` after it has been
/// removed. Consecutive identical values are emitted once.
#[derive(Debug, Clone)]
pub struct NoteByIdSubscription {
    inner: NoteSubscription,
    id: NoteId,
    last: Option<Option<Note>>,
}

impl NoteByIdSubscription {
    /// Id this subscription follows
    pub fn id(&self) -> &NoteId {
        &self.id
    }

    /// Wait for the next distinct value of the note
    ///
    /// The outer `None` means the store has been dropped.
    pub async fn next(&mut self) -> Option<Option<Note>> {
        loop {
            let notes = self.inner.next().await?;
            let current = notes.iter().find(|n| n.id() == &self.id).cloned();
            if self.last.as_ref() != Some(&current) {
                self.last = Some(current.clone());
                return Some(current);
            }
        }
    }
}

// ============================================================================
// INoteStore trait
// ============================================================================

/// Port trait for the durable local note cache
///
/// ## Implementation Notes
///
/// - `read_all` returns notes ordered by creation time, newest first.
/// - `write` is an upsert keyed by note id.
/// - `write_all` replaces the whole collection.
/// - `remove` of an unknown id is a successful no-op.
/// - Durability failures are reported as [`SyncError::Storage`].
#[async_trait::async_trait]
pub trait INoteStore: Send + Sync {
    /// Returns the current collection without blocking on I/O
    fn read_all(&self) -> Vec<Note>;

    /// Looks up a single note in the current collection
    ///
    /// # Arguments
    /// * `id` - Identifier of the note
    ///
    /// # Returns
    /// The note if present, `None` otherwise
    fn read_by_id(&self, id: &NoteId) -> Option<Note>;

    /// Inserts or replaces a single note
    ///
    /// # Arguments
    /// * `note` - The note to persist
    async fn write(&self, note: &Note) -> Result<(), SyncError>;

    /// Replaces the whole collection
    ///
    /// # Arguments
    /// * `notes` - The new collection; any note not in it is dropped
    async fn write_all(&self, notes: &[Note]) -> Result<(), SyncError>;

    /// Deletes a note by id
    ///
    /// # Arguments
    /// * `id` - Identifier of the note to delete
    async fn remove(&self, id: &NoteId) -> Result<(), SyncError>;

    /// Subscribes to the collection change stream
    fn subscribe(&self) -> NoteSubscription;
}
