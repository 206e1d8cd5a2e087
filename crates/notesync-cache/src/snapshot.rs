//! In-memory view of the note collection shared by both stores
//!
//! A [`NoteSnapshot`] owns the watch channel behind `INoteStore::subscribe`
//! and an async write lock. Stores take the lock, persist the next
//! collection, and only then call [`NoteSnapshot::publish`].

use std::cmp::Reverse;
use std::sync::Arc;

use tokio::sync::{watch, Mutex, MutexGuard};

use notesync_core::domain::{Note, NoteId};
use notesync_core::ports::NoteSubscription;

/// Current note collection plus the change stream built on top of it
#[derive(Debug)]
pub struct NoteSnapshot {
    tx: watch::Sender<Arc<Vec<Note>>>,
    write_lock: Mutex<()>,
}

impl NoteSnapshot {
    /// Create a snapshot holding `initial`
    pub fn new(initial: Vec<Note>) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(sorted(initial)));
        Self {
            tx,
            write_lock: Mutex::new(()),
        }
    }

    /// The collection as last published, newest note first
    pub fn current(&self) -> Arc<Vec<Note>> {
        Arc::clone(&self.tx.borrow())
    }

    pub fn find(&self, id: &NoteId) -> Option<Note> {
        self.tx.borrow().iter().find(|n| n.id() == id).cloned()
    }

    pub fn subscribe(&self) -> NoteSubscription {
        NoteSubscription::new(self.tx.subscribe())
    }

    /// Serialize writers; hold the guard across persist and publish
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    /// Collection that results from upserting `note` into the current one
    pub fn with_upserted(&self, note: &Note) -> Vec<Note> {
        let mut notes: Vec<Note> = self
            .tx
            .borrow()
            .iter()
            .filter(|n| n.id() != note.id())
            .cloned()
            .collect();
        notes.push(note.clone());
        sorted(notes)
    }

    /// Collection that results from removing `id`, or `None` if absent
    pub fn without(&self, id: &NoteId) -> Option<Vec<Note>> {
        let current = self.tx.borrow();
        if !current.iter().any(|n| n.id() == id) {
            return None;
        }
        Some(current.iter().filter(|n| n.id() != id).cloned().collect())
    }

    /// Replace the collection and notify every subscriber
    pub fn publish(&self, notes: Vec<Note>) {
        self.tx.send_replace(Arc::new(sorted(notes)));
    }
}

/// Newest first; ties broken by id so the order is stable
pub(crate) fn sorted(mut notes: Vec<Note>) -> Vec<Note> {
    notes.sort_by(|a, b| {
        Reverse(a.created_at())
            .cmp(&Reverse(b.created_at()))
            .then_with(|| a.id().cmp(b.id()))
    });
    notes
}

/// Collapse duplicate ids, keeping the last occurrence
pub(crate) fn dedup_by_id(notes: &[Note]) -> Vec<Note> {
    let mut out: Vec<Note> = Vec::with_capacity(notes.len());
    for note in notes {
        if let Some(existing) = out.iter_mut().find(|n| n.id() == note.id()) {
            *existing = note.clone();
        } else {
            out.push(note.clone());
        }
    }
    out
}
