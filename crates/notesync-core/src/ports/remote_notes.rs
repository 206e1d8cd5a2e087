//! Remote notes port (driven/secondary port)
//!
//! This module defines the interface to the authoritative server-side note
//! list. Every response carries the server revision observed after the
//! call; every mutation presents the revision the client last saw.

use crate::domain::{Note, NoteId, Revision, SyncError};

/// A response value paired with the server revision it was produced at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revisioned<T> {
    pub value: T,
    pub revision: Revision,
}

impl<T> Revisioned<T> {
    pub fn new(value: T, revision: Revision) -> Self {
        Self { value, revision }
    }

    /// Transform the value while keeping the revision
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Revisioned<U> {
        Revisioned {
            value: f(self.value),
            revision: self.revision,
        }
    }
}

/// Port trait for the remote note list
///
/// Implementations are stateless request/response wrappers: they know the
/// wire schema and the header protocol but apply no retry or caching
/// policy of their own.
///
/// ## Error mapping
///
/// - A mutation rejected because of a stale revision returns
///   [`SyncError::OutOfSync`].
/// - HTTP 401 returns [`SyncError::Unauthorized`].
/// - Any other non-success status returns [`SyncError::Remote`].
/// - Timeouts and connection failures return [`SyncError::NetworkTimeout`].
#[async_trait::async_trait]
pub trait IRemoteNotes: Send + Sync {
    /// Fetches the full note list
    async fn fetch_all(&self) -> Result<Revisioned<Vec<Note>>, SyncError>;

    /// Fetches a single note
    ///
    /// # Arguments
    /// * `id` - Identifier of the note
    async fn fetch_one(&self, id: &NoteId) -> Result<Revisioned<Note>, SyncError>;

    /// Creates a note on the server
    ///
    /// # Arguments
    /// * `note` - The note to create
    /// * `revision` - Last revision known to the client
    ///
    /// # Returns
    /// The note as stored by the server and the new revision
    async fn create(&self, note: &Note, revision: Revision)
        -> Result<Revisioned<Note>, SyncError>;

    /// Replaces an existing note on the server
    ///
    /// # Arguments
    /// * `note` - The new version of the note
    /// * `revision` - Last revision known to the client
    async fn update(&self, note: &Note, revision: Revision)
        -> Result<Revisioned<Note>, SyncError>;

    /// Deletes a note on the server
    ///
    /// # Arguments
    /// * `id` - Identifier of the note to delete
    /// * `revision` - Last revision known to the client
    ///
    /// # Returns
    /// The deleted note and the new revision
    async fn delete(&self, id: &NoteId, revision: Revision)
        -> Result<Revisioned<Note>, SyncError>;

    /// Replaces the whole server list
    ///
    /// # Arguments
    /// * `notes` - The complete list the server should hold
    /// * `revision` - Last revision known to the client
    ///
    /// # Returns
    /// The merged list as stored by the server and the new revision
    async fn patch_all(
        &self,
        notes: &[Note],
        revision: Revision,
    ) -> Result<Revisioned<Vec<Note>>, SyncError>;
}
