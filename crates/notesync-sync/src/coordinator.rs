//! Sync coordinator
//!
//! Owns the revision protocol between the local store and the remote note
//! list and exposes the repository contract used by front ends.
//!
//! ## Mutations
//!
//! Every create, update, delete and patch runs under one coordinator-wide
//! lock:
//!
//! 1. Send the call with the tracked revision, through the retry executor.
//! 2. On success, store the returned revision and write the result through
//!    to the local store.
//! 3. On `OutOfSync`, fetch the full list once, overwrite the store and the
//!    revision, and send the call once more. Whatever that second call
//!    returns is final.
//!
//! Each operation runs on its own spawned task and the caller only awaits
//! the task. Dropping the caller's future does not stop an operation that
//! is already under way, so the revision and the cache never diverge.
//!
//! ## Reads
//!
//! `get_note` and `get_all_notes` answer from the cache unless forced or
//! the cache has nothing to offer; a failed refresh falls back to the cache.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use notesync_core::domain::{Note, NoteId, Revision, SyncError};
use notesync_core::ports::{
    INoteStore, IRemoteNotes, NoteByIdSubscription, NoteSubscription, Revisioned,
};

use crate::retry::RetryExecutor;
use crate::revision::RevisionTracker;

// ============================================================================
// Mutations
// ============================================================================

/// A single revision-guarded remote operation
enum Mutation {
    Create(Note),
    Update(Note),
    Delete(NoteId),
    Patch(Vec<Note>),
}

/// Successful server answer to a [`Mutation`]
enum Applied {
    Note(Revisioned<Note>),
    List(Revisioned<Vec<Note>>),
}

impl Applied {
    fn revision(&self) -> Revision {
        match self {
            Applied::Note(r) => r.revision,
            Applied::List(r) => r.revision,
        }
    }

    fn into_note(self) -> Result<Note, SyncError> {
        match self {
            Applied::Note(r) => Ok(r.value),
            Applied::List(_) => Err(SyncError::Unknown(
                "expected a single note in the server answer".into(),
            )),
        }
    }
}

impl Mutation {
    fn name(&self) -> &'static str {
        match self {
            Mutation::Create(_) => "create",
            Mutation::Update(_) => "update",
            Mutation::Delete(_) => "delete",
            Mutation::Patch(_) => "patch_all",
        }
    }

    async fn send(
        &self,
        remote: &dyn IRemoteNotes,
        revision: Revision,
    ) -> Result<Applied, SyncError> {
        match self {
            Mutation::Create(note) => remote.create(note, revision).await.map(Applied::Note),
            Mutation::Update(note) => remote.update(note, revision).await.map(Applied::Note),
            Mutation::Delete(id) => remote.delete(id, revision).await.map(Applied::Note),
            Mutation::Patch(notes) => remote.patch_all(notes, revision).await.map(Applied::List),
        }
    }
}

// ============================================================================
// SyncCoordinator
// ============================================================================

/// State shared between the coordinator and its in-flight operations
struct Shared {
    store: Arc<dyn INoteStore>,
    remote: Arc<dyn IRemoteNotes>,
    revision: RevisionTracker,
    retry: RetryExecutor,
    /// Guards revision read, remote call and write-through of one operation
    sync_lock: Mutex<()>,
}

/// Reconciles the local note cache with the remote note list
///
/// ## Dependencies
///
/// - `store`: durable local cache and change stream
/// - `remote`: revision-aware access to the server
/// - `retry`: backoff policy applied to every remote call
pub struct SyncCoordinator {
    shared: Arc<Shared>,
}

impl SyncCoordinator {
    /// Creates a coordinator starting at [`Revision::INITIAL`]
    ///
    /// # Arguments
    /// * `store` - Local note cache
    /// * `remote` - Remote note list
    /// * `retry` - Retry executor wrapping every remote call
    pub fn new(
        store: Arc<dyn INoteStore>,
        remote: Arc<dyn IRemoteNotes>,
        retry: RetryExecutor,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                remote,
                revision: RevisionTracker::default(),
                retry,
                sync_lock: Mutex::new(()),
            }),
        }
    }

    /// Starts the initial best-effort fetch-and-reconcile in the background
    ///
    /// Failures are logged; the cache stays as it was.
    pub fn spawn_initial_sync(&self) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            match shared.refresh().await {
                Ok(notes) => info!(
                    count = notes.len(),
                    revision = %shared.revision.current(),
                    "Initial sync completed"
                ),
                Err(e) => warn!(error = %e, "Initial sync failed, continuing with cached notes"),
            }
        })
    }

    /// Last revision observed from the server
    pub fn revision(&self) -> Revision {
        self.shared.revision.current()
    }

    // ------------------------------------------------------------------------
    // Local store access
    // ------------------------------------------------------------------------

    /// Stream of the full collection; replays the current state first
    pub fn notes_stream(&self) -> NoteSubscription {
        self.shared.store.subscribe()
    }

    /// Stream of a single note; `None` once it is gone
    pub fn note_stream(&self, id: NoteId) -> NoteByIdSubscription {
        self.shared.store.subscribe().for_note(id)
    }

    pub async fn save_note_to_cache(&self, note: &Note) -> Result<(), SyncError> {
        self.shared.store.write(note).await
    }

    pub async fn delete_note_from_cache(&self, id: &NoteId) -> Result<(), SyncError> {
        self.shared.store.remove(id).await
    }

    // ------------------------------------------------------------------------
    // Remote operations
    // ------------------------------------------------------------------------

    /// Fetch the full list, replacing the cache and the tracked revision
    #[instrument(skip(self))]
    pub async fn fetch_notes_from_backend(&self) -> Result<Vec<Note>, SyncError> {
        self.detached(|shared| async move { shared.refresh().await })
            .await
    }

    /// Push a note, creating it or updating it if the server already has it
    #[instrument(skip(self, note), fields(note_id = %note.id()))]
    pub async fn push_note_to_backend(&self, note: &Note) -> Result<Note, SyncError> {
        let note = note.clone();
        self.detached(|shared| async move {
            let _guard = shared.sync_lock.lock().await;
            shared.push_locked(&note).await
        })
        .await
    }

    #[instrument(skip(self, note), fields(note_id = %note.id()))]
    pub async fn update_note_on_backend(&self, note: &Note) -> Result<Note, SyncError> {
        self.execute(Mutation::Update(note.clone()))
            .await?
            .into_note()
    }

    /// Delete a note on the server and drop it from the cache
    ///
    /// A 404 means the server never had the note (it was only ever local);
    /// it is removed from the cache and the call succeeds.
    #[instrument(skip(self))]
    pub async fn delete_note_from_backend(&self, id: &NoteId) -> Result<(), SyncError> {
        let id = id.clone();
        self.detached(|shared| async move {
            let _guard = shared.sync_lock.lock().await;
            match shared.run_locked(&Mutation::Delete(id.clone())).await {
                Ok(_) => Ok(()),
                Err(SyncError::Remote { status: 404, .. }) => {
                    debug!(note_id = %id, "Note unknown to server, removing local copy");
                    shared.store.remove(&id).await
                }
                Err(e) => Err(e),
            }
        })
        .await
    }

    /// Replace the server list with `notes`; the merged answer replaces the cache
    #[instrument(skip(self, notes), fields(count = notes.len()))]
    pub async fn patch_notes_on_backend(&self, notes: &[Note]) -> Result<Vec<Note>, SyncError> {
        match self.execute(Mutation::Patch(notes.to_vec())).await? {
            Applied::List(r) => Ok(r.value),
            Applied::Note(r) => Ok(vec![r.value]),
        }
    }

    /// Upload the whole local cache as the new server list
    pub async fn push_cache_to_backend(&self) -> Result<Vec<Note>, SyncError> {
        let notes = self.shared.store.read_all();
        self.patch_notes_on_backend(&notes).await
    }

    /// Full fetch; the server list replaces the cache unconditionally
    pub async fn sync_with_backend(&self) -> Result<(), SyncError> {
        let notes = self.fetch_notes_from_backend().await?;
        info!(count = notes.len(), revision = %self.revision(), "Synchronized with backend");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Cache-first reads
    // ------------------------------------------------------------------------

    /// Cached note unless `force` or missing; then refetch and look again
    pub async fn get_note(&self, id: &NoteId, force: bool) -> Option<Note> {
        if !force {
            if let Some(note) = self.shared.store.read_by_id(id) {
                return Some(note);
            }
        }
        if let Err(e) = self.fetch_notes_from_backend().await {
            warn!(note_id = %id, error = %e, "Refresh failed, answering from cache");
        }
        self.shared.store.read_by_id(id)
    }

    /// Cached list unless `force` or empty; then refetch and look again
    pub async fn get_all_notes(&self, force: bool) -> Vec<Note> {
        if !force {
            let cached = self.shared.store.read_all();
            if !cached.is_empty() {
                return cached;
            }
        }
        if let Err(e) = self.fetch_notes_from_backend().await {
            warn!(error = %e, "Refresh failed, answering from cache");
        }
        self.shared.store.read_all()
    }

    // ------------------------------------------------------------------------
    // Optimistic flows
    // ------------------------------------------------------------------------

    /// Save locally, then push; the local copy stays if the push fails
    ///
    /// An out-of-sync recovery replaces the cache with the server list,
    /// which drops a note the server does not have yet. When the push then
    /// fails, the local copy is written back.
    #[instrument(skip(self, note), fields(note_id = %note.id()))]
    pub async fn save_note(&self, note: &Note) -> Result<Note, SyncError> {
        let note = note.clone();
        self.detached(|shared| async move {
            let _guard = shared.sync_lock.lock().await;
            shared.store.write(&note).await?;

            let err = match shared.push_locked(&note).await {
                Ok(saved) => return Ok(saved),
                Err(e) => e,
            };
            if shared.store.read_by_id(note.id()).as_ref() != Some(&note) {
                warn!(error = %err, "Push failed after the cache was replaced, restoring local copy");
                shared.store.write(&note).await?;
            }
            Err(err)
        })
        .await
    }

    /// Delete on the server first; the cache is only touched on success
    pub async fn delete_note(&self, id: &NoteId) -> Result<(), SyncError> {
        self.delete_note_from_backend(id).await
    }

    // ------------------------------------------------------------------------
    // Protocol
    // ------------------------------------------------------------------------

    async fn execute(&self, mutation: Mutation) -> Result<Applied, SyncError> {
        self.detached(|shared| async move {
            let _guard = shared.sync_lock.lock().await;
            shared.run_locked(&mutation).await
        })
        .await
    }

    /// Runs `operation` on its own task and waits for it
    async fn detached<F, Fut, T>(&self, operation: F) -> Result<T, SyncError>
    where
        F: FnOnce(Arc<Shared>) -> Fut,
        Fut: Future<Output = Result<T, SyncError>> + Send + 'static,
        T: Send + 'static,
    {
        tokio::spawn(operation(Arc::clone(&self.shared)))
            .await
            .map_err(|e| SyncError::Unknown(format!("sync task failed: {e}")))?
    }
}

impl Shared {
    /// Create, falling back to update when the server already has the note
    async fn push_locked(&self, note: &Note) -> Result<Note, SyncError> {
        match self.run_locked(&Mutation::Create(note.clone())).await {
            Ok(applied) => applied.into_note(),
            Err(SyncError::Remote { status: 400, .. }) => {
                debug!(note_id = %note.id(), "Create rejected, note already exists; updating instead");
                self.run_locked(&Mutation::Update(note.clone()))
                    .await?
                    .into_note()
            }
            Err(e) => Err(e),
        }
    }

    /// Send, recover once from `OutOfSync`, then write through; caller holds the lock
    async fn run_locked(&self, mutation: &Mutation) -> Result<Applied, SyncError> {
        let applied = match self.attempt(mutation).await {
            Ok(applied) => applied,
            Err(SyncError::OutOfSync) => {
                warn!(
                    operation = mutation.name(),
                    revision = %self.revision.current(),
                    "Revision out of sync, refetching before one retry"
                );
                self.refresh_locked().await?;
                self.attempt(mutation).await?
            }
            Err(e) => return Err(e),
        };

        self.revision.update(applied.revision());
        self.write_through(mutation, &applied).await?;
        Ok(applied)
    }

    async fn attempt(&self, mutation: &Mutation) -> Result<Applied, SyncError> {
        self.retry
            .run(mutation.name(), || {
                mutation.send(self.remote.as_ref(), self.revision.current())
            })
            .await
    }

    async fn write_through(&self, mutation: &Mutation, applied: &Applied) -> Result<(), SyncError> {
        match (mutation, applied) {
            (Mutation::Delete(id), _) => self.store.remove(id).await,
            (_, Applied::Note(r)) => self.store.write(&r.value).await,
            (_, Applied::List(r)) => self.store.write_all(&r.value).await,
        }
    }

    async fn refresh(&self) -> Result<Vec<Note>, SyncError> {
        let _guard = self.sync_lock.lock().await;
        self.refresh_locked().await
    }

    /// Fetch everything and overwrite revision and cache; caller holds the lock
    async fn refresh_locked(&self) -> Result<Vec<Note>, SyncError> {
        let fetched = self
            .retry
            .run("fetch_all", || self.remote.fetch_all())
            .await?;

        self.revision.update(fetched.revision);
        self.store.write_all(&fetched.value).await?;
        debug!(count = fetched.value.len(), revision = %fetched.revision, "Cache replaced from server");
        Ok(fetched.value)
    }
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("revision", &self.revision())
            .field("retry", self.shared.retry.policy())
            .finish_non_exhaustive()
    }
}
