//! notesync Sync - Revision-aware synchronization
//!
//! Provides:
//! - Tracking of the last known server revision
//! - Bounded linear-backoff retry of transient failures
//! - The sync coordinator: cache-first reads, write-through mutations and
//!   out-of-sync recovery
//!
//! ## Modules
//!
//! - [`coordinator`] - Repository contract exposed to callers
//! - [`retry`] - Retry executor and policy
//! - [`revision`] - Revision tracker

pub mod coordinator;
pub mod retry;
pub mod revision;

pub use coordinator::SyncCoordinator;
pub use retry::{RetryExecutor, RetryPolicy};
pub use revision::RevisionTracker;
