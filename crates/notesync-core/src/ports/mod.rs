//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the interfaces the synchronization core depends on; their
//! implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`INoteStore`] - Durable local cache with a change stream
//! - [`IRemoteNotes`] - Revision-aware access to the remote note list

pub mod local_store;
pub mod remote_notes;

pub use local_store::{INoteStore, NoteByIdSubscription, NoteSubscription};
pub use remote_notes::{IRemoteNotes, Revisioned};
