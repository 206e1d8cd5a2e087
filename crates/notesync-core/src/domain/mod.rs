//! Domain entities and business logic
//!
//! This module contains the core domain types for notesync:
//! - The `Note` entity and its `Importance`
//! - Newtypes for identifiers, colors and server revisions
//! - Domain-specific and synchronization error types

pub mod errors;
pub mod newtypes;
pub mod note;

// Re-export commonly used types
pub use errors::{DomainError, SyncError};
pub use newtypes::*;
pub use note::{now_millis, Importance, Note};
