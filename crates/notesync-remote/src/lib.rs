//! notesync Remote - Notes server HTTP client
//!
//! Provides an async client for:
//! - Fetching the note list or a single note
//! - Creating, updating and deleting notes under the revision protocol
//! - Replacing the whole list (PATCH)
//! - Bearer token refresh on HTTP 401
//!
//! ## Modules
//!
//! - [`auth`] - Token providers and the single-flight refresher
//! - [`client`] - HTTP client, header protocol and status classification
//! - [`dto`] - Wire types and their mapping to domain notes
//! - [`provider`] - `IRemoteNotes` implementation

pub mod auth;
pub mod client;
pub mod dto;
pub mod provider;

pub use auth::{AuthRefresher, FileTokenProvider, StaticTokenProvider, TokenProvider};
pub use client::NotesApiClient;
pub use provider::HttpRemoteNotes;
