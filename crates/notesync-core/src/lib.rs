//! notesync Core - Domain types and port definitions
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Note`, `NoteId`, `Importance`, `NoteColor`, `Revision`
//! - **Error taxonomy** - `SyncError`, shared by every adapter and the coordinator
//! - **Port definitions** - Traits for adapters: `INoteStore`, `IRemoteNotes`
//! - **Configuration** - YAML configuration with validation
//!
//! # Architecture
//!
//! The domain module has no I/O. Ports define trait interfaces that the
//! cache and remote crates implement, and the sync crate orchestrates
//! domain values through those interfaces.

pub mod config;
pub mod domain;
pub mod ports;
