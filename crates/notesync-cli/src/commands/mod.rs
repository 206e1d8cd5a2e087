//! CLI command implementations

pub mod config;
pub mod note;
pub mod sync;
pub mod watch;
