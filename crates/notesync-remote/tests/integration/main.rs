//! Integration tests for notesync-remote
//!
//! Uses wiremock to simulate the notes server and verifies the request
//! shapes, revision headers, error classification and token refresh of
//! the HTTP adapter.

mod common;

mod test_auth;
mod test_fetch;
mod test_mutations;
