//! Domain error types
//!
//! This module defines two error families:
//! - [`DomainError`] for value validation (ids, colors, importance tokens)
//! - [`SyncError`] for every failure a store, remote or coordinator
//!   operation can surface to its caller

use thiserror::Error;

/// Errors that can occur while constructing domain values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Note identifier is empty or malformed
    #[error("Invalid note id: {0}")]
    InvalidId(String),

    /// Color is not a `#RRGGBB` / `#AARRGGBB` hex string
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Unknown importance token
    #[error("Invalid importance: {0}")]
    InvalidImportance(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// Failure taxonomy shared by the local store, the remote client and the
/// sync coordinator.
///
/// See [`SyncError::is_retriable`] for how the retry executor classifies
/// each variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Local persistence failed (disk, database, serialization)
    #[error("Storage failure: {0}")]
    Storage(String),

    /// The server answered with a non-success status
    #[error("Remote failure (HTTP {status}): {message}")]
    Remote {
        /// HTTP status code returned by the server
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Credentials were rejected and could not be refreshed
    #[error("Unauthorized")]
    Unauthorized,

    /// The revision presented with a mutation does not match the server's
    #[error("Local revision is out of sync with the server")]
    OutOfSync,

    /// Transport-level timeout or connection failure
    #[error("Network timeout: {0}")]
    NetworkTimeout(String),

    /// Anything else, including undecodable payloads
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl SyncError {
    /// Whether a failed attempt should be retried by the retry executor.
    ///
    /// Server errors (5xx), authorization failures and network timeouts are
    /// transient. Client errors, revision mismatches and storage failures
    /// propagate immediately.
    pub fn is_retriable(&self) -> bool {
        match self {
            SyncError::Remote { status, .. } => (500..600).contains(status),
            SyncError::Unauthorized | SyncError::NetworkTimeout(_) => true,
            SyncError::Storage(_) | SyncError::OutOfSync | SyncError::Unknown(_) => false,
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Remote { status, .. } => Some(*status),
            SyncError::Unauthorized => Some(401),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Unknown(format!("serialization: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::InvalidColor("#zz".to_string());
        assert_eq!(err.to_string(), "Invalid color: #zz");

        let err = SyncError::Remote {
            status: 503,
            message: "busy".to_string(),
        };
        assert_eq!(err.to_string(), "Remote failure (HTTP 503): busy");
        assert_eq!(
            SyncError::OutOfSync.to_string(),
            "Local revision is out of sync with the server"
        );
    }

    #[test]
    fn test_retriable_classification() {
        for status in [500, 502, 503, 599] {
            let err = SyncError::Remote {
                status,
                message: String::new(),
            };
            assert!(err.is_retriable(), "{status} should be retriable");
        }
        for status in [400, 404, 409] {
            let err = SyncError::Remote {
                status,
                message: String::new(),
            };
            assert!(!err.is_retriable(), "{status} should not be retriable");
        }

        assert!(SyncError::Unauthorized.is_retriable());
        assert!(SyncError::NetworkTimeout("read".into()).is_retriable());
        assert!(!SyncError::OutOfSync.is_retriable());
        assert!(!SyncError::Storage("disk full".into()).is_retriable());
        assert!(!SyncError::Unknown("?".into()).is_retriable());
    }

    #[test]
    fn test_status() {
        assert_eq!(SyncError::Unauthorized.status(), Some(401));
        assert_eq!(
            SyncError::Remote {
                status: 400,
                message: String::new()
            }
            .status(),
            Some(400)
        );
        assert_eq!(SyncError::OutOfSync.status(), None);
    }

    #[test]
    fn test_error_equality() {
        let err1 = SyncError::Storage("a".to_string());
        let err2 = SyncError::Storage("a".to_string());
        let err3 = SyncError::Storage("b".to_string());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
        assert_eq!(err1.clone(), err1);
    }
}
