//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including validation failures, invalid state transitions and
//! storage failures surfaced by the persistent store.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid state transition attempt
    #[error("Invalid state transition from {from} to {to}")]
    InvalidState {
        /// The current state
        from: String,
        /// The attempted target state
        to: String,
    },

    /// Generic validation failure (e.g. an empty topic)
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Unknown content kind tag
    #[error("Unknown content kind: {0}")]
    UnknownContentKind(String),

    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),
}

/// Errors raised by the persistent store
///
/// These never escape the core's public mutation API: the store and the
/// repositories built on it log and absorb them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A value could not be encoded to or decoded from JSON
    #[error("Serialization failed for key '{key}': {message}")]
    Serialization {
        /// The namespaced key involved
        key: String,
        /// Encoder/decoder message
        message: String,
    },

    /// The underlying storage medium rejected the operation
    #[error("Storage backend failed for key '{key}': {message}")]
    Backend {
        /// The namespaced key involved
        key: String,
        /// Backend error message
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::ValidationFailed("topic must not be empty".to_string());
        assert_eq!(err.to_string(), "Validation failed: topic must not be empty");

        let err = DomainError::InvalidState {
            from: "Disposed".to_string(),
            to: "Processing".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid state transition from Disposed to Processing"
        );

        let err = StoreError::Backend {
            key: "sahayak_recent_likes".to_string(),
            message: "disk full".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Storage backend failed for key 'sahayak_recent_likes': disk full"
        );
    }

    #[test]
    fn test_error_equality() {
        let err1 = DomainError::UnknownContentKind("poem".to_string());
        let err2 = DomainError::UnknownContentKind("poem".to_string());
        let err3 = DomainError::UnknownContentKind("essay".to_string());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
