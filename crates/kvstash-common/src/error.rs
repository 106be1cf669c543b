//! Error types for kvstash
//!
//! This module defines the common error type used throughout the system.
//! Expected failure modes (missing key, lock timeout, busy server) are
//! always surfaced as `Err` values, never panics.

use crate::types::KeyError;
use thiserror::Error;

/// Common result type for kvstash operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for kvstash
#[derive(Debug, Error)]
pub enum Error {
    // Resolution errors, raised before any backend is touched
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid key: {0}")]
    InvalidKey(#[from] KeyError),

    // Instance construction failures; never cached, so a later call
    // retries construction after a transient failure clears
    #[error("backend instance {instance} could not be constructed: {reason}")]
    Construction { instance: String, reason: String },

    // Per-operation backend errors
    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("key folder not found: {0}")]
    FolderNotFound(String),

    #[error("timed out waiting for lock on {path} after {waited_ms} ms")]
    LockTimeout { path: String, waited_ms: u64 },

    #[error("server busy: {0}")]
    ServerBusy(String),

    #[error("malformed entry for {key}: {detail}")]
    MalformedEntry { key: String, detail: String },

    #[error("operation failed: {0}")]
    Operation(String),

    // Envelope errors
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("unsupported envelope encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a construction error for a backend instance
    pub fn construction(instance: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Construction {
            instance: instance.into(),
            reason: reason.into(),
        }
    }

    /// Create an operation error
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Create a serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Check if this is a not found error
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound(_) | Self::FolderNotFound(_))
    }

    /// Check if this is a retryable error
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServerBusy(_) | Self::LockTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_not_found() {
        assert!(Error::KeyNotFound("app/key".into()).is_not_found());
        assert!(Error::FolderNotFound("app".into()).is_not_found());
        assert!(!Error::Configuration("test".into()).is_not_found());
    }

    #[test]
    fn test_error_retryable() {
        assert!(Error::ServerBusy("test".into()).is_retryable());
        assert!(Error::LockTimeout {
            path: "/tmp/k".into(),
            waited_ms: 5000
        }
        .is_retryable());
        assert!(!Error::KeyNotFound("k".into()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = Error::construction("file/prod", "cannot create root");
        assert_eq!(
            err.to_string(),
            "backend instance file/prod could not be constructed: cannot create root"
        );
    }
}
