//! Error types for document store operations.
//!
//! These errors are produced by [`DocumentStore`](super::DocumentStore)
//! implementations. Custom stores map their own failures onto
//! [`StoreError::Backend`].

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during document store operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write would give two documents the same value for a uniquely indexed field.
    #[error("Duplicate key error on unique field '{field}': {value}")]
    DuplicateKey {
        /// The uniquely indexed field
        field: String,
        /// The value that already exists
        value: Value,
    },

    /// Serialization of store contents failed.
    #[error("Serialization failed")]
    SerializationFailed {
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization of store contents failed.
    #[error("Deserialization failed")]
    DeserializationFailed {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// A persisted store file uses a format version this build cannot read.
    #[error("Unsupported persistence version {version}")]
    UnsupportedVersion {
        /// The version found in the file
        version: u8,
    },

    /// File I/O error.
    #[error("File I/O error")]
    FileIo {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failure reported by an external storage engine.
    #[error("Storage backend error: {reason}")]
    Backend {
        /// Description of the failure
        reason: String,
    },
}

impl StoreError {
    /// Check if this error is a unique index violation.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, StoreError::DuplicateKey { .. })
    }

    /// The field whose unique index was violated, if this is a duplicate key error.
    pub fn duplicate_field(&self) -> Option<&str> {
        match self {
            StoreError::DuplicateKey { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Check if this error is related to I/O or (de)serialization of store files.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            StoreError::FileIo { .. }
                | StoreError::SerializationFailed { .. }
                | StoreError::DeserializationFailed { .. }
                | StoreError::UnsupportedVersion { .. }
        )
    }

    /// Check if this error came from an external storage engine.
    pub fn is_backend_error(&self) -> bool {
        matches!(self, StoreError::Backend { .. })
    }
}

// Conversion from StoreError to the main Error type
impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
