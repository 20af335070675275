//! Tree error types for the Ancestry library.
//!
//! This module defines structured error types for tree operations: lookups,
//! cascades, orphan handling, configuration and integrity checks.

use thiserror::Error;

use crate::path::Uid;

/// Errors that can occur during tree operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TreeError {
    /// No record with the given id exists in the collection.
    #[error("Record not found: {id}")]
    NotFound {
        /// The id that was looked up
        id: Uid,
    },

    /// A tree operation was requested on a record that has not been saved.
    #[error("Cannot compute {operation} for a new record; save it before performing tree operations")]
    UnpersistedRecord {
        /// The operation that needed a persisted record
        operation: &'static str,
    },

    /// The `restrict` orphan strategy refused to delete a record with children.
    #[error("Cannot delete record {id} because it has descendants")]
    HasDescendants {
        /// The record that could not be deleted
        id: Uid,
    },

    /// A descendant write failed partway through a cascade.
    ///
    /// Descendants handled before the failure keep their new state; nothing is
    /// rolled back.
    #[error(
        "Cascade from record {id} failed at descendant {failed_id} after {completed} of {total} descendants were updated"
    )]
    PartialCascade {
        /// The record whose move or delete triggered the cascade
        id: Uid,
        /// The descendant whose write failed
        failed_id: Uid,
        /// Descendants already updated before the failure
        completed: usize,
        /// Descendants the cascade set out to update
        total: usize,
        /// The underlying store error
        #[source]
        source: Box<crate::Error>,
    },

    /// The collection already holds the largest representable id.
    #[error("No record id left to allocate after {last}")]
    IdSpaceExhausted {
        /// The highest id in use
        last: Uid,
    },

    /// A stored document cannot be read as a tree record.
    #[error("Invalid tree document: {reason}")]
    InvalidDocument {
        /// Description of the problem
        reason: String,
    },

    /// The tree configuration is unusable.
    #[error("Invalid tree configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem
        reason: String,
    },

    /// Integrity check found records breaking tree invariants.
    #[error("Tree integrity violation: {}", .problems.join("; "))]
    Integrity {
        /// One entry per problem found
        problems: Vec<String>,
    },
}

impl TreeError {
    /// Check if this error indicates a record was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TreeError::NotFound { .. })
    }

    /// Check if an operation needed a saved record.
    pub fn is_unpersisted_record(&self) -> bool {
        matches!(self, TreeError::UnpersistedRecord { .. })
    }

    /// Check if a `restrict` delete was refused.
    pub fn is_has_descendants(&self) -> bool {
        matches!(self, TreeError::HasDescendants { .. })
    }

    /// Check if a cascade stopped partway.
    pub fn is_partial_cascade(&self) -> bool {
        matches!(self, TreeError::PartialCascade { .. })
    }

    /// Check if id allocation ran out of ids.
    pub fn is_id_space_exhausted(&self) -> bool {
        matches!(self, TreeError::IdSpaceExhausted { .. })
    }

    /// Check if this error indicates malformed or inconsistent tree data.
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            TreeError::InvalidDocument { .. } | TreeError::Integrity { .. }
        )
    }

    /// Check if this error is about the tree configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(self, TreeError::InvalidConfig { .. })
    }

    /// Get the record id if this error is about a specific record.
    pub fn record_id(&self) -> Option<Uid> {
        match self {
            TreeError::NotFound { id }
            | TreeError::HasDescendants { id }
            | TreeError::PartialCascade { id, .. } => Some(*id),
            _ => None,
        }
    }
}

// Conversion from TreeError to the main Error type
impl From<TreeError> for crate::Error {
    fn from(err: TreeError) -> Self {
        crate::Error::Tree(err)
    }
}
