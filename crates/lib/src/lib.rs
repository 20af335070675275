//!
//! Ancestry: materialized-path trees over flat document collections.
//!
//! Every record in a collection carries an *ancestry* value, the `/`-separated
//! ids of all of its ancestors ordered from the root down to its parent. Parent,
//! children, siblings, descendants, subtree, depth and root are all derived from
//! that single denormalized field using equality and prefix queries, without
//! recursive lookups.
//!
//! ## Core Concepts
//!
//! * **Ancestry (`path::Ancestry`)**: The decoded materialized path of a record.
//! * **Nodes (`node::Node`)**: A record of the collection with its tree fields,
//!   caller-defined extension fields and change tracking.
//! * **Document stores (`store::DocumentStore`)**: The pluggable storage seam. The
//!   crate ships an in-memory implementation (`store::InMemory`).
//! * **Trees (`tree::Tree`)**: The façade that allocates ids, validates paths,
//!   runs relationship queries, cascades moves to descendants and resolves
//!   orphans on delete.

pub mod constants;
pub mod node;
pub mod path;
pub mod store;
pub mod tree;

pub use node::{CascadeGuard, Node};
pub use path::{Ancestry, Uid};
pub use store::{Document, DocumentStore, Filter, InMemory};
pub use tree::{Arranged, DepthScope, OrphanStrategy, Tree, TreeConfig};

/// Result type used throughout the Ancestry library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Ancestry library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured path encoding errors from the path module
    #[error(transparent)]
    Path(path::PathError),

    /// Structured storage errors from the store module
    #[error(transparent)]
    Store(store::StoreError),

    /// Structured tree errors from the tree module
    #[error(transparent)]
    Tree(tree::TreeError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Path(_) => "path",
            Error::Store(_) => "store",
            Error::Tree(_) => "tree",
        }
    }

    /// Check if this error indicates a record was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Tree(tree_err) => tree_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error is a unique index violation on any field.
    pub fn is_duplicate_key(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_duplicate_key(),
            _ => false,
        }
    }

    /// Check if this error is a unique index violation on `field`.
    ///
    /// This is the only failure the id allocator retries.
    pub fn is_duplicate_key_on(&self, field: &str) -> bool {
        match self {
            Error::Store(store_err) => store_err.duplicate_field() == Some(field),
            _ => false,
        }
    }

    /// Check if this error was raised for a record that has never been saved.
    pub fn is_unpersisted_record(&self) -> bool {
        match self {
            Error::Tree(tree_err) => tree_err.is_unpersisted_record(),
            _ => false,
        }
    }

    /// Check if this error is the `restrict` orphan strategy refusing a delete.
    pub fn is_has_descendants(&self) -> bool {
        match self {
            Error::Tree(tree_err) => tree_err.is_has_descendants(),
            _ => false,
        }
    }

    /// Check if this error interrupted a cascade after some descendants were written.
    pub fn is_partial_cascade(&self) -> bool {
        match self {
            Error::Tree(tree_err) => tree_err.is_partial_cascade(),
            _ => false,
        }
    }

    /// Check if id allocation ran out of ids.
    pub fn is_id_space_exhausted(&self) -> bool {
        match self {
            Error::Tree(tree_err) => tree_err.is_id_space_exhausted(),
            _ => false,
        }
    }

    /// Check if this error indicates malformed or inconsistent tree data.
    pub fn is_integrity_error(&self) -> bool {
        match self {
            Error::Path(_) => true,
            Error::Tree(tree_err) => tree_err.is_integrity_error(),
            _ => false,
        }
    }

    /// Check if this error is configuration-related.
    pub fn is_config_error(&self) -> bool {
        match self {
            Error::Tree(tree_err) => tree_err.is_config_error(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_io_error(),
            _ => false,
        }
    }

    /// Check if this error is storage-related.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Error::Store(_))
    }
}
