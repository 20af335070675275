//! Document storage for tree collections.
//!
//! This module provides the `DocumentStore` trait, the storage seam the tree
//! façade is written against, plus an in-memory implementation.
//!
//! A store holds one flat collection of schemaless JSON documents. The tree only
//! needs whole-document inserts, single-document field updates and deletes,
//! predicate queries with ordering and limits, counts, and unique indexes. Each
//! of those maps directly onto what common document databases offer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

mod errors;
mod filter;
mod in_memory;

pub use errors::StoreError;
pub use filter::{Comparison, Filter, compare_values};
pub use in_memory::InMemory;

/// A schemaless record: a JSON object keyed by field name.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Sort direction for [`Sort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Ordering of query results by a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    /// Smallest values first.
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    /// Largest values first.
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Options applied to a [`DocumentStore::find`] query.
///
/// Without a sort, results come back in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindOptions {
    pub sort: Option<Sort>,
    pub limit: Option<usize>,
    /// Restrict returned documents to these fields.
    pub projection: Option<Vec<String>>,
}

impl FindOptions {
    /// Options with only a sort order set.
    pub fn sorted(sort: Sort) -> Self {
        Self {
            sort: Some(sort),
            ..Self::default()
        }
    }

    /// Returns at most `limit` documents.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Keeps only the listed fields in each result.
    pub fn with_projection<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

/// Storage trait abstracting the document collection a tree lives in.
///
/// Implementations must be `Send` and `Sync` so a single store can back many
/// tree handles across tasks. None of the operations are transactional across
/// documents; each call reads or writes one consistent snapshot of the
/// collection at most.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Declares a unique index on `field`.
    ///
    /// Documents missing the field, or holding `null`, are not indexed. Fails with
    /// `StoreError::DuplicateKey` if existing documents already violate it.
    async fn ensure_unique_index(&self, field: &str) -> Result<()>;

    /// Inserts a new document.
    ///
    /// # Errors
    /// `StoreError::DuplicateKey` if a uniquely indexed field collides.
    async fn insert(&self, doc: Document) -> Result<()>;

    /// Returns every document matching `filter`, shaped by `options`.
    async fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<Document>>;

    /// Returns the first document matching `filter`, if any.
    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>> {
        let options = FindOptions::default().with_limit(1);
        Ok(self.find(filter, &options).await?.into_iter().next())
    }

    /// Counts documents matching `filter`.
    async fn count(&self, filter: &Filter) -> Result<usize>;

    /// Sets fields on the first document matching `filter`.
    ///
    /// Fields in `set` overwrite existing values; a `null` value removes the
    /// field. Returns whether a document matched.
    async fn update_one(&self, filter: &Filter, set: Document) -> Result<bool>;

    /// Deletes the first document matching `filter`. Returns whether one was removed.
    async fn delete_one(&self, filter: &Filter) -> Result<bool>;
}
