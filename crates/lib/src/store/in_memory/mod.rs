//! In-memory document store implementation
//!
//! This module provides an in-memory implementation of the DocumentStore trait,
//! suitable for testing, development, or scenarios where data persistence
//! is not strictly required or is handled externally.

mod persistence;

use std::cmp::Ordering;
use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Document, DocumentStore, Filter, FindOptions, SortDirection, StoreError};
use crate::Result;

/// A simple in-memory document collection.
///
/// Documents are kept in insertion order in a `Vec`, which is also the order
/// unsorted queries return them in. Every query is a full scan.
///
/// It provides basic persistence capabilities via `save_to_file` and
/// `load_from_file`, serializing the collection to JSON.
#[derive(Debug, Default)]
pub struct InMemory {
    /// Fields carrying a unique index. Always locked before `documents`.
    pub(crate) unique_fields: RwLock<Vec<String>>,
    /// Documents in insertion order
    pub(crate) documents: RwLock<Vec<Document>>,
}

impl InMemory {
    /// Creates a new, empty `InMemory` store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Whether the collection holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// A copy of every stored document in insertion order.
    pub async fn all_documents(&self) -> Vec<Document> {
        self.documents.read().await.clone()
    }

    /// Saves the entire collection to a specified file as JSON.
    ///
    /// # Returns
    /// A `Result` indicating success or an I/O or serialization error.
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persistence::save_to_file(self, path).await
    }

    /// Loads a collection from a specified JSON file.
    ///
    /// If the file does not exist, a new, empty `InMemory` store is returned.
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        persistence::load_from_file(path).await
    }
}

/// Finds a stored document, other than the one at `skip`, that holds `value` in `field`.
fn find_conflict(
    documents: &[Document],
    field: &str,
    value: &Value,
    skip: Option<usize>,
) -> Option<usize> {
    if value.is_null() {
        return None;
    }
    documents
        .iter()
        .enumerate()
        .find(|(i, doc)| Some(*i) != skip && doc.get(field) == Some(value))
        .map(|(i, _)| i)
}

fn check_unique(
    unique_fields: &[String],
    documents: &[Document],
    candidate: &Document,
    skip: Option<usize>,
) -> Result<()> {
    for field in unique_fields {
        if let Some(value) = candidate.get(field)
            && find_conflict(documents, field, value, skip).is_some()
        {
            return Err(StoreError::DuplicateKey {
                field: field.clone(),
                value: value.clone(),
            }
            .into());
        }
    }
    Ok(())
}

/// Ordering used by sorted queries. Missing and null values sort first.
fn sort_key_cmp(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => super::compare_values(a, b).unwrap_or(Ordering::Equal),
    }
}

fn project(doc: &Document, fields: &[String]) -> Document {
    fields
        .iter()
        .filter_map(|f| doc.get(f).map(|v| (f.clone(), v.clone())))
        .collect()
}

#[async_trait]
impl DocumentStore for InMemory {
    async fn ensure_unique_index(&self, field: &str) -> Result<()> {
        let mut unique_fields = self.unique_fields.write().await;
        if unique_fields.iter().any(|f| f == field) {
            return Ok(());
        }

        let documents = self.documents.read().await;
        for (i, doc) in documents.iter().enumerate() {
            if let Some(value) = doc.get(field)
                && find_conflict(&documents, field, value, Some(i)).is_some()
            {
                return Err(StoreError::DuplicateKey {
                    field: field.to_string(),
                    value: value.clone(),
                }
                .into());
            }
        }

        unique_fields.push(field.to_string());
        Ok(())
    }

    async fn insert(&self, doc: Document) -> Result<()> {
        let unique_fields = self.unique_fields.read().await;
        let mut documents = self.documents.write().await;
        check_unique(&unique_fields, &documents, &doc, None)?;
        documents.push(doc);
        Ok(())
    }

    async fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<Document>> {
        let documents = self.documents.read().await;
        let mut found: Vec<&Document> = documents.iter().filter(|d| filter.matches(d)).collect();

        if let Some(sort) = &options.sort {
            found.sort_by(|a, b| {
                let ordering = sort_key_cmp(a.get(&sort.field), b.get(&sort.field));
                match sort.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        let limit = options.limit.unwrap_or(usize::MAX);
        Ok(found
            .into_iter()
            .take(limit)
            .map(|doc| match &options.projection {
                Some(fields) => project(doc, fields),
                None => doc.clone(),
            })
            .collect())
    }

    async fn count(&self, filter: &Filter) -> Result<usize> {
        let documents = self.documents.read().await;
        Ok(documents.iter().filter(|d| filter.matches(d)).count())
    }

    async fn update_one(&self, filter: &Filter, set: Document) -> Result<bool> {
        let unique_fields = self.unique_fields.read().await;
        let mut documents = self.documents.write().await;
        let Some(index) = documents.iter().position(|d| filter.matches(d)) else {
            return Ok(false);
        };

        let mut updated = documents[index].clone();
        for (field, value) in set {
            if value.is_null() {
                updated.remove(&field);
            } else {
                updated.insert(field, value);
            }
        }
        check_unique(&unique_fields, &documents, &updated, Some(index))?;
        documents[index] = updated;
        Ok(true)
    }

    async fn delete_one(&self, filter: &Filter) -> Result<bool> {
        let mut documents = self.documents.write().await;
        match documents.iter().position(|d| filter.matches(d)) {
            Some(index) => {
                documents.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
