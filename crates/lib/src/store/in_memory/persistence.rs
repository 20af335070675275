//! Persistence operations for the InMemory store
//!
//! This module handles serialization and file I/O for saving/loading
//! the in-memory collection to/from JSON files.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::InMemory;
use crate::{
    Error, Result,
    store::{Document, StoreError},
};

/// The current persistence file format version.
const PERSISTENCE_VERSION: u8 = 0;

/// Helper to check if version is default (0) for serde skip_serializing_if
fn is_v0(v: &u8) -> bool {
    *v == 0
}

/// Serializable form of the InMemory store
#[derive(Serialize, Deserialize)]
struct SerializableCollection {
    /// File format version for compatibility checking
    #[serde(rename = "_v", default, skip_serializing_if = "is_v0")]
    version: u8,
    #[serde(default)]
    unique_fields: Vec<String>,
    #[serde(default)]
    documents: Vec<Document>,
}

pub(crate) async fn save_to_file<P: AsRef<Path>>(store: &InMemory, path: P) -> Result<()> {
    let serializable = SerializableCollection {
        version: PERSISTENCE_VERSION,
        unique_fields: store.unique_fields.read().await.clone(),
        documents: store.documents.read().await.clone(),
    };

    let json = serde_json::to_string_pretty(&serializable)
        .map_err(|e| -> Error { StoreError::SerializationFailed { source: e }.into() })?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| -> Error { StoreError::FileIo { source: e }.into() })
}

pub(crate) async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<InMemory> {
    let json = match tokio::fs::read_to_string(path).await {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(InMemory::new()),
        Err(e) => return Err(StoreError::FileIo { source: e }.into()),
    };

    let serializable: SerializableCollection = serde_json::from_str(&json)
        .map_err(|e| -> Error { StoreError::DeserializationFailed { source: e }.into() })?;
    if serializable.version != PERSISTENCE_VERSION {
        return Err(StoreError::UnsupportedVersion {
            version: serializable.version,
        }
        .into());
    }

    Ok(InMemory {
        unique_fields: RwLock::new(serializable.unique_fields),
        documents: RwLock::new(serializable.documents),
    })
}
