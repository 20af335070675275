//! Record id allocation.
//!
//! Ids come from the current maximum of the collection plus one. Reading the
//! maximum and inserting are two separate store calls, so two concurrent
//! inserts can pick the same id; the store's unique index rejects the second
//! and the insert is retried with a freshly allocated id.

use serde_json::Value;
use tracing::{debug, warn};

use super::{Tree, TreeError};
use crate::{
    Node, Result,
    constants::{FIRST_UID, MAX_UID_ATTEMPTS},
    path::Uid,
    store::{Filter, FindOptions, Sort},
};

/// Computes the next unused id.
///
/// The larger of the collection maximum and the highest id this handle has
/// written wins, so deleting the newest record does not free its id for reuse
/// within this process.
pub(crate) async fn allocate(tree: &Tree) -> Result<Uid> {
    let uid_field = &tree.config.uid_field;
    let options = FindOptions::sorted(Sort::descending(uid_field))
        .with_limit(1)
        .with_projection([uid_field.as_str()]);
    let previous = match tree.store.find(&Filter::All, &options).await?.first() {
        None => None,
        Some(doc) => match doc.get(uid_field) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value.as_u64().ok_or_else(|| TreeError::InvalidDocument {
                reason: format!("field '{uid_field}' holds a non-integer id: {value}"),
            })?),
        },
    };

    let previous = previous.unwrap_or(0).max(tree.high_water());
    if previous == 0 {
        return Ok(FIRST_UID);
    }
    previous
        .checked_add(1)
        .ok_or_else(|| TreeError::IdSpaceExhausted { last: previous }.into())
}

/// Inserts a new node, allocating its id if it has none.
///
/// Only allocated ids are retried: a caller-chosen id that collides fails
/// straight away. On failure an allocated id is cleared again so a later save
/// allocates afresh.
pub(crate) async fn insert(tree: &Tree, node: &mut Node) -> Result<()> {
    let allocating = node.id().is_none();
    let mut attempt = 1;

    loop {
        if allocating {
            let id = allocate(tree).await?;
            node.set_id(id);
            debug!(id, attempt, "Allocated record id");
        }

        let err = match tree.store.insert(node.to_document(&tree.config)).await {
            Ok(()) => {
                let id = node.require_id()?;
                tree.observe_uid(id);
                debug!(id, ancestry = ?node.ancestry_value(), "Inserted record");
                return Ok(());
            }
            Err(err) => err,
        };

        let retry = allocating
            && attempt < MAX_UID_ATTEMPTS
            && err.is_duplicate_key_on(&tree.config.uid_field);
        if !retry {
            if allocating {
                node.clear_id();
            }
            return Err(err);
        }

        warn!(
            id = ?node.id(),
            attempt,
            "Record id taken by a concurrent insert; allocating again"
        );
        attempt += 1;
    }
}
