//! Whole-collection integrity checks and repairs.

use std::collections::HashMap;

use tracing::{info, warn};

use super::{Tree, TreeError};
use crate::{
    Node, Result,
    path::{self, Uid},
    store::Filter,
};

impl Tree {
    /// Checks every record of the collection against the tree invariants.
    ///
    /// Reports, in one error, records whose document cannot be decoded, whose
    /// ancestry contains their own id or a missing record, whose ancestry
    /// differs from their parent's child path, and whose depth cache
    /// disagrees with their ancestry.
    ///
    /// # Errors
    /// `TreeError::Integrity` listing every problem found, or a store error.
    pub async fn check_integrity(&self) -> Result<()> {
        let docs = self.store.find(&Filter::All, &self.by_uid()).await?;
        let mut problems = Vec::new();
        let mut nodes: HashMap<Uid, Node> = HashMap::with_capacity(docs.len());
        for doc in docs {
            match Node::from_document(doc, &self.config) {
                Ok(node) => {
                    if let Some(id) = node.id() {
                        nodes.insert(id, node);
                    }
                }
                Err(err) => problems.push(err.to_string()),
            }
        }

        let mut ids: Vec<Uid> = nodes.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            let Some(node) = nodes.get(&id) else { continue };
            problems.extend(self.problems_of(id, node, &nodes));
        }

        if problems.is_empty() {
            return Ok(());
        }
        warn!(problems = problems.len(), "Tree integrity check failed");
        Err(TreeError::Integrity { problems }.into())
    }

    fn problems_of(&self, id: Uid, node: &Node, nodes: &HashMap<Uid, Node>) -> Vec<String> {
        let mut problems = Vec::new();
        if let Some(ancestry) = node.ancestry() {
            if ancestry.contains(id) {
                problems.push(format!("Record {id} is its own ancestor ({ancestry})"));
            }
            for ancestor in ancestry.ids().iter().filter(|a| !nodes.contains_key(*a)) {
                problems.push(format!("Record {id} references missing ancestor {ancestor}"));
            }
            if let Some(parent) = nodes.get(&ancestry.parent_id()) {
                let expected = path::child_path(parent.ancestry(), ancestry.parent_id());
                if &expected != ancestry {
                    problems.push(format!(
                        "Record {id} has ancestry {ancestry} but its parent's child path is {expected}"
                    ));
                }
            }
        }
        if self.config.depth_cache_field.is_some() {
            let depth = node.depth() as u64;
            if node.depth_cache() != Some(depth) {
                problems.push(format!(
                    "Record {id} caches depth {:?} but has depth {depth}",
                    node.depth_cache()
                ));
            }
        }
        problems
    }

    /// Rewrites the depth cache of every record whose cached value is stale.
    ///
    /// Returns the number of records written.
    ///
    /// # Errors
    /// `TreeError::InvalidConfig` when no depth cache field is configured.
    pub async fn rebuild_depth_cache(&self) -> Result<usize> {
        if self.config.depth_cache_field.is_none() {
            return Err(TreeError::InvalidConfig {
                reason: "no depth cache field is configured".to_string(),
            }
            .into());
        }

        let mut rewritten = 0;
        for mut node in self.nodes(&Filter::All).await? {
            let depth = node.depth() as u64;
            if node.depth_cache() == Some(depth) {
                continue;
            }
            node.set_depth_cache(Some(depth));
            let id = node.require_id()?;
            self.update(id, node.tree_fields(&self.config)).await?;
            rewritten += 1;
        }
        info!(rewritten, "Rebuilt depth cache");
        Ok(rewritten)
    }
}
