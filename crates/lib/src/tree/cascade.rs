//! Move cascades.
//!
//! When a saved record changes ancestry, every descendant still references the
//! record's old child path. The cascade snapshots those descendants once and
//! swaps the old prefix for the new one on each of them.

use tracing::{debug, info, warn};

use super::{Tree, TreeError};
use crate::{Error, Node, Result, path, path::Uid};

impl Tree {
    /// Rewrites the ancestry of every descendant of a record that moved.
    ///
    /// Does nothing for new records, unchanged ancestry, invalid records or
    /// when cascades are suppressed on `node`. Descendant writes touch only the
    /// tree fields and never cascade further themselves.
    ///
    /// # Errors
    /// `TreeError::PartialCascade` if a descendant write fails. Descendants
    /// written before the failure keep their new ancestry.
    pub async fn before_update(&self, node: &Node) -> Result<()> {
        if !node.cascade_enabled()
            || node.is_new_record()
            || !node.ancestry_changed()
            || !node.is_valid()
        {
            return Ok(());
        }

        let id = node.require_id()?;
        let old_prefix = node.child_path()?;
        let new_prefix = path::child_path(node.ancestry(), id);
        let descendants = self.load(&self.descendant_conditions(node)?, self.by_uid()).await?;
        let total = descendants.len();
        if total == 0 {
            return Ok(());
        }
        info!(
            id,
            old_prefix = %old_prefix,
            new_prefix = %new_prefix,
            descendants = total,
            "Moving subtree"
        );

        let mut completed = 0;
        for mut descendant in descendants {
            let descendant_id = descendant.require_id()?;
            let Some(moved) = descendant
                .ancestry()
                .and_then(|a| a.replace_prefix(&old_prefix, &new_prefix))
            else {
                warn!(id, descendant_id, "Descendant no longer under the moved record; skipping");
                continue;
            };

            descendant.set_ancestry(Some(moved));
            self.cache_depth(&mut descendant);
            let set = descendant.tree_fields(&self.config);
            if let Err(source) = self.update(descendant_id, set).await {
                return Err(partial_cascade(id, descendant_id, completed, total, source));
            }
            completed += 1;
            debug!(id = descendant_id, ancestry = ?descendant.ancestry_value(), "Rewrote descendant");
        }
        Ok(())
    }
}

/// Wraps the failure of one descendant write in a cascade from `id`.
pub(crate) fn partial_cascade(
    id: Uid,
    failed_id: Uid,
    completed: usize,
    total: usize,
    source: Error,
) -> Error {
    warn!(id, failed_id, completed, total, error = %source, "Cascade failed partway");
    TreeError::PartialCascade {
        id,
        failed_id,
        completed,
        total,
        source: Box::new(source),
    }
    .into()
}
