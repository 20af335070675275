//! Orphan resolution on delete.

use tracing::{debug, info, warn};

use super::{DepthScope, OrphanStrategy, Tree, TreeError, cascade::partial_cascade};
use crate::{
    Node, Result,
    path::{Ancestry, Uid},
};

impl Tree {
    /// Resolves the descendants of a record about to be deleted, according to
    /// the configured [`OrphanStrategy`].
    ///
    /// Does nothing for new records or when cascades are suppressed on `node`.
    ///
    /// # Errors
    /// `TreeError::HasDescendants` under `restrict` when the record has
    /// children; nothing is written in that case. `TreeError::PartialCascade`
    /// when a descendant write fails under `rootify` or `destroy`.
    pub async fn before_delete(&self, node: &Node) -> Result<()> {
        if !node.cascade_enabled() || node.is_new_record() {
            return Ok(());
        }
        let id = node.require_id()?;

        match self.config.orphan_strategy {
            OrphanStrategy::Restrict => {
                if self.has_children(node).await? {
                    return Err(TreeError::HasDescendants { id }.into());
                }
                Ok(())
            }
            OrphanStrategy::Rootify => self.rootify_descendants(node, id).await,
            OrphanStrategy::Destroy => self.destroy_descendants(node, id).await,
        }
    }

    /// Removes the deleted record's child path from every descendant, making
    /// direct children roots and promoting deeper records one level.
    async fn rootify_descendants(&self, node: &Node, id: Uid) -> Result<()> {
        let prefix = node.child_path()?;
        let descendants = self.load(&self.descendant_conditions(node)?, self.by_uid()).await?;
        let total = descendants.len();
        if total > 0 {
            info!(id, strategy = %OrphanStrategy::Rootify, descendants = total, "Resolving orphans");
        }

        let mut completed = 0;
        for mut descendant in descendants {
            let descendant_id = descendant.require_id()?;
            let Some(rest) = descendant.ancestry().and_then(|a| a.strip_prefix(&prefix)) else {
                warn!(id, descendant_id, "Descendant no longer under the deleted record; skipping");
                continue;
            };
            let remainder = Ancestry::from_ids(rest.to_vec());
            descendant.set_ancestry(remainder);
            self.cache_depth(&mut descendant);

            let set = descendant.tree_fields(&self.config);
            if let Err(source) = self.update(descendant_id, set).await {
                return Err(partial_cascade(id, descendant_id, completed, total, source));
            }
            completed += 1;
            debug!(id = descendant_id, ancestry = ?descendant.ancestry_value(), "Promoted orphan");
        }
        Ok(())
    }

    /// Deletes every descendant of the record.
    async fn destroy_descendants(&self, node: &Node, id: Uid) -> Result<()> {
        let ids = self.descendant_ids(node, DepthScope::all()).await?;
        let total = ids.len();
        if total > 0 {
            info!(id, strategy = %OrphanStrategy::Destroy, descendants = total, "Resolving orphans");
        }

        for (completed, descendant_id) in ids.into_iter().enumerate() {
            // Already gone is fine; only failures abort.
            if let Err(source) = self.store.delete_one(&self.uid_filter(descendant_id)).await {
                return Err(partial_cascade(id, descendant_id, completed, total, source));
            }
            debug!(id = descendant_id, "Destroyed orphan");
        }
        Ok(())
    }
}
