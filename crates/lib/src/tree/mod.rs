//!
//! The tree façade.
//!
//! `Tree` binds a [`DocumentStore`] collection to a [`TreeConfig`] and exposes
//! the tree lifecycle over it: saving nodes (id allocation, validation, move
//! cascades), deleting nodes (orphan resolution) and every relationship query.
//!
//! The lifecycle hooks are public as well (`before_validate`, `before_update`,
//! `before_delete`) for hosts that drive persistence themselves and only need
//! the tree bookkeeping around their own writes.
//!
//! Nothing here is transactional. Cascades write descendants one by one and
//! concurrent moves of the same subtree from two callers are not coordinated.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use handle_trait::Handle;
use tracing::debug;

use crate::{
    Node, Result,
    path::Uid,
    store::{Document, DocumentStore, Filter, FindOptions, Sort},
};

mod arrange;
mod cascade;
mod config;
mod errors;
mod integrity;
mod orphan;
mod queries;
mod scope;
mod uid;
mod validation;

pub use arrange::{Arranged, ArrangedNode};
pub use config::{OrphanStrategy, TreeConfig};
pub use errors::TreeError;
pub use scope::DepthScope;
pub use validation::{ValidationError, ValidationErrors};

/// A tree over one document collection.
///
/// This is a cheap-to-clone handle; clones share the store, the configuration
/// and the id high-water mark.
#[derive(Clone, Handle)]
pub struct Tree {
    store: Arc<dyn DocumentStore>,
    config: Arc<TreeConfig>,
    /// Highest id this handle has written, so ids are not reused after the
    /// current maximum is deleted.
    high_water: Arc<AtomicU64>,
}

impl std::fmt::Debug for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("store", &"<DocumentStore>")
            .field("config", &self.config)
            .field("high_water", &self.high_water.load(Ordering::Relaxed))
            .finish()
    }
}

impl Tree {
    /// Opens a tree over `store`.
    ///
    /// Validates the configuration and makes sure the store enforces unique ids.
    pub async fn open(store: Arc<dyn DocumentStore>, config: TreeConfig) -> Result<Self> {
        config.validate()?;
        store.ensure_unique_index(&config.uid_field).await?;
        debug!(
            uid_field = %config.uid_field,
            ancestry_field = %config.ancestry_field,
            orphan_strategy = %config.orphan_strategy,
            "Opened tree"
        );
        Ok(Self {
            store,
            config: Arc::new(config),
            high_water: Arc::new(AtomicU64::new(0)),
        })
    }

    /// The configuration this tree was opened with.
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// The underlying document store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Loads the record with `id`.
    ///
    /// # Errors
    /// `TreeError::NotFound` if no such record exists.
    pub async fn find(&self, id: Uid) -> Result<Node> {
        match self.store.find_one(&self.uid_filter(id)).await? {
            Some(doc) => Node::from_document(doc, &self.config),
            None => Err(TreeError::NotFound { id }.into()),
        }
    }

    /// Loads every record matching `filter`, ordered by id.
    pub async fn nodes(&self, filter: &Filter) -> Result<Vec<Node>> {
        self.load(filter, self.by_uid()).await
    }

    /// All root records, ordered by id.
    pub async fn roots(&self) -> Result<Vec<Node>> {
        self.nodes(&self.root_conditions()).await
    }

    /// Places `node` under the record with `parent_id`, or makes it a root.
    ///
    /// Like [`Node::set_parent`], this only assigns the ancestry; the move is
    /// cascaded when `node` is saved.
    pub async fn set_parent_id(&self, node: &mut Node, parent_id: Option<Uid>) -> Result<()> {
        match parent_id {
            Some(id) => {
                let parent = self.find(id).await?;
                node.set_parent(Some(&parent))
            }
            None => node.set_parent(None),
        }
    }

    /// Runs validation, recording the outcome on the node.
    ///
    /// Returns whether the node is valid.
    pub fn before_validate(&self, node: &mut Node) -> bool {
        let errors = validation::ancestry_excludes_self(node, &self.config.ancestry_field);
        let valid = errors.is_empty();
        node.set_errors(errors);
        valid
    }

    /// Saves a node.
    ///
    /// New nodes are inserted, allocating an id when none was assigned. Saved
    /// nodes whose ancestry changed first rewrite the ancestry of every
    /// descendant, unless cascades are suppressed on this instance.
    ///
    /// Returns `Ok(false)` without writing anything if validation fails; the
    /// failures are available from [`Node::errors`].
    ///
    /// # Errors
    /// Store failures, `TreeError::PartialCascade` when a descendant rewrite
    /// fails, or a duplicate key error once id allocation has been retried
    /// [`MAX_UID_ATTEMPTS`](crate::constants::MAX_UID_ATTEMPTS) times.
    pub async fn save(&self, node: &mut Node) -> Result<bool> {
        if !self.before_validate(node) {
            debug!(id = ?node.id(), errors = node.errors().len(), "Record failed validation");
            return Ok(false);
        }
        self.cache_depth(node);

        if node.is_new_record() {
            uid::insert(self, node).await?;
        } else {
            self.before_update(node).await?;
            let id = node.require_id()?;
            self.update(id, node.to_update(&self.config)).await?;
            debug!(id, ancestry = ?node.ancestry_value(), "Updated record");
        }

        node.mark_persisted();
        Ok(true)
    }

    /// Deletes a node, resolving its descendants per the orphan strategy first.
    ///
    /// Deleting a node that was never saved does nothing.
    ///
    /// # Errors
    /// `TreeError::HasDescendants` under the `restrict` strategy, leaving the
    /// collection unchanged; `TreeError::PartialCascade` when a descendant
    /// write fails; `TreeError::NotFound` if the record is already gone.
    pub async fn delete(&self, node: &mut Node) -> Result<()> {
        if node.is_new_record() {
            return Ok(());
        }
        self.before_delete(node).await?;

        let id = node.require_id()?;
        if !self.store.delete_one(&self.uid_filter(id)).await? {
            return Err(TreeError::NotFound { id }.into());
        }
        node.mark_destroyed();
        debug!(id, "Deleted record");
        Ok(())
    }

    pub(crate) fn uid_filter(&self, id: Uid) -> Filter {
        Filter::eq(&self.config.uid_field, id)
    }

    pub(crate) fn by_uid(&self) -> FindOptions {
        FindOptions::sorted(Sort::ascending(&self.config.uid_field))
    }

    /// Runs a query and decodes every result.
    pub(crate) async fn load(&self, filter: &Filter, options: FindOptions) -> Result<Vec<Node>> {
        self.store
            .find(filter, &options)
            .await?
            .into_iter()
            .map(|doc| Node::from_document(doc, &self.config))
            .collect()
    }

    /// Writes `set` to the record with `id`.
    pub(crate) async fn update(&self, id: Uid, set: Document) -> Result<()> {
        if self.store.update_one(&self.uid_filter(id), set).await? {
            Ok(())
        } else {
            Err(TreeError::NotFound { id }.into())
        }
    }

    /// Refreshes the depth cache when depth caching is enabled.
    pub(crate) fn cache_depth(&self, node: &mut Node) {
        if self.config.depth_cache_field.is_some() {
            node.set_depth_cache(Some(node.depth() as u64));
        }
    }

    /// Records an id as written by this handle.
    pub(crate) fn observe_uid(&self, id: Uid) {
        self.high_water.fetch_max(id, Ordering::Relaxed);
    }

    pub(crate) fn high_water(&self) -> Uid {
        self.high_water.load(Ordering::Relaxed)
    }
}
