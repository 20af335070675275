//! Relationship queries.
//!
//! Every relationship is a [`Filter`] over the ancestry field built from the
//! record's decoded path and id, executed against the store. Results are
//! ordered by id.

use super::{DepthScope, Tree};
use crate::{
    Node, Result,
    path::Uid,
    store::{Filter, FindOptions},
};

impl Tree {
    /// Records whose ancestry is exactly this record's child path.
    pub fn child_conditions(&self, node: &Node) -> Result<Filter> {
        Ok(Filter::eq(
            &self.config.ancestry_field,
            node.child_path()?.encode(),
        ))
    }

    /// Records sharing this record's ancestry, including the record itself.
    pub fn sibling_conditions(&self, node: &Node) -> Filter {
        match node.ancestry_value() {
            Some(ancestry) => Filter::eq(&self.config.ancestry_field, ancestry),
            None => self.root_conditions(),
        }
    }

    /// Root records: ancestry missing, null or empty.
    pub fn root_conditions(&self) -> Filter {
        let field = &self.config.ancestry_field;
        Filter::Or(vec![Filter::is_null(field), Filter::eq(field, "")])
    }

    /// Records below this one at any depth.
    ///
    /// Direct children carry the child path itself, deeper records a proper
    /// extension of it, hence the two clauses.
    pub fn descendant_conditions(&self, node: &Node) -> Result<Filter> {
        Ok(Filter::Or(self.below(node)?))
    }

    /// This record and its descendants.
    pub fn subtree_conditions(&self, node: &Node) -> Result<Filter> {
        let mut clauses = vec![self.uid_filter(node.require_id()?)];
        clauses.extend(self.below(node)?);
        Ok(Filter::Or(clauses))
    }

    /// The records listed in this record's ancestry.
    pub fn ancestor_conditions(&self, node: &Node) -> Filter {
        Filter::in_values(&self.config.uid_field, node.ancestor_ids().iter().copied())
    }

    /// The ancestors and the record itself.
    pub fn path_conditions(&self, node: &Node) -> Filter {
        Filter::in_values(&self.config.uid_field, node.path_ids())
    }

    fn below(&self, node: &Node) -> Result<Vec<Filter>> {
        let child_path = node.child_path()?.encode();
        let field = &self.config.ancestry_field;
        Ok(vec![
            Filter::prefix(field, format!("{child_path}/")),
            Filter::eq(field, child_path),
        ])
    }

    /// Runs a relationship query restricted to `scope`.
    ///
    /// With a depth cache field the bounds go to the store. Without one every
    /// candidate is loaded and its depth taken from its decoded ancestry.
    pub(crate) async fn scoped(&self, filter: Filter, scope: DepthScope) -> Result<Vec<Node>> {
        if scope.is_unbounded() {
            return self.load(&filter, self.by_uid()).await;
        }
        match &self.config.depth_cache_field {
            Some(depth_field) => {
                let filter = filter.and(scope.to_filter(depth_field));
                self.load(&filter, self.by_uid()).await
            }
            None => {
                let mut nodes = self.load(&filter, self.by_uid()).await?;
                nodes.retain(|n| scope.matches(n.depth() as u64));
                Ok(nodes)
            }
        }
    }

    /// Ancestors, root first.
    ///
    /// Ordered by position in the ancestry rather than by id, so a record moved
    /// under a newer parent still lists its root first.
    pub async fn ancestors(&self, node: &Node, scope: DepthScope) -> Result<Vec<Node>> {
        let nodes = self.scoped(self.ancestor_conditions(node), scope).await?;
        Ok(in_path_order(nodes, node.ancestor_ids()))
    }

    /// Ancestors followed by the record itself, as stored.
    pub async fn path(&self, node: &Node, scope: DepthScope) -> Result<Vec<Node>> {
        let nodes = self.scoped(self.path_conditions(node), scope).await?;
        Ok(in_path_order(nodes, &node.path_ids()))
    }

    /// The parent record, or `None` for a root.
    pub async fn parent(&self, node: &Node) -> Result<Option<Node>> {
        match node.parent_id() {
            Some(id) => self.find(id).await.map(Some),
            None => Ok(None),
        }
    }

    /// The root of this record's tree; a root is its own root.
    pub async fn root(&self, node: &Node) -> Result<Node> {
        match node.ancestry() {
            Some(ancestry) => self.find(ancestry.root_id()).await,
            None => Ok(node.clone()),
        }
    }

    /// Direct children, ordered by id.
    pub async fn children(&self, node: &Node, scope: DepthScope) -> Result<Vec<Node>> {
        self.scoped(self.child_conditions(node)?, scope).await
    }

    /// Ids of the direct children.
    pub async fn child_ids(&self, node: &Node) -> Result<Vec<Uid>> {
        self.ids(&self.child_conditions(node)?).await
    }

    /// Whether any record lists this one as its parent.
    pub async fn has_children(&self, node: &Node) -> Result<bool> {
        Ok(self.store.count(&self.child_conditions(node)?).await? > 0)
    }

    /// Negation of [`Tree::has_children`].
    pub async fn is_childless(&self, node: &Node) -> Result<bool> {
        Ok(!self.has_children(node).await?)
    }

    /// Records with the same parent, this one included.
    pub async fn siblings(&self, node: &Node, scope: DepthScope) -> Result<Vec<Node>> {
        self.scoped(self.sibling_conditions(node), scope).await
    }

    /// Ids of the siblings, this record included.
    pub async fn sibling_ids(&self, node: &Node) -> Result<Vec<Uid>> {
        self.ids(&self.sibling_conditions(node)).await
    }

    /// Whether any other record shares this record's ancestry.
    pub async fn has_siblings(&self, node: &Node) -> Result<bool> {
        Ok(self.store.count(&self.sibling_conditions(node)).await? > 1)
    }

    /// Negation of [`Tree::has_siblings`].
    pub async fn is_only_child(&self, node: &Node) -> Result<bool> {
        Ok(!self.has_siblings(node).await?)
    }

    /// Every record below this one, ordered by id.
    pub async fn descendants(&self, node: &Node, scope: DepthScope) -> Result<Vec<Node>> {
        self.scoped(self.descendant_conditions(node)?, scope).await
    }

    /// Ids of every record below this one.
    pub async fn descendant_ids(&self, node: &Node, scope: DepthScope) -> Result<Vec<Uid>> {
        let nodes = self.descendants(node, scope).await?;
        Ok(nodes.iter().filter_map(Node::id).collect())
    }

    /// This record and its descendants, ordered by id.
    pub async fn subtree(&self, node: &Node, scope: DepthScope) -> Result<Vec<Node>> {
        self.scoped(self.subtree_conditions(node)?, scope).await
    }

    /// Ids of this record and its descendants.
    pub async fn subtree_ids(&self, node: &Node, scope: DepthScope) -> Result<Vec<Uid>> {
        let nodes = self.subtree(node, scope).await?;
        Ok(nodes.iter().filter_map(Node::id).collect())
    }

    /// Ids of every match, fetching only the id field.
    async fn ids(&self, filter: &Filter) -> Result<Vec<Uid>> {
        let uid_field = &self.config.uid_field;
        let options: FindOptions = self.by_uid().with_projection([uid_field.as_str()]);
        let docs = self.store.find(filter, &options).await?;
        Ok(docs
            .iter()
            .filter_map(|doc| doc.get(uid_field).and_then(|v| v.as_u64()))
            .collect())
    }
}

/// Orders `nodes` by the position of their ids in `ids`.
fn in_path_order(mut nodes: Vec<Node>, ids: &[Uid]) -> Vec<Node> {
    nodes.sort_by_key(|n| {
        n.id()
            .and_then(|id| ids.iter().position(|&x| x == id))
            .unwrap_or(usize::MAX)
    });
    nodes
}
