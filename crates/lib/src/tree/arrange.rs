//! Nesting flat query results into a forest.

use std::collections::BTreeMap;

use super::{DepthScope, Tree};
use crate::{Node, Result, path::Uid, store::Filter};

/// A forest of records keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Arranged(BTreeMap<Uid, ArrangedNode>);

/// One record of an [`Arranged`] forest together with its arranged children.
#[derive(Debug, Clone)]
pub struct ArrangedNode {
    pub node: Node,
    pub children: Arranged,
}

impl Arranged {
    /// Nests `nodes` under their nearest ancestor present in the same set.
    ///
    /// Records whose ancestors are all missing from `nodes` become top-level
    /// entries.
    pub fn from_nodes(mut nodes: Vec<Node>) -> Self {
        nodes.sort_by_key(|n| (n.depth(), n.id()));
        let mut forest = Self::default();
        for node in nodes {
            if let Some(id) = node.id() {
                let ancestors = node.ancestor_ids().to_vec();
                forest.insert(&ancestors, id, node);
            }
        }
        forest
    }

    fn insert(&mut self, ancestors: &[Uid], id: Uid, node: Node) {
        let nearest = ancestors
            .iter()
            .position(|ancestor| self.0.contains_key(ancestor));
        if let Some(i) = nearest
            && let Some(entry) = self.0.get_mut(&ancestors[i])
        {
            entry.children.insert(&ancestors[i + 1..], id, node);
            return;
        }
        self.0.insert(
            id,
            ArrangedNode {
                node,
                children: Arranged::default(),
            },
        );
    }

    /// The top-level entry for `id`, if any.
    pub fn get(&self, id: Uid) -> Option<&ArrangedNode> {
        self.0.get(&id)
    }

    /// Top-level ids, ascending.
    pub fn ids(&self) -> impl Iterator<Item = Uid> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArrangedNode> {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total records in the forest at every level.
    pub fn total(&self) -> usize {
        self.0.values().map(|entry| 1 + entry.children.total()).sum()
    }
}

impl Tree {
    /// Loads the records matching `filter` and nests them into a forest.
    pub async fn arrange(&self, filter: &Filter) -> Result<Arranged> {
        Ok(Arranged::from_nodes(self.nodes(filter).await?))
    }

    /// The subtree of `node` as a forest with `node` as its only top-level entry.
    pub async fn arrange_subtree(&self, node: &Node) -> Result<Arranged> {
        Ok(Arranged::from_nodes(self.subtree(node, DepthScope::all()).await?))
    }
}
