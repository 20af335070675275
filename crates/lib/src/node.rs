//! Tree records.
//!
//! A [`Node`] is one document of a tree collection seen through the tree's
//! fields: its id, its ancestry and the optional depth cache. Every other
//! document field is carried untouched in [`Node::fields`].
//!
//! Nodes track the ancestry value they were last loaded or saved with, so a
//! save can tell whether the record moved and which path its existing
//! descendants still reference.

use std::ops::{Deref, DerefMut};

use serde_json::Value;

use crate::{
    Result,
    path::{self, Ancestry, Uid},
    store::Document,
    tree::{TreeConfig, TreeError, ValidationErrors},
};

/// A record of a tree collection.
#[derive(Debug, Clone, Default)]
pub struct Node {
    id: Option<Uid>,
    ancestry: Option<Ancestry>,
    depth_cache: Option<u64>,
    fields: Document,
    persisted: bool,
    destroyed: bool,
    /// Ancestry as of the last load or save; what children currently reference.
    ancestry_was: Option<Ancestry>,
    errors: ValidationErrors,
    cascade_suppressed: bool,
}

impl Node {
    /// Creates a new root record with no id. The id is allocated on first save.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new record with a caller-chosen id instead of an allocated one.
    pub fn with_id(id: Uid) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Builder-style variant of [`Node::set_field`].
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_field(name, value);
        self
    }

    /// The record id, `None` until assigned or allocated.
    pub fn id(&self) -> Option<Uid> {
        self.id
    }

    /// The id, or `TreeError::UnpersistedRecord` for records that never had one.
    pub fn require_id(&self) -> Result<Uid> {
        self.id.ok_or_else(|| {
            TreeError::UnpersistedRecord {
                operation: "id lookup",
            }
            .into()
        })
    }

    /// The pending ancestry, `None` for a root.
    pub fn ancestry(&self) -> Option<&Ancestry> {
        self.ancestry.as_ref()
    }

    /// The ancestry in its stored string form.
    pub fn ancestry_value(&self) -> Option<String> {
        self.ancestry.as_ref().map(Ancestry::encode)
    }

    /// The ancestry as of the last load or save.
    pub fn ancestry_was(&self) -> Option<&Ancestry> {
        self.ancestry_was.as_ref()
    }

    /// Whether the ancestry differs from the value last loaded or saved.
    pub fn ancestry_changed(&self) -> bool {
        self.ancestry != self.ancestry_was
    }

    /// The depth cache value as last loaded or written.
    pub fn depth_cache(&self) -> Option<u64> {
        self.depth_cache
    }

    /// Caller-defined fields, excluding the tree's own fields.
    pub fn fields(&self) -> &Document {
        &self.fields
    }

    /// Mutable access to the extension fields.
    pub fn fields_mut(&mut self) -> &mut Document {
        &mut self.fields
    }

    /// A single extension field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Sets an extension field, replacing any previous value.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// True until the record has been saved once.
    pub fn is_new_record(&self) -> bool {
        !self.persisted
    }

    /// True once the record has been deleted through the tree.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Ancestor ids, root first. Empty for roots.
    pub fn ancestor_ids(&self) -> &[Uid] {
        self.ancestry.as_ref().map(Ancestry::ids).unwrap_or(&[])
    }

    /// Ancestor ids followed by this record's own id.
    pub fn path_ids(&self) -> Vec<Uid> {
        let mut ids = self.ancestor_ids().to_vec();
        ids.extend(self.id);
        ids
    }

    /// Number of ancestors. Zero for roots.
    pub fn depth(&self) -> usize {
        self.ancestor_ids().len()
    }

    /// The last id of the ancestry, `None` for a root.
    pub fn parent_id(&self) -> Option<Uid> {
        self.ancestry.as_ref().map(Ancestry::parent_id)
    }

    /// The first ancestor, or the record itself for roots.
    pub fn root_id(&self) -> Option<Uid> {
        match &self.ancestry {
            Some(ancestry) => Some(ancestry.root_id()),
            None => self.id,
        }
    }

    /// True when the ancestry is absent or empty.
    pub fn is_root(&self) -> bool {
        self.ancestry.is_none()
    }

    /// The ancestry value this record's children carry.
    ///
    /// Built from the ancestry as last persisted, not from a pending change, since
    /// it names the value existing children already reference.
    ///
    /// # Errors
    /// `TreeError::UnpersistedRecord` for records that have not been saved yet.
    pub fn child_path(&self) -> Result<Ancestry> {
        if !self.persisted {
            return Err(TreeError::UnpersistedRecord {
                operation: "child path",
            }
            .into());
        }
        let id = self.require_id()?;
        Ok(path::child_path(self.ancestry_was.as_ref(), id))
    }

    /// Places this record under `parent`, or makes it a root for `None`.
    ///
    /// Only the ancestry value changes here; descendants are rewritten when the
    /// record is saved.
    pub fn set_parent(&mut self, parent: Option<&Node>) -> Result<()> {
        self.ancestry = match parent {
            Some(parent) => Some(parent.child_path()?),
            None => None,
        };
        Ok(())
    }

    /// Validation errors from the last save attempt.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// True when the last validation found no errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether saves and deletes of this instance run move cascades and orphan resolution.
    pub fn cascade_enabled(&self) -> bool {
        !self.cascade_suppressed
    }

    /// Disables cascades for this instance until the returned guard is dropped.
    ///
    /// The previous setting is restored on every exit path, including early
    /// returns through `?` and panics.
    pub fn suppress_cascade(&mut self) -> CascadeGuard<'_> {
        let previous = self.cascade_suppressed;
        self.cascade_suppressed = true;
        CascadeGuard {
            node: self,
            previous,
        }
    }

    pub(crate) fn set_id(&mut self, id: Uid) {
        self.id = Some(id);
    }

    pub(crate) fn clear_id(&mut self) {
        self.id = None;
    }

    pub(crate) fn set_ancestry(&mut self, ancestry: Option<Ancestry>) {
        self.ancestry = ancestry;
    }

    pub(crate) fn set_depth_cache(&mut self, depth: Option<u64>) {
        self.depth_cache = depth;
    }

    pub(crate) fn set_errors(&mut self, errors: ValidationErrors) {
        self.errors = errors;
    }

    /// Records the current tree fields as the persisted state.
    pub(crate) fn mark_persisted(&mut self) {
        self.persisted = true;
        self.ancestry_was = self.ancestry.clone();
    }

    pub(crate) fn mark_destroyed(&mut self) {
        self.destroyed = true;
    }

    /// Decodes a stored document using the tree's field names.
    pub(crate) fn from_document(mut doc: Document, config: &TreeConfig) -> Result<Self> {
        let id = match doc.remove(&config.uid_field) {
            Some(Value::Number(n)) => n.as_u64(),
            _ => None,
        }
        .ok_or_else(|| TreeError::InvalidDocument {
            reason: format!("field '{}' is not a non-negative integer", config.uid_field),
        })?;

        let ancestry = match doc.remove(&config.ancestry_field) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Ancestry::parse(Some(&s))?,
            Some(other) => {
                return Err(TreeError::InvalidDocument {
                    reason: format!(
                        "field '{}' of record {id} is not a string: {other}",
                        config.ancestry_field
                    ),
                }
                .into());
            }
        };

        let depth_cache = match &config.depth_cache_field {
            Some(field) => doc.remove(field).and_then(|v| v.as_u64()),
            None => None,
        };

        Ok(Self {
            id: Some(id),
            ancestry_was: ancestry.clone(),
            ancestry,
            depth_cache,
            fields: doc,
            persisted: true,
            destroyed: false,
            errors: ValidationErrors::default(),
            cascade_suppressed: false,
        })
    }

    /// The full document for an insert. Absent tree fields are left out.
    pub(crate) fn to_document(&self, config: &TreeConfig) -> Document {
        let mut doc = self.fields.clone();
        doc.extend(self.tree_fields(config).into_iter().filter(|(_, v)| !v.is_null()));
        doc
    }

    /// The fields written by an update. Absent tree fields are sent as `null`,
    /// which removes them from the stored document.
    pub(crate) fn to_update(&self, config: &TreeConfig) -> Document {
        let mut doc = self.fields.clone();
        doc.extend(self.tree_fields(config));
        doc
    }

    /// The tree's own fields only, absent values as `null`.
    pub(crate) fn tree_fields(&self, config: &TreeConfig) -> Document {
        let mut doc = Document::new();
        if let Some(id) = self.id {
            doc.insert(config.uid_field.clone(), Value::from(id));
        }
        doc.insert(
            config.ancestry_field.clone(),
            self.ancestry_value().map_or(Value::Null, Value::String),
        );
        if let Some(field) = &config.depth_cache_field {
            doc.insert(
                field.clone(),
                self.depth_cache.map_or(Value::Null, Value::from),
            );
        }
        doc
    }
}

/// Scope guard returned by [`Node::suppress_cascade`].
///
/// Dereferences to the guarded node. Dropping the guard restores the cascade
/// setting the node had before.
#[derive(Debug)]
pub struct CascadeGuard<'a> {
    node: &'a mut Node,
    previous: bool,
}

impl Deref for CascadeGuard<'_> {
    type Target = Node;

    fn deref(&self) -> &Node {
        self.node
    }
}

impl DerefMut for CascadeGuard<'_> {
    fn deref_mut(&mut self) -> &mut Node {
        self.node
    }
}

impl Drop for CascadeGuard<'_> {
    fn drop(&mut self) {
        self.node.cascade_suppressed = self.previous;
    }
}
