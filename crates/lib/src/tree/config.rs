//! Per-collection tree configuration.

use serde::{Deserialize, Serialize};

use super::TreeError;
use crate::{
    Result,
    constants::{DEFAULT_ANCESTRY_FIELD, DEFAULT_UID_FIELD},
};

/// What happens to the descendants of a deleted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrphanStrategy {
    /// Direct children become roots; deeper descendants move up one level.
    Rootify,
    /// Every descendant is deleted along with the record.
    #[default]
    Destroy,
    /// Deleting a record that has children fails.
    Restrict,
}

impl OrphanStrategy {
    /// The strategy name as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrphanStrategy::Rootify => "rootify",
            OrphanStrategy::Destroy => "destroy",
            OrphanStrategy::Restrict => "restrict",
        }
    }
}

impl std::fmt::Display for OrphanStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field names and policies for one tree collection.
///
/// Missing keys take their defaults when deserialized, so a configuration
/// document only has to name what it changes. The default orphan strategy is
/// [`OrphanStrategy::Destroy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Field holding the materialized path
    pub ancestry_field: String,
    /// Field holding the numeric record id
    pub uid_field: String,
    /// Field holding the cached depth, when depth caching is enabled
    pub depth_cache_field: Option<String>,
    pub orphan_strategy: OrphanStrategy,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            ancestry_field: DEFAULT_ANCESTRY_FIELD.to_string(),
            uid_field: DEFAULT_UID_FIELD.to_string(),
            depth_cache_field: None,
            orphan_strategy: OrphanStrategy::default(),
        }
    }
}

impl TreeConfig {
    /// A default configuration with an explicit orphan strategy.
    pub fn new(orphan_strategy: OrphanStrategy) -> Self {
        Self {
            orphan_strategy,
            ..Self::default()
        }
    }

    /// Parses a configuration from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| TreeError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Stores the ancestry under `field` instead of `ancestry`.
    pub fn with_ancestry_field(mut self, field: impl Into<String>) -> Self {
        self.ancestry_field = field.into();
        self
    }

    /// Uses `field` as the record id instead of `id`.
    pub fn with_uid_field(mut self, field: impl Into<String>) -> Self {
        self.uid_field = field.into();
        self
    }

    /// Enables depth caching in `field`.
    pub fn with_depth_cache_field(mut self, field: impl Into<String>) -> Self {
        self.depth_cache_field = Some(field.into());
        self
    }

    /// Sets how descendants are handled when a record is deleted.
    pub fn with_orphan_strategy(mut self, strategy: OrphanStrategy) -> Self {
        self.orphan_strategy = strategy;
        self
    }

    /// Checks that field names are non-empty and pairwise distinct.
    pub fn validate(&self) -> Result<()> {
        let mut names = vec![self.ancestry_field.as_str(), self.uid_field.as_str()];
        names.extend(self.depth_cache_field.as_deref());

        if names.iter().any(|name| name.is_empty()) {
            return Err(TreeError::InvalidConfig {
                reason: "field names must not be empty".to_string(),
            }
            .into());
        }
        for (i, name) in names.iter().enumerate() {
            if names[i + 1..].contains(name) {
                return Err(TreeError::InvalidConfig {
                    reason: format!("field '{name}' is configured twice"),
                }
                .into());
            }
        }
        Ok(())
    }
}
