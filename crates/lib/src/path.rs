//! Materialized path encoding.
//!
//! An ancestry value lists the ids of all ancestors of a record, root first,
//! joined by `/`. A root record has no ancestry value at all: the empty path is
//! represented by absence rather than by an empty string.
//!
//! All parsing and building of stored ancestry values happens in this module, so
//! the rest of the crate only ever handles the decoded [`Ancestry`] form.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::constants::PATH_SEPARATOR;

/// Numeric record identifier, unique within a collection.
pub type Uid = u64;

/// Errors produced while decoding a stored ancestry value.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Two separators with nothing between them, or a leading/trailing separator.
    #[error("Empty segment in ancestry '{ancestry}'")]
    EmptySegment {
        /// The ancestry value that failed to decode
        ancestry: String,
    },

    /// A segment that is not a non-negative integer.
    #[error("Invalid segment '{segment}' in ancestry '{ancestry}'")]
    InvalidSegment {
        /// The ancestry value that failed to decode
        ancestry: String,
        /// The offending segment
        segment: String,
    },
}

impl PathError {
    /// The raw ancestry value that could not be decoded.
    pub fn ancestry(&self) -> &str {
        match self {
            PathError::EmptySegment { ancestry } | PathError::InvalidSegment { ancestry, .. } => {
                ancestry
            }
        }
    }
}

impl From<PathError> for crate::Error {
    fn from(err: PathError) -> Self {
        crate::Error::Path(err)
    }
}

/// A decoded, non-empty materialized path.
///
/// The ids are ordered root first; the last id is the parent of the record the
/// path belongs to. Roots have no `Ancestry`, so every value of this type holds
/// at least one id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ancestry(Vec<Uid>);

impl Ancestry {
    /// Builds a path from ancestor ids, or `None` when `ids` is empty.
    pub fn from_ids(ids: Vec<Uid>) -> Option<Self> {
        if ids.is_empty() { None } else { Some(Self(ids)) }
    }

    /// The path of a direct child of a root record.
    pub fn root(id: Uid) -> Self {
        Self(vec![id])
    }

    /// Ancestor ids, root first.
    pub fn ids(&self) -> &[Uid] {
        &self.0
    }

    /// Number of ancestors described by this path.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// The first id of the path.
    pub fn root_id(&self) -> Uid {
        self.0[0]
    }

    /// The last id of the path.
    pub fn parent_id(&self) -> Uid {
        self.0[self.0.len() - 1]
    }

    /// Whether `id` appears anywhere in the path.
    pub fn contains(&self, id: Uid) -> bool {
        self.0.contains(&id)
    }

    /// The path a child of `id` gets when `id` itself sits at this path.
    pub fn child(&self, id: Uid) -> Self {
        let mut ids = Vec::with_capacity(self.0.len() + 1);
        ids.extend_from_slice(&self.0);
        ids.push(id);
        Self(ids)
    }

    /// Whether this path begins with every segment of `prefix`.
    pub fn starts_with(&self, prefix: &Ancestry) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// The segments left after removing a leading `prefix`.
    ///
    /// Returns `None` when the path does not start with `prefix`. The result is
    /// empty when the path equals `prefix`.
    pub fn strip_prefix(&self, prefix: &Ancestry) -> Option<&[Uid]> {
        self.0.strip_prefix(prefix.0.as_slice())
    }

    /// Replaces a leading `old` prefix with `new`.
    ///
    /// The match is anchored at the root end of the path and works on whole
    /// segments, so `1/2` is never treated as a prefix of `1/23`.
    pub fn replace_prefix(&self, old: &Ancestry, new: &Ancestry) -> Option<Ancestry> {
        let rest = self.strip_prefix(old)?;
        let mut ids = Vec::with_capacity(new.0.len() + rest.len());
        ids.extend_from_slice(&new.0);
        ids.extend_from_slice(rest);
        Some(Self(ids))
    }

    /// Parses a stored ancestry value. Empty input is a root and yields `None`.
    pub fn parse(value: Option<&str>) -> Result<Option<Self>, PathError> {
        Ok(Self::from_ids(decode(value)?))
    }

    /// Encodes this path into its stored form.
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Ancestry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{PATH_SEPARATOR}")?;
            }
            write!(f, "{id}")?;
        }
        Ok(())
    }
}

impl FromStr for Ancestry {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(Some(s))?.ok_or_else(|| PathError::EmptySegment {
            ancestry: s.to_string(),
        })
    }
}

/// Splits a stored ancestry value into ancestor ids.
///
/// Absent and empty values decode to an empty sequence.
pub fn decode(value: Option<&str>) -> Result<Vec<Uid>, PathError> {
    let value = match value {
        Some(v) if !v.is_empty() => v,
        _ => return Ok(Vec::new()),
    };

    value
        .split(PATH_SEPARATOR)
        .map(|segment| {
            if segment.is_empty() {
                return Err(PathError::EmptySegment {
                    ancestry: value.to_string(),
                });
            }
            segment
                .parse::<Uid>()
                .map_err(|_| PathError::InvalidSegment {
                    ancestry: value.to_string(),
                    segment: segment.to_string(),
                })
        })
        .collect()
}

/// Joins ancestor ids into the stored form. An empty sequence has no stored value.
pub fn encode(ids: &[Uid]) -> Option<String> {
    Ancestry::from_ids(ids.to_vec()).map(|ancestry| ancestry.encode())
}

/// The ancestry value that children of a record at `ancestry` with `id` carry.
pub fn child_path(ancestry: Option<&Ancestry>, id: Uid) -> Ancestry {
    match ancestry {
        Some(ancestry) => ancestry.child(id),
        None => Ancestry::root(id),
    }
}
