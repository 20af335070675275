//! Record-level validation.
//!
//! Validation failures are not errors: they are collected on the node and the
//! save that found them reports `false` without writing anything.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Node, path::Uid};

/// A single validation failure attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ValidationError {
    /// The record's own id appears in its ancestry.
    SelfAncestry { id: Uid, field: String },
}

impl ValidationError {
    /// The document field the failure is reported against.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::SelfAncestry { field, .. } => field,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::SelfAncestry { id, .. } => {
                write!(f, "Record {id} cannot be a descendant of itself")
            }
        }
    }
}

/// The validation failures of one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// Failures reported against `field`.
    pub fn on(&self, field: &str) -> impl Iterator<Item = &ValidationError> {
        self.0.iter().filter(move |e| e.field() == field)
    }

    /// Records a failure.
    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }
}

/// Checks that a record is not listed among its own ancestors.
pub(crate) fn ancestry_excludes_self(node: &Node, ancestry_field: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    if let (Some(id), Some(ancestry)) = (node.id(), node.ancestry())
        && ancestry.contains(id)
    {
        errors.push(ValidationError::SelfAncestry {
            id,
            field: ancestry_field.to_string(),
        });
    }
    errors
}
