//! Query predicates understood by every document store.
//!
//! A [`Filter`] is a small predicate tree over top-level document fields. The
//! in-memory store evaluates it with [`Filter::matches`]; stores backed by an
//! external engine translate it into that engine's query language.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Document;

/// Comparison operators for [`Filter::Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Comparison {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Comparison::Lt => ordering == Ordering::Less,
            Comparison::Lte => ordering != Ordering::Greater,
            Comparison::Gt => ordering == Ordering::Greater,
            Comparison::Gte => ordering != Ordering::Less,
        }
    }
}

/// A predicate over documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// Matches every document.
    All,
    /// Field equals value. `Null` also matches documents missing the field.
    Eq { field: String, value: Value },
    /// Field equals one of the values.
    In { field: String, values: Vec<Value> },
    /// String field starts with `prefix`.
    Prefix { field: String, prefix: String },
    /// Field compares against value; numbers numerically, strings lexically.
    Compare {
        field: String,
        op: Comparison,
        value: Value,
    },
    /// Every clause matches.
    And(Vec<Filter>),
    /// At least one clause matches.
    Or(Vec<Filter>),
}

impl Filter {
    /// Matches documents where `field` equals `value`.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Matches documents where `field` is missing or null.
    pub fn is_null(field: impl Into<String>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: Value::Null,
        }
    }

    /// Matches documents where `field` equals one of `values`.
    pub fn in_values<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Matches documents whose string `field` starts with `prefix`.
    pub fn prefix(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Filter::Prefix {
            field: field.into(),
            prefix: prefix.into(),
        }
    }

    /// Matches documents where `field` compares to `value` by `op`.
    pub fn compare(field: impl Into<String>, op: Comparison, value: impl Into<Value>) -> Self {
        Filter::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Combines two filters so both must match, flattening nested conjunctions.
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, other) => other,
            (this, Filter::All) => this,
            (Filter::And(mut clauses), Filter::And(more)) => {
                clauses.extend(more);
                Filter::And(clauses)
            }
            (Filter::And(mut clauses), other) => {
                clauses.push(other);
                Filter::And(clauses)
            }
            (this, other) => Filter::And(vec![this, other]),
        }
    }

    /// Evaluates this filter against a document.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq { field, value } => match doc.get(field) {
                Some(found) => found == value,
                None => value.is_null(),
            },
            Filter::In { field, values } => {
                let found = doc.get(field).unwrap_or(&Value::Null);
                values.iter().any(|v| v == found)
            }
            Filter::Prefix { field, prefix } => doc
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|s| s.starts_with(prefix.as_str())),
            Filter::Compare { field, op, value } => doc
                .get(field)
                .and_then(|found| compare_values(found, value))
                .is_some_and(|ordering| op.accepts(ordering)),
            Filter::And(clauses) => clauses.iter().all(|c| c.matches(doc)),
            Filter::Or(clauses) => clauses.iter().any(|c| c.matches(doc)),
        }
    }
}

/// Orders two JSON scalars of the same kind.
///
/// Returns `None` for mismatched kinds and for non-scalar values.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_u64(), y.as_u64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}
