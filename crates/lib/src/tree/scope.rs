//! Depth bounds for relationship queries.
//!
//! Depth is always the candidate record's own ancestor count, not its distance
//! from the record the query started at.

use crate::store::{Comparison, Filter};

/// Bounds on the depth of records returned by a relationship query.
///
/// Holds at most one lower and one upper bound; setting a bound replaces the
/// previous one on the same side.
///
/// ```
/// use ancestry::DepthScope;
///
/// let scope = DepthScope::all().at_least(1).shallower_than(3);
/// assert!(!scope.matches(0));
/// assert!(scope.matches(2));
/// assert!(!scope.matches(3));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DepthScope {
    /// Inclusive lower bound
    min: Option<u64>,
    /// Exclusive upper bound
    max: Option<u64>,
}

impl DepthScope {
    /// No bounds.
    pub fn all() -> Self {
        Self::default()
    }

    /// Depth strictly less than `depth`.
    pub fn shallower_than(mut self, depth: u64) -> Self {
        self.max = Some(depth);
        self
    }

    /// Depth less than or equal to `depth`.
    pub fn at_most(mut self, depth: u64) -> Self {
        self.max = Some(depth.saturating_add(1));
        self
    }

    /// Depth greater than or equal to `depth`.
    pub fn at_least(mut self, depth: u64) -> Self {
        self.min = Some(depth);
        self
    }

    /// Depth strictly greater than `depth`.
    pub fn deeper_than(mut self, depth: u64) -> Self {
        self.min = Some(depth.saturating_add(1));
        self
    }

    /// Depth exactly `depth`.
    pub fn at(self, depth: u64) -> Self {
        self.at_least(depth).at_most(depth)
    }

    /// True when no bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Whether a record at absolute `depth` falls inside the scope.
    pub fn matches(&self, depth: u64) -> bool {
        self.min.is_none_or(|min| depth >= min) && self.max.is_none_or(|max| depth < max)
    }

    /// The store-side form of these bounds against a depth cache field.
    pub fn to_filter(&self, depth_field: &str) -> Filter {
        let mut filter = Filter::All;
        if let Some(min) = self.min {
            filter = filter.and(Filter::compare(depth_field, Comparison::Gte, min));
        }
        if let Some(max) = self.max {
            filter = filter.and(Filter::compare(depth_field, Comparison::Lt, max));
        }
        filter
    }
}
