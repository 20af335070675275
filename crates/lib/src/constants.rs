//! Constants used throughout the Ancestry library.
//!
//! This module provides central definitions for default document field names
//! and the limits applied by the tree operations.

/// Separator between ancestor ids in a stored ancestry value.
pub const PATH_SEPARATOR: char = '/';

/// Default document field holding the materialized path.
pub const DEFAULT_ANCESTRY_FIELD: &str = "ancestry";

/// Default document field holding the numeric record id.
pub const DEFAULT_UID_FIELD: &str = "id";

/// Number of insert attempts made when an allocated id collides with a concurrent writer.
pub const MAX_UID_ATTEMPTS: usize = 3;

/// First id handed out in an empty collection.
pub const FIRST_UID: u64 = 1;
