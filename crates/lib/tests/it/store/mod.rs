//! Document store integration tests
//!
//! Covers the in-memory store as a tree backend and its file persistence.

mod persistence;
