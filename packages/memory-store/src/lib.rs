//! In-memory backend for repotree.
//!
//! Behaves like a small content repository: saves create missing ancestors,
//! deletes take the whole subtree, and the backend stamps its own metadata
//! on every write.

pub mod in_memory;

pub use in_memory::{CallCounts, InMemoryTransport};
