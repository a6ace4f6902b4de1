//! Incremental term highlighting for mutable content trees.
//!
//! Re-exports the engine together with the tree and notification types a host
//! needs to drive it.

pub use bus;
pub use highlight::*;
pub use tree;
