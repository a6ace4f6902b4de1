//! Mutable content tree with change records.
//!
//! The tree is an arena of nodes addressed by [`NodeKey`]. Renderers build
//! subtrees in owned [`Node`] form and attach them; every mutation of the
//! attached part of the tree queues a [`MutationRecord`] that observers drain
//! through the `bus` crate.

pub mod debug;
#[cfg(any(test, feature = "tree-snapshot"))]
pub mod snapshot;
pub mod traverse;

mod arena;
mod error;
mod mutation;
mod types;

pub use crate::arena::ContentTree;
pub use crate::error::TreeError;
pub use crate::mutation::{MutationKind, MutationRecord};
pub use crate::traverse::{Walk, normalize_where, outermost_matching, text_leaves, walk};
pub use crate::types::{Attribute, Node, NodeKey, NodeKind, StyleEntry};

/// Whitespace-only (or empty) text, as a text walker classifies it.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}
