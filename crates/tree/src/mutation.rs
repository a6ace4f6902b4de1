//! Mutation records emitted by the content tree.
//!
//! Invariants:
//! - Records are queued in the order the mutations happened.
//! - `ChildList` targets the parent whose child list changed.
//! - `CharacterData` targets the text (or comment) node whose payload changed.
//! - `Attributes` targets the element and names the attribute.
//! - Only mutations of nodes attached to the document are recorded; building a
//!   detached subtree is silent until it is attached.

use crate::types::NodeKey;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    CharacterData,
    Attributes { name: Arc<str> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationRecord {
    pub kind: MutationKind,
    pub target: NodeKey,
}

impl MutationRecord {
    pub fn child_list(target: NodeKey) -> Self {
        Self {
            kind: MutationKind::ChildList,
            target,
        }
    }

    pub fn character_data(target: NodeKey) -> Self {
        Self {
            kind: MutationKind::CharacterData,
            target,
        }
    }

    pub fn attributes(target: NodeKey, name: &str) -> Self {
        Self {
            kind: MutationKind::Attributes {
                name: Arc::from(name),
            },
            target,
        }
    }
}
