use crate::types::NodeKey;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeError {
    InvalidKey(NodeKey),
    MissingKey(NodeKey),
    WrongNodeKind(NodeKey),
    InvalidParent(NodeKey),
    InvalidSibling { parent: NodeKey, before: NodeKey },
    CycleDetected { parent: NodeKey, child: NodeKey },
    DocumentNotInsertable,
    NotAttached(NodeKey),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::InvalidKey(key) => write!(f, "invalid node key {}", key.0),
            TreeError::MissingKey(key) => write!(f, "no live node with key {}", key.0),
            TreeError::WrongNodeKind(key) => {
                write!(f, "node {} has the wrong kind for this operation", key.0)
            }
            TreeError::InvalidParent(key) => write!(f, "node {} cannot be used as parent/child here", key.0),
            TreeError::InvalidSibling { parent, before } => write!(
                f,
                "node {} is not a child of {}",
                before.0, parent.0
            ),
            TreeError::CycleDetected { parent, child } => write!(
                f,
                "attaching {} under {} would create a cycle",
                child.0, parent.0
            ),
            TreeError::DocumentNotInsertable => f.write_str("a document node cannot be inserted"),
            TreeError::NotAttached(key) => write!(f, "node {} is not attached to the document", key.0),
        }
    }
}

impl std::error::Error for TreeError {}
