use std::sync::Arc;

pub type Attribute = (Arc<str>, Option<String>);
pub type StyleEntry = (String, String);

/// Stable identity of a node inside one [`ContentTree`](crate::ContentTree).
///
/// Keys are allocated monotonically and never reused, so a key that outlived
/// its node is detectably stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u32);

impl NodeKey {
    /// Reserved sentinel for "unassigned/invalid" identity.
    pub const INVALID: NodeKey = NodeKey(0);
}

/// Payload of a live node in the arena.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element {
        name: Arc<str>,
        attributes: Vec<Attribute>,
        style: Vec<StyleEntry>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

impl NodeKind {
    pub fn is_element(&self) -> bool {
        matches!(self, NodeKind::Element { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self, NodeKind::Text { .. })
    }

    pub fn allows_children(&self) -> bool {
        matches!(self, NodeKind::Document | NodeKind::Element { .. })
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k.as_ref() == name)
                .map(|(_, v)| v.as_deref().unwrap_or("")),
            _ => None,
        }
    }

    pub fn has_attr(&self, name: &str) -> bool {
        match self {
            NodeKind::Element { attributes, .. } => {
                attributes.iter().any(|(k, _)| k.as_ref() == name)
            }
            _ => false,
        }
    }
}

/// Owned, detached form of a subtree.
///
/// Renderers hand subtrees to the arena in this form
/// ([`ContentTree::insert_tree`](crate::ContentTree::insert_tree)) and tests
/// read them back with [`ContentTree::materialize`](crate::ContentTree::materialize).
/// Nodes that were never attached carry `NodeKey::INVALID`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Document {
        key: NodeKey,
        children: Vec<Node>,
    },
    Element {
        key: NodeKey,
        name: Arc<str>,
        attributes: Vec<Attribute>,
        style: Vec<StyleEntry>,
        children: Vec<Node>,
    },
    Text {
        key: NodeKey,
        text: String,
    },
    Comment {
        key: NodeKey,
        text: String,
    },
}

impl Node {
    pub fn element(name: &str, children: Vec<Node>) -> Self {
        Node::Element {
            key: NodeKey::INVALID,
            name: Arc::from(name),
            attributes: Vec::new(),
            style: Vec::new(),
            children,
        }
    }

    pub fn element_with_attrs(name: &str, attrs: &[(&str, &str)], children: Vec<Node>) -> Self {
        Node::Element {
            key: NodeKey::INVALID,
            name: Arc::from(name),
            attributes: attrs
                .iter()
                .map(|(k, v)| (Arc::from(*k), Some((*v).to_string())))
                .collect(),
            style: Vec::new(),
            children,
        }
    }

    pub fn text(text: &str) -> Self {
        Node::Text {
            key: NodeKey::INVALID,
            text: text.to_string(),
        }
    }

    pub fn comment(text: &str) -> Self {
        Node::Comment {
            key: NodeKey::INVALID,
            text: text.to_string(),
        }
    }

    pub fn key(&self) -> NodeKey {
        match self {
            Node::Document { key, .. } => *key,
            Node::Element { key, .. } => *key,
            Node::Text { key, .. } => *key,
            Node::Comment { key, .. } => *key,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Document { children, .. } | Node::Element { children, .. } => children,
            _ => &[],
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            Node::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k.as_ref() == name)
                .map(|(_, v)| v.as_deref().unwrap_or("")),
            _ => None,
        }
    }
}
