//! Which nodes belong to an instance.
//!
//! An instance owns its root's subtree minus the subtrees of any descendant
//! root stamped with [`SCOPE_ATTR`]. Boundaries are resolved fresh for every
//! query batch so instances mounted later are honored.

use crate::config::{MARKER_ATTR, SCOPE_ATTR};
use tree::{ContentTree, NodeKey, Walk, outermost_matching, text_leaves, walk};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scope {
    root: Option<NodeKey>,
    nested: Vec<NodeKey>,
}

impl Scope {
    /// Resolve the scope of `root`. A missing root resolves to an empty scope.
    pub fn resolve(tree: &ContentTree, root: NodeKey) -> Self {
        if !tree.kind(root).is_some_and(|k| k.is_element()) {
            return Self::default();
        }
        let nested = outermost_matching(tree, root, |_, kind| kind.has_attr(SCOPE_ATTR));
        Self {
            root: Some(root),
            nested,
        }
    }

    pub fn root(&self) -> Option<NodeKey> {
        self.root
    }

    /// Roots of directly nested instances.
    pub fn nested(&self) -> &[NodeKey] {
        &self.nested
    }

    /// Whether `key` is a nested boundary a walk must not enter.
    pub fn prunes(&self, key: NodeKey) -> bool {
        self.nested.contains(&key)
    }

    /// Classify a mutation target. Fails closed: a target with no element
    /// context (detached, dropped, or directly under the document) is out.
    pub fn contains(&self, tree: &ContentTree, target: NodeKey) -> bool {
        let Some(root) = self.root else {
            return false;
        };
        let Some(element) = tree.nearest_element(target) else {
            return false;
        };
        tree.contains(root, element) && !self.nested.iter().any(|b| tree.contains(*b, element))
    }

    /// In-scope text leaves in document order.
    pub fn text_leaves(&self, tree: &ContentTree) -> Vec<NodeKey> {
        match self.root {
            Some(root) => text_leaves(tree, root, |key, _| self.prunes(key)),
            None => Vec::new(),
        }
    }

    /// In-scope marker nodes in document order.
    pub fn marks(&self, tree: &ContentTree) -> Vec<NodeKey> {
        let Some(root) = self.root else {
            return Vec::new();
        };
        let mut out = Vec::new();
        walk(tree, root, |key, kind| {
            if self.prunes(key) {
                return Walk::SkipChildren;
            }
            if key != root && kind.is_element() && kind.has_attr(MARKER_ATTR) {
                out.push(key);
                return Walk::SkipChildren;
            }
            Walk::Continue
        });
        out
    }
}

/// One-shot form of [`Scope::contains`].
pub fn in_scope(tree: &ContentTree, root: NodeKey, target: NodeKey) -> bool {
    Scope::resolve(tree, root).contains(tree, target)
}

/// Marker nodes owned by the instance rooted at `root`.
pub fn scoped_marks(tree: &ContentTree, root: NodeKey) -> Vec<NodeKey> {
    Scope::resolve(tree, root).marks(tree)
}

#[cfg(test)]
mod tests {
    use super::{Scope, in_scope, scoped_marks};
    use crate::config::{MARKER_ATTR, SCOPE_ATTR};
    use tree::{ContentTree, Node, NodeKey};

    struct Fixture {
        tree: ContentTree,
        outer: NodeKey,
        inner: NodeKey,
    }

    fn fixture() -> Fixture {
        let mut tree = ContentTree::new();
        let outer = tree
            .insert_tree(
                tree.document(),
                &Node::element_with_attrs(
                    "div",
                    &[(SCOPE_ATTR, "1")],
                    vec![
                        Node::element("p", vec![Node::text("outer text")]),
                        Node::element_with_attrs(
                            "div",
                            &[(SCOPE_ATTR, "2")],
                            vec![Node::element("p", vec![Node::text("inner text")])],
                        ),
                        Node::element_with_attrs(MARKER_ATTR, &[], vec![]),
                    ],
                ),
            )
            .unwrap();
        let inner = tree.children(outer)[1];
        Fixture { tree, outer, inner }
    }

    #[test]
    fn nested_root_is_out_of_outer_scope() {
        let f = fixture();
        let scope = Scope::resolve(&f.tree, f.outer);
        assert_eq!(scope.nested(), &[f.inner]);

        let outer_p = f.tree.children(f.outer)[0];
        let outer_leaf = f.tree.children(outer_p)[0];
        let inner_p = f.tree.children(f.inner)[0];
        let inner_leaf = f.tree.children(inner_p)[0];

        assert!(scope.contains(&f.tree, outer_leaf));
        assert!(scope.contains(&f.tree, f.outer));
        assert!(!scope.contains(&f.tree, f.inner));
        assert!(!scope.contains(&f.tree, inner_leaf));
        assert!(in_scope(&f.tree, f.inner, inner_leaf));
        assert!(in_scope(&f.tree, f.inner, f.inner));
    }

    #[test]
    fn leaves_skip_nested_subtrees() {
        let f = fixture();
        let leaves = Scope::resolve(&f.tree, f.outer).text_leaves(&f.tree);
        let texts: Vec<_> = leaves.iter().filter_map(|k| f.tree.text(*k)).collect();
        assert_eq!(texts, vec!["outer text"]);
    }

    #[test]
    fn unknown_targets_fail_closed() {
        let mut f = fixture();
        let doc_leaf = f.tree.create_text("loose");
        f.tree.append_child(f.tree.document(), doc_leaf).unwrap();
        let scope = Scope::resolve(&f.tree, f.outer);
        assert!(!scope.contains(&f.tree, doc_leaf));
        assert!(!scope.contains(&f.tree, NodeKey(9999)));
        assert!(!scope.contains(&f.tree, f.tree.document()));
    }

    #[test]
    fn missing_root_resolves_empty() {
        let f = fixture();
        let scope = Scope::resolve(&f.tree, NodeKey(9999));
        assert_eq!(scope.root(), None);
        assert!(scope.text_leaves(&f.tree).is_empty());
        assert!(!scope.contains(&f.tree, f.outer));
    }

    #[test]
    fn marks_only_match_the_marker_attribute() {
        let mut f = fixture();
        let mark = f.tree.create_element(
            "mark",
            vec![(MARKER_ATTR.into(), Some("true".to_string()))],
        );
        let inner_p = f.tree.children(f.inner)[0];
        let inner_mark = f.tree.create_element(
            "mark",
            vec![(MARKER_ATTR.into(), Some("true".to_string()))],
        );
        f.tree.append_child(f.outer, mark).unwrap();
        f.tree.append_child(inner_p, inner_mark).unwrap();

        assert_eq!(scoped_marks(&f.tree, f.outer), vec![mark]);
        assert_eq!(scoped_marks(&f.tree, f.inner), vec![inner_mark]);
    }
}
