use crate::arena::ContentTree;
use crate::error::TreeError;
use crate::types::{NodeKey, NodeKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Walk {
    Continue,
    SkipChildren,
}

/// Pre-order traversal of the subtree rooted at `root` (inclusive).
pub fn walk(tree: &ContentTree, root: NodeKey, mut visit: impl FnMut(NodeKey, &NodeKind) -> Walk) {
    if !tree.is_live(root) {
        return;
    }
    let mut stack = vec![root];
    while let Some(key) = stack.pop() {
        let Some(kind) = tree.kind(key) else {
            continue;
        };
        if visit(key, kind) == Walk::SkipChildren {
            continue;
        }
        stack.extend(tree.children(key).iter().rev().copied());
    }
}

/// Text leaves under `root` in document order, not descending into nodes for
/// which `skip` returns true.
pub fn text_leaves(
    tree: &ContentTree,
    root: NodeKey,
    mut skip: impl FnMut(NodeKey, &NodeKind) -> bool,
) -> Vec<NodeKey> {
    let mut out = Vec::new();
    walk(tree, root, |key, kind| {
        if skip(key, kind) {
            return Walk::SkipChildren;
        }
        if kind.is_text() {
            out.push(key);
        }
        Walk::Continue
    });
    out
}

/// Elements under `root` (excluding `root`) matching `pred`, without descending
/// into the matches themselves.
pub fn outermost_matching(
    tree: &ContentTree,
    root: NodeKey,
    mut pred: impl FnMut(NodeKey, &NodeKind) -> bool,
) -> Vec<NodeKey> {
    let mut out = Vec::new();
    walk(tree, root, |key, kind| {
        if key != root && pred(key, kind) {
            out.push(key);
            return Walk::SkipChildren;
        }
        Walk::Continue
    });
    out
}

/// Merge adjacent text leaves and drop empty ones in every container under
/// `root`, without descending into skipped subtrees.
///
/// Returns the number of containers whose child list changed.
pub fn normalize_where(
    tree: &mut ContentTree,
    root: NodeKey,
    mut skip: impl FnMut(NodeKey, &NodeKind) -> bool,
) -> Result<usize, TreeError> {
    let mut containers = Vec::new();
    walk(tree, root, |key, kind| {
        if skip(key, kind) {
            return Walk::SkipChildren;
        }
        if kind.allows_children() {
            containers.push(key);
        }
        Walk::Continue
    });
    let mut changed = 0;
    for key in containers {
        if tree.merge_text_children(key)? {
            changed += 1;
        }
    }
    Ok(changed)
}
