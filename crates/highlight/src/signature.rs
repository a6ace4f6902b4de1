//! Content fingerprint of a scope, excluding text the annotator produced.
//!
//! Marker children are skipped, so a pass that only splits and wraps leaves
//! changes the signature in a predictable way: the signature taken right after
//! a pass is what the next check compares against.

use crate::config::MARKER_ATTR;
use crate::scope::Scope;
use std::fmt;
use tree::{ContentTree, NodeKey};

/// Joins leaf texts. Not expected in rendered text.
pub const SIGNATURE_SEPARATOR: char = '\u{1F}';

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Signature(String);

impl Signature {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.replace(SIGNATURE_SEPARATOR, "|"))
    }
}

pub fn signature(tree: &ContentTree, root: NodeKey) -> Signature {
    signature_in(tree, &Scope::resolve(tree, root))
}

pub fn signature_in(tree: &ContentTree, scope: &Scope) -> Signature {
    let mut out = String::new();
    let mut first = true;
    for leaf in scope.text_leaves(tree) {
        let under_marker = tree
            .parent(leaf)
            .is_some_and(|parent| tree.has_attr(parent, MARKER_ATTR));
        if under_marker {
            continue;
        }
        let Some(text) = tree.text(leaf) else {
            continue;
        };
        if !first {
            out.push(SIGNATURE_SEPARATOR);
        }
        first = false;
        out.push_str(text);
    }
    Signature(out)
}
