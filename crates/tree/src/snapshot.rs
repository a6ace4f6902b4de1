//! Deterministic line form of owned subtrees, for test assertions.
//!
//! One line per node, two spaces of indent per level. Not a stable format.
//!
//! Two subtrees are equal when every pair of corresponding lines is equal:
//! same kind, element name, attributes (in order), style (in order), text.
//! Keys and empty style lists are left out unless the options ask for them.

use crate::types::Node;
use std::fmt::{self, Write};

#[derive(Clone, Copy, Debug)]
pub struct TreeSnapshotOptions {
    pub ignore_keys: bool,
    pub ignore_empty_style: bool,
}

impl Default for TreeSnapshotOptions {
    fn default() -> Self {
        Self {
            ignore_keys: true,
            ignore_empty_style: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeSnapshot {
    lines: Vec<String>,
}

impl TreeSnapshot {
    pub fn new(root: &Node, options: TreeSnapshotOptions) -> Self {
        let mut lines = Vec::new();
        let mut stack = vec![(root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            lines.push(format!("{}{}", "  ".repeat(depth), describe(node, &options)));
            stack.extend(node.children().iter().rev().map(|child| (child, depth + 1)));
        }
        Self { lines }
    }

    pub fn as_lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for TreeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// First difference between two subtrees.
#[derive(Debug)]
pub struct TreeMismatch {
    pub path: String,
    pub expected: String,
    pub actual: String,
    expected_subtree: String,
    actual_subtree: String,
}

impl fmt::Display for TreeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "trees differ at {}", self.path)?;
        writeln!(f, "  expected: {}", self.expected)?;
        writeln!(f, "    actual: {}", self.actual)?;
        writeln!(f, "expected subtree:\n{}", self.expected_subtree)?;
        write!(f, "actual subtree:\n{}", self.actual_subtree)
    }
}

impl std::error::Error for TreeMismatch {}

pub fn assert_tree_eq(expected: &Node, actual: &Node, options: TreeSnapshotOptions) {
    if let Err(mismatch) = compare_trees(expected, actual, options) {
        panic!("{mismatch}");
    }
}

pub fn compare_trees(
    expected: &Node,
    actual: &Node,
    options: TreeSnapshotOptions,
) -> Result<(), Box<TreeMismatch>> {
    let mut path = String::from("/");
    path.push_str(&label(expected));
    diff(expected, actual, &options, &mut path)
}

fn diff(
    expected: &Node,
    actual: &Node,
    options: &TreeSnapshotOptions,
    path: &mut String,
) -> Result<(), Box<TreeMismatch>> {
    let (want, got) = (describe(expected, options), describe(actual, options));
    let (want_children, got_children) = (expected.children(), actual.children());
    if want != got || want_children.len() != got_children.len() {
        let (want, got) = if want == got {
            (
                format!("{want} with {} children", want_children.len()),
                format!("{got} with {} children", got_children.len()),
            )
        } else {
            (want, got)
        };
        return Err(Box::new(TreeMismatch {
            path: path.clone(),
            expected: want,
            actual: got,
            expected_subtree: TreeSnapshot::new(expected, *options).render(),
            actual_subtree: TreeSnapshot::new(actual, *options).render(),
        }));
    }
    for (idx, (want, got)) in want_children.iter().zip(got_children).enumerate() {
        let len = path.len();
        let _ = write!(path, "/{}[{idx}]", label(want));
        diff(want, got, options, path)?;
        path.truncate(len);
    }
    Ok(())
}

fn label(node: &Node) -> String {
    match node {
        Node::Document { .. } => "#document".to_string(),
        Node::Element { name, .. } => name.to_string(),
        Node::Text { .. } => "#text".to_string(),
        Node::Comment { .. } => "#comment".to_string(),
    }
}

fn describe(node: &Node, options: &TreeSnapshotOptions) -> String {
    let mut out = match node {
        Node::Document { .. } => "#document".to_string(),
        Node::Element {
            name,
            attributes,
            style,
            ..
        } => {
            let mut out = format!("<{name}");
            for (attr, value) in attributes {
                match value {
                    Some(value) => {
                        let _ = write!(out, " {attr}=\"{}\"", value.escape_debug());
                    }
                    None => {
                        let _ = write!(out, " {attr}");
                    }
                }
            }
            if !(options.ignore_empty_style && style.is_empty()) {
                let entries: Vec<String> = style.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                let _ = write!(out, " style=[{}]", entries.join("; "));
            }
            out.push('>');
            out
        }
        Node::Text { text, .. } => format!("\"{}\"", text.escape_debug()),
        Node::Comment { text, .. } => format!("<!-- {} -->", text.escape_debug()),
    };
    if !options.ignore_keys {
        let _ = write!(out, " key={}", node.key().0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{TreeSnapshot, TreeSnapshotOptions, assert_tree_eq, compare_trees};
    use crate::types::{Node, NodeKey};

    #[test]
    fn keys_are_ignored_by_default() {
        let expected = Node::element("p", vec![Node::text("hi")]);
        let actual = Node::Element {
            key: NodeKey(9),
            name: "p".into(),
            attributes: Vec::new(),
            style: Vec::new(),
            children: vec![Node::Text {
                key: NodeKey(10),
                text: "hi".to_string(),
            }],
        };
        assert_tree_eq(&expected, &actual, TreeSnapshotOptions::default());
        let strict = TreeSnapshotOptions {
            ignore_keys: false,
            ..TreeSnapshotOptions::default()
        };
        assert!(compare_trees(&expected, &actual, strict).is_err());
    }

    #[test]
    fn mismatch_reports_path_and_lines() {
        let expected = Node::element("div", vec![Node::comment("c"), Node::text("a")]);
        let actual = Node::element("div", vec![Node::comment("c"), Node::text("b")]);
        let err = compare_trees(&expected, &actual, TreeSnapshotOptions::default())
            .expect_err("trees differ");
        assert_eq!(err.path, "/div/#text[1]");
        assert_eq!(err.expected, "\"a\"");
        assert_eq!(err.actual, "\"b\"");
    }

    #[test]
    fn child_count_difference_is_reported_on_the_parent() {
        let expected = Node::element("p", vec![Node::text("a"), Node::text("b")]);
        let actual = Node::element("p", vec![Node::text("ab")]);
        let err = compare_trees(&expected, &actual, TreeSnapshotOptions::default())
            .expect_err("trees differ");
        assert_eq!(err.path, "/p");
        assert_eq!(err.expected, "<p> with 2 children");
    }

    #[test]
    fn lines_are_indented_and_escaped() {
        let node = Node::element_with_attrs(
            "mark",
            &[("data-highlighter", "true")],
            vec![Node::text("a\"b\n"), Node::comment("c")],
        );
        let snapshot = TreeSnapshot::new(&node, TreeSnapshotOptions::default());
        assert_eq!(
            snapshot.as_lines(),
            &[
                "<mark data-highlighter=\"true\">".to_string(),
                "  \"a\\\"b\\n\"".to_string(),
                "  <!-- c -->".to_string(),
            ]
        );
    }
}
