//! Shared helpers for tests that build content trees and compare annotations.

use std::fmt::Write;
use tree::{ContentTree, Node, NodeKey, NodeKind, Walk, walk};

pub mod cases;

/// Quote-safe rendering of text for failure messages.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            ch if ch < ' ' => {
                let _ = write!(&mut out, "\\u{{{:02X}}}", ch as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Human-readable report of the first differing line with two lines of
/// context on each side.
pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    fn line(lines: &[String], i: usize) -> &str {
        lines.get(i).map(String::as_str).unwrap_or("<missing>")
    }

    let max = expected.len().max(actual.len());
    let mut out = String::new();
    let first = (0..max).find(|&i| line(expected, i) != line(actual, i));
    match first {
        Some(i) => {
            let start = i.saturating_sub(2);
            let end = (i + 3).min(max);
            let _ = writeln!(&mut out, "first difference at line {}:", i + 1);
            for idx in start..end {
                let marker = if idx == i { ">" } else { " " };
                let _ = writeln!(&mut out, "{marker} {:>4}  expected: {}", idx + 1, line(expected, idx));
                let _ = writeln!(&mut out, "{marker} {:>4}    actual: {}", idx + 1, line(actual, idx));
            }
        }
        None if expected.len() != actual.len() => {
            let _ = writeln!(&mut out, "common prefix matches; line counts differ");
        }
        None => {}
    }
    let _ = writeln!(
        &mut out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}

/// Attach `<div>` with one `<p>` per block under the document and discard the
/// records that produced it. Returns the `<div>`.
pub fn mount_blocks(tree: &mut ContentTree, blocks: &[&str]) -> NodeKey {
    let children = blocks
        .iter()
        .map(|text| Node::element("p", vec![Node::text(text)]))
        .collect();
    let root = tree
        .insert_tree(tree.document(), &Node::element("div", children))
        .unwrap_or_else(|err| panic!("failed to attach fixture blocks: {err}"));
    tree.take_records();
    root
}

/// Render `key` as plain text with every element carrying `marker_attr`
/// wrapped in brackets: `"[error] [42] ok"`.
pub fn render_marked(tree: &ContentTree, key: NodeKey, marker_attr: &str) -> String {
    let mut out = String::new();
    walk(tree, key, |node, kind| {
        if node != key && kind.has_attr(marker_attr) {
            out.push('[');
            out.push_str(&tree.text_content(node));
            out.push(']');
            return Walk::SkipChildren;
        }
        if let NodeKind::Text { text } = kind {
            out.push_str(text);
        }
        Walk::Continue
    });
    out
}

/// [`render_marked`] for each child of `root`.
pub fn render_blocks(tree: &ContentTree, root: NodeKey, marker_attr: &str) -> Vec<String> {
    tree.children(root)
        .iter()
        .map(|child| render_marked(tree, *child, marker_attr))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{diff_lines, escape_text, mount_blocks, render_blocks, render_marked};
    use tree::ContentTree;

    #[test]
    fn escapes_control_characters() {
        assert_eq!(escape_text("a\"b\n\u{1F}"), "a\\\"b\\n\\u{1F}");
    }

    #[test]
    fn diff_points_at_first_difference() {
        let expected = vec!["a".to_string(), "b".to_string()];
        let actual = vec!["a".to_string(), "c".to_string()];
        let report = diff_lines(&expected, &actual);
        assert!(report.contains("first difference at line 2"));
        assert!(report.contains(">    2  expected: b"));
    }

    #[test]
    fn renders_markers_in_brackets() {
        let mut tree = ContentTree::new();
        let root = mount_blocks(&mut tree, &["plain", "x"]);
        let p = tree.children(root)[1];
        let leaf = tree.children(p)[0];
        let mark = tree.create_element("mark", vec![("data-m".into(), None)]);
        let inner = tree.create_text("x");
        tree.append_child(mark, inner).unwrap();
        tree.replace_with(leaf, &[mark]).unwrap();

        assert_eq!(render_marked(&tree, p, "data-m"), "[x]");
        assert_eq!(render_blocks(&tree, root, "data-m"), vec!["plain", "[x]"]);
    }
}
