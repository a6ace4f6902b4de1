use crate::arena::ContentTree;
use crate::types::{NodeKey, NodeKind};
use std::fmt::Write;

const TEXT_PREVIEW: usize = 40;

/// Indented outline of the subtree at `root` for trace output, at most `cap`
/// lines. Each line starts with the node key. See `snapshot` for a
/// deterministic form.
pub fn outline(tree: &ContentTree, root: NodeKey, cap: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack = vec![(root, 0usize)];
    while let Some((key, depth)) = stack.pop() {
        if out.len() == cap {
            break;
        }
        let Some(kind) = tree.kind(key) else {
            continue;
        };
        let mut line = format!("{:indent$}{}: ", "", key.0, indent = depth * 2);
        describe(&mut line, kind);
        out.push(line);
        stack.extend(tree.children(key).iter().rev().map(|child| (*child, depth + 1)));
    }
    out
}

fn describe(line: &mut String, kind: &NodeKind) {
    match kind {
        NodeKind::Document => line.push_str("#document"),
        NodeKind::Element {
            name,
            attributes,
            style,
        } => {
            let _ = write!(line, "<{name}");
            for (k, v) in attributes {
                match v {
                    Some(v) => {
                        let _ = write!(line, " {k}={v:?}");
                    }
                    None => {
                        let _ = write!(line, " {k}");
                    }
                }
            }
            line.push('>');
            if !style.is_empty() {
                let _ = write!(line, " +{} style", style.len());
            }
        }
        NodeKind::Text { text } => {
            line.push('"');
            preview(line, text);
            line.push('"');
        }
        NodeKind::Comment { text } => {
            line.push_str("<!-- ");
            preview(line, text);
            line.push_str(" -->");
        }
    }
}

fn preview(line: &mut String, text: &str) {
    let mut chars = text.chars();
    for ch in chars.by_ref().take(TEXT_PREVIEW) {
        line.push(if ch == '\n' { ' ' } else { ch });
    }
    if chars.next().is_some() {
        line.push('…');
    }
}
