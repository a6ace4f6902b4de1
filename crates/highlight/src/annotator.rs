//! One annotation pass over an instance's scope.
//!
//! A pass always starts from a clean slate: existing markers in scope are
//! unwrapped back into plain text and adjacent text is merged, then every
//! non-blank text leaf is split on the compiled expression. Nested scopes are
//! never touched.

use crate::config::{MARKER_ATTR, MatchConfig, Presentation};
use crate::scope::Scope;
use crate::terms::{CompiledTerms, compile};
use std::sync::Arc;
use tree::{ContentTree, NodeKey, TreeError, is_blank, normalize_where};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Markers unwrapped before matching.
    pub cleared: usize,
    /// Markers created.
    pub marked: usize,
    /// Text leaves replaced by fragments.
    pub split_leaves: usize,
}

/// Compile `config` and run one pass under `root`.
pub fn apply(tree: &mut ContentTree, root: NodeKey, config: &MatchConfig) -> PassReport {
    let compiled = compile(config);
    apply_compiled(tree, root, compiled.as_ref(), &config.presentation)
}

/// Run one pass with an already compiled expression. `None` clears only.
pub fn apply_compiled(
    tree: &mut ContentTree,
    root: NodeKey,
    compiled: Option<&CompiledTerms>,
    presentation: &Presentation,
) -> PassReport {
    let mut report = PassReport::default();
    let scope = Scope::resolve(tree, root);
    if scope.root().is_none() {
        log::debug!(target: "highlight.annotator", "root {} is gone; nothing to annotate", root.0);
        return report;
    }

    report.cleared = clear_marks(tree, &scope);

    let Some(compiled) = compiled else {
        return report;
    };
    for leaf in scope.text_leaves(tree) {
        match annotate_leaf(tree, leaf, compiled, presentation) {
            Ok(Some(marked)) => {
                report.split_leaves += 1;
                report.marked += marked;
            }
            Ok(None) => {}
            Err(err) => log::warn!(
                target: "highlight.annotator",
                "leaving text leaf {} as is: {err}",
                leaf.0
            ),
        }
    }
    log::trace!(
        target: "highlight.annotator",
        "pass under {}: cleared={} marked={} split={}",
        root.0,
        report.cleared,
        report.marked,
        report.split_leaves
    );
    report
}

/// Unwrap every in-scope marker into a plain text leaf and normalize.
/// Returns the number of markers removed.
pub fn clear_marks(tree: &mut ContentTree, scope: &Scope) -> usize {
    let Some(root) = scope.root() else {
        return 0;
    };
    let marks = scope.marks(tree);
    let mut cleared = 0;
    for mark in marks {
        let text = tree.text_content(mark);
        let leaf = tree.create_text(text);
        match tree.replace_with(mark, &[leaf]) {
            Ok(()) => cleared += 1,
            Err(err) => {
                log::warn!(target: "highlight.annotator", "cannot unwrap marker {}: {err}", mark.0);
                let _ = tree.remove(leaf);
            }
        }
    }
    if let Err(err) = normalize_where(tree, root, |key, _| scope.prunes(key)) {
        log::warn!(target: "highlight.annotator", "normalize under {} failed: {err}", root.0);
    }
    cleared
}

/// Split one leaf. `None` when the leaf is left alone, otherwise the number of
/// markers among its replacement fragments.
fn annotate_leaf(
    tree: &mut ContentTree,
    leaf: NodeKey,
    compiled: &CompiledTerms,
    presentation: &Presentation,
) -> Result<Option<usize>, TreeError> {
    let Some(text) = tree.text(leaf) else {
        return Ok(None);
    };
    if is_blank(text) {
        return Ok(None);
    }
    let text = text.to_string();
    let parts = compiled.split(&text);
    if parts.len() <= 1 {
        return Ok(None);
    }

    let mut replacement = Vec::with_capacity(parts.len());
    let mut marked = 0;
    for part in parts {
        if part.is_empty() {
            continue;
        }
        if compiled.is_term(part) {
            match create_marker(tree, part, presentation) {
                Ok(mark) => replacement.push(mark),
                Err(err) => {
                    discard(tree, &replacement);
                    return Err(err);
                }
            }
            marked += 1;
        } else {
            replacement.push(tree.create_text(part));
        }
    }

    debug_assert!(!replacement.is_empty(), "a split with a match keeps the match");
    if let Err(err) = tree.replace_with(leaf, &replacement) {
        discard(tree, &replacement);
        return Err(err);
    }
    Ok(Some(marked))
}

fn create_marker(
    tree: &mut ContentTree,
    text: &str,
    presentation: &Presentation,
) -> Result<NodeKey, TreeError> {
    let mut attributes = Vec::with_capacity(presentation.attributes.len() + 1);
    attributes.push((Arc::from(MARKER_ATTR), Some("true".to_string())));
    attributes.extend(
        presentation
            .attributes
            .iter()
            .filter(|(name, _)| name.as_ref() != MARKER_ATTR)
            .cloned(),
    );
    let mark = tree.create_element(&presentation.tag, attributes);
    if !presentation.style.is_empty() {
        tree.set_style(mark, presentation.style.clone())?;
    }
    let leaf = tree.create_text(text);
    tree.append_child(mark, leaf)?;
    Ok(mark)
}

fn discard(tree: &mut ContentTree, detached: &[NodeKey]) {
    for key in detached {
        let _ = tree.remove(*key);
    }
}
