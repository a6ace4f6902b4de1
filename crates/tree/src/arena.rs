use crate::error::TreeError;
use crate::mutation::MutationRecord;
use crate::types::{Attribute, Node, NodeKey, NodeKind, StyleEntry};
use core_types::TreeVersion;
use std::collections::HashMap;
use std::sync::Arc;

/// Mutable content tree addressed by [`NodeKey`].
///
/// The tree always owns a single `Document` root. Nodes may exist detached
/// (created but not yet attached); only mutations that touch the attached part
/// of the tree are queued as [`MutationRecord`]s.
pub struct ContentTree {
    nodes: HashMap<NodeKey, NodeRecord>,
    next_key: u32,
    document: NodeKey,
    version: TreeVersion,
    pending: Vec<MutationRecord>,
}

struct NodeRecord {
    kind: NodeKind,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

impl ContentTree {
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: HashMap::new(),
            next_key: 1,
            document: NodeKey::INVALID,
            version: TreeVersion::INITIAL,
            pending: Vec::new(),
        };
        tree.document = tree.alloc(NodeKind::Document);
        tree
    }

    pub fn document(&self) -> NodeKey {
        self.document
    }

    pub fn version(&self) -> TreeVersion {
        self.version
    }

    /// Number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key += 1;
        self.nodes.insert(
            key,
            NodeRecord {
                kind,
                parent: None,
                children: Vec::new(),
            },
        );
        key
    }

    pub fn create_element(&mut self, name: &str, attributes: Vec<Attribute>) -> NodeKey {
        self.alloc(NodeKind::Element {
            name: Arc::from(name),
            attributes,
            style: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeKey {
        self.alloc(NodeKind::Text { text: text.into() })
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeKey {
        self.alloc(NodeKind::Comment { text: text.into() })
    }

    fn record(&self, key: NodeKey) -> Result<&NodeRecord, TreeError> {
        if key == NodeKey::INVALID {
            return Err(TreeError::InvalidKey(key));
        }
        self.nodes.get(&key).ok_or(TreeError::MissingKey(key))
    }

    fn record_mut(&mut self, key: NodeKey) -> Result<&mut NodeRecord, TreeError> {
        if key == NodeKey::INVALID {
            return Err(TreeError::InvalidKey(key));
        }
        self.nodes.get_mut(&key).ok_or(TreeError::MissingKey(key))
    }

    // -- Queries ---

    pub fn is_live(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(&key)
    }

    pub fn kind(&self, key: NodeKey) -> Option<&NodeKind> {
        self.nodes.get(&key).map(|r| &r.kind)
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(&key).and_then(|r| r.parent)
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes
            .get(&key)
            .map(|r| r.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn text(&self, key: NodeKey) -> Option<&str> {
        match self.kind(key) {
            Some(NodeKind::Text { text }) => Some(text),
            _ => None,
        }
    }

    pub fn attr(&self, key: NodeKey, name: &str) -> Option<&str> {
        self.kind(key).and_then(|k| k.attr(name))
    }

    pub fn has_attr(&self, key: NodeKey, name: &str) -> bool {
        self.kind(key).is_some_and(|k| k.has_attr(name))
    }

    /// Inclusive ancestry test: a node contains itself.
    pub fn contains(&self, ancestor: NodeKey, node: NodeKey) -> bool {
        if !self.is_live(ancestor) {
            return false;
        }
        let mut current = Some(node);
        while let Some(key) = current {
            if key == ancestor {
                return true;
            }
            current = self.parent(key);
        }
        false
    }

    pub fn is_attached(&self, key: NodeKey) -> bool {
        self.contains(self.document, key)
    }

    /// The node itself when it is an element, otherwise its parent element.
    pub fn nearest_element(&self, key: NodeKey) -> Option<NodeKey> {
        let kind = self.kind(key)?;
        if kind.is_element() {
            return Some(key);
        }
        let parent = self.parent(key)?;
        self.kind(parent)
            .filter(|k| k.is_element())
            .map(|_| parent)
    }

    /// Concatenated text of all text leaves under `key`, in document order.
    pub fn text_content(&self, key: NodeKey) -> String {
        let mut out = String::new();
        crate::traverse::walk(self, key, |_, kind| {
            if let NodeKind::Text { text } = kind {
                out.push_str(text);
            }
            crate::traverse::Walk::Continue
        });
        out
    }

    // -- Mutation log ---

    fn touch(&mut self, record: MutationRecord) {
        self.version = self.version.next();
        if self.is_attached(record.target) {
            self.pending.push(record);
        }
    }

    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.pending)
    }

    pub fn has_pending_records(&self) -> bool {
        !self.pending.is_empty()
    }

    // -- Structure ---

    fn check_attachable(&self, parent: NodeKey, child: NodeKey) -> Result<(), TreeError> {
        let parent_rec = self.record(parent)?;
        let child_rec = self.record(child)?;
        if parent == child || self.contains(child, parent) {
            return Err(TreeError::CycleDetected { parent, child });
        }
        if !parent_rec.kind.allows_children() {
            return Err(TreeError::InvalidParent(parent));
        }
        if child_rec.parent.is_some() || matches!(child_rec.kind, NodeKind::Document) {
            return Err(TreeError::InvalidParent(child));
        }
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), TreeError> {
        self.check_attachable(parent, child)?;
        self.record_mut(parent)?.children.push(child);
        self.record_mut(child)?.parent = Some(parent);
        self.touch(MutationRecord::child_list(parent));
        Ok(())
    }

    pub fn insert_before(
        &mut self,
        parent: NodeKey,
        child: NodeKey,
        before: NodeKey,
    ) -> Result<(), TreeError> {
        self.check_attachable(parent, child)?;
        if self.record(before)?.parent != Some(parent) {
            return Err(TreeError::InvalidSibling { parent, before });
        }
        let siblings = &mut self.record_mut(parent)?.children;
        let pos = siblings
            .iter()
            .position(|k| *k == before)
            .ok_or(TreeError::InvalidSibling { parent, before })?;
        siblings.insert(pos, child);
        self.record_mut(child)?.parent = Some(parent);
        self.touch(MutationRecord::child_list(parent));
        Ok(())
    }

    /// Detach `key` from its parent, keeping the subtree alive.
    pub fn detach(&mut self, key: NodeKey) -> Result<(), TreeError> {
        if key == self.document {
            return Err(TreeError::InvalidParent(key));
        }
        let Some(parent) = self.record_mut(key)?.parent.take() else {
            return Ok(());
        };
        self.record_mut(parent)?.children.retain(|k| *k != key);
        self.touch(MutationRecord::child_list(parent));
        Ok(())
    }

    /// Detach `key` and drop its whole subtree. Keys in the subtree become stale.
    pub fn remove(&mut self, key: NodeKey) -> Result<(), TreeError> {
        self.detach(key)?;
        self.drop_subtree(key);
        Ok(())
    }

    fn drop_subtree(&mut self, key: NodeKey) {
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(record) = self.nodes.remove(&current) {
                stack.extend(record.children);
            }
        }
    }

    /// Replace `old` with `replacement`, in order, at the same position.
    ///
    /// The replacement nodes must be detached. `old` and its subtree are dropped.
    pub fn replace_with(&mut self, old: NodeKey, replacement: &[NodeKey]) -> Result<(), TreeError> {
        let parent = self.record(old)?.parent.ok_or(TreeError::InvalidParent(old))?;
        for (i, &node) in replacement.iter().enumerate() {
            if node == old || replacement[..i].contains(&node) {
                return Err(TreeError::InvalidParent(node));
            }
            self.check_attachable(parent, node)?;
        }
        let siblings = &mut self.record_mut(parent)?.children;
        let pos = siblings
            .iter()
            .position(|k| *k == old)
            .ok_or(TreeError::InvalidSibling { parent, before: old })?;
        siblings.splice(pos..=pos, replacement.iter().copied());
        for &node in replacement {
            self.record_mut(node)?.parent = Some(parent);
        }
        self.record_mut(old)?.parent = None;
        self.drop_subtree(old);
        self.touch(MutationRecord::child_list(parent));
        Ok(())
    }

    /// Replace all children of `parent` with a single text leaf (none for empty text).
    pub fn set_text_content(&mut self, parent: NodeKey, text: &str) -> Result<(), TreeError> {
        if !self.record(parent)?.kind.allows_children() {
            return Err(TreeError::WrongNodeKind(parent));
        }
        let old = std::mem::take(&mut self.record_mut(parent)?.children);
        for child in old {
            self.drop_subtree(child);
        }
        if !text.is_empty() {
            let leaf = self.create_text(text);
            self.record_mut(parent)?.children.push(leaf);
            self.record_mut(leaf)?.parent = Some(parent);
        }
        self.touch(MutationRecord::child_list(parent));
        Ok(())
    }

    /// Merge adjacent text children of `parent` and drop empty ones.
    ///
    /// Returns `true` when the child list changed.
    pub fn merge_text_children(&mut self, parent: NodeKey) -> Result<bool, TreeError> {
        let children = self.record(parent)?.children.clone();
        let mut merged_children: Vec<NodeKey> = Vec::with_capacity(children.len());
        let mut grown: Vec<NodeKey> = Vec::new();
        let mut dropped: Vec<NodeKey> = Vec::new();

        for child in children {
            let Some(NodeKind::Text { text }) = self.kind(child) else {
                merged_children.push(child);
                continue;
            };
            if text.is_empty() {
                dropped.push(child);
                continue;
            }
            let previous = merged_children
                .last()
                .copied()
                .filter(|prev| self.text(*prev).is_some());
            match previous {
                Some(prev) => {
                    let tail = text.clone();
                    if let Some(NodeKind::Text { text }) =
                        self.nodes.get_mut(&prev).map(|r| &mut r.kind)
                    {
                        text.push_str(&tail);
                    }
                    if !grown.contains(&prev) {
                        grown.push(prev);
                    }
                    dropped.push(child);
                }
                None => merged_children.push(child),
            }
        }

        if dropped.is_empty() {
            return Ok(false);
        }
        self.record_mut(parent)?.children = merged_children;
        for key in dropped {
            self.nodes.remove(&key);
        }
        for key in grown {
            self.touch(MutationRecord::character_data(key));
        }
        self.touch(MutationRecord::child_list(parent));
        Ok(true)
    }

    // -- Payload ---

    pub fn set_text(&mut self, key: NodeKey, text: &str) -> Result<(), TreeError> {
        match &mut self.record_mut(key)?.kind {
            NodeKind::Text { text: existing } | NodeKind::Comment { text: existing } => {
                existing.clear();
                existing.push_str(text);
            }
            _ => return Err(TreeError::WrongNodeKind(key)),
        }
        self.touch(MutationRecord::character_data(key));
        Ok(())
    }

    pub fn set_attribute(
        &mut self,
        key: NodeKey,
        name: &str,
        value: Option<&str>,
    ) -> Result<(), TreeError> {
        match &mut self.record_mut(key)?.kind {
            NodeKind::Element { attributes, .. } => {
                let value = value.map(str::to_string);
                match attributes.iter_mut().find(|(k, _)| k.as_ref() == name) {
                    Some(slot) => slot.1 = value,
                    None => attributes.push((Arc::from(name), value)),
                }
            }
            _ => return Err(TreeError::WrongNodeKind(key)),
        }
        self.touch(MutationRecord::attributes(key, name));
        Ok(())
    }

    pub fn remove_attribute(&mut self, key: NodeKey, name: &str) -> Result<bool, TreeError> {
        let removed = match &mut self.record_mut(key)?.kind {
            NodeKind::Element { attributes, .. } => {
                let before = attributes.len();
                attributes.retain(|(k, _)| k.as_ref() != name);
                attributes.len() != before
            }
            _ => return Err(TreeError::WrongNodeKind(key)),
        };
        if removed {
            self.touch(MutationRecord::attributes(key, name));
        }
        Ok(removed)
    }

    pub fn set_style(&mut self, key: NodeKey, entries: Vec<StyleEntry>) -> Result<(), TreeError> {
        match &mut self.record_mut(key)?.kind {
            NodeKind::Element { style, .. } => *style = entries,
            _ => return Err(TreeError::WrongNodeKind(key)),
        }
        self.touch(MutationRecord::attributes(key, "style"));
        Ok(())
    }

    // -- Owned form ---

    /// Build `node` detached, then attach it under `parent` with a single record.
    pub fn insert_tree(&mut self, parent: NodeKey, node: &Node) -> Result<NodeKey, TreeError> {
        // Validate the parent before allocating anything.
        if !self.record(parent)?.kind.allows_children() {
            return Err(TreeError::InvalidParent(parent));
        }
        let root = self.build_detached(node)?;
        self.append_child(parent, root)?;
        Ok(root)
    }

    fn build_detached(&mut self, node: &Node) -> Result<NodeKey, TreeError> {
        let (kind, children) = match node {
            Node::Document { .. } => return Err(TreeError::DocumentNotInsertable),
            Node::Element {
                name,
                attributes,
                style,
                children,
                ..
            } => (
                NodeKind::Element {
                    name: Arc::clone(name),
                    attributes: attributes.clone(),
                    style: style.clone(),
                },
                children.as_slice(),
            ),
            Node::Text { text, .. } => (NodeKind::Text { text: text.clone() }, &[][..]),
            Node::Comment { text, .. } => (NodeKind::Comment { text: text.clone() }, &[][..]),
        };
        let key = self.alloc(kind);
        for child in children {
            let child_key = self.build_detached(child)?;
            self.record_mut(key)?.children.push(child_key);
            self.record_mut(child_key)?.parent = Some(key);
        }
        Ok(key)
    }

    pub fn materialize(&self, key: NodeKey) -> Result<Node, TreeError> {
        let record = self.record(key)?;
        let children = record
            .children
            .iter()
            .map(|child| self.materialize(*child))
            .collect::<Result<Vec<_>, _>>()?;
        let node = match &record.kind {
            NodeKind::Document => Node::Document { key, children },
            NodeKind::Element {
                name,
                attributes,
                style,
            } => Node::Element {
                key,
                name: Arc::clone(name),
                attributes: attributes.clone(),
                style: style.clone(),
                children,
            },
            NodeKind::Text { text } => Node::Text {
                key,
                text: text.clone(),
            },
            NodeKind::Comment { text } => Node::Comment {
                key,
                text: text.clone(),
            },
        };
        Ok(node)
    }
}

impl Default for ContentTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::ContentTree;
    use crate::error::TreeError;
    use crate::mutation::{MutationKind, MutationRecord};
    use crate::types::{Node, NodeKey};

    fn paragraph(tree: &mut ContentTree, text: &str) -> (NodeKey, NodeKey) {
        let p = tree
            .insert_tree(tree.document(), &Node::element("p", vec![Node::text(text)]))
            .expect("insert paragraph");
        let leaf = tree.children(p)[0];
        (p, leaf)
    }

    #[test]
    fn detached_building_is_silent_until_attached() {
        let mut tree = ContentTree::new();
        let div = tree.create_element("div", Vec::new());
        let text = tree.create_text("hello");
        tree.append_child(div, text).unwrap();
        assert!(!tree.has_pending_records());

        let doc = tree.document();
        tree.append_child(doc, div).unwrap();
        assert_eq!(tree.take_records(), vec![MutationRecord::child_list(doc)]);
    }

    #[test]
    fn set_text_records_character_data_even_when_unchanged() {
        let mut tree = ContentTree::new();
        let (_, leaf) = paragraph(&mut tree, "same");
        tree.take_records();
        tree.set_text(leaf, "same").unwrap();
        let records = tree.take_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, MutationKind::CharacterData);
        assert_eq!(records[0].target, leaf);
    }

    #[test]
    fn cycles_and_double_parents_are_rejected() {
        let mut tree = ContentTree::new();
        let (p, leaf) = paragraph(&mut tree, "x");
        let span = tree.create_element("span", Vec::new());
        tree.append_child(p, span).unwrap();
        assert_eq!(
            tree.append_child(span, p),
            Err(TreeError::CycleDetected {
                parent: span,
                child: p
            })
        );
        assert_eq!(tree.append_child(span, leaf), Err(TreeError::InvalidParent(leaf)));
        assert_eq!(tree.append_child(leaf, span), Err(TreeError::InvalidParent(leaf)));
    }

    #[test]
    fn replace_with_splices_in_order_and_drops_old() {
        let mut tree = ContentTree::new();
        let p = tree
            .insert_tree(
                tree.document(),
                &Node::element(
                    "p",
                    vec![Node::text("a"), Node::text("old"), Node::text("z")],
                ),
            )
            .unwrap();
        let old = tree.children(p)[1];
        let first = tree.create_text("b");
        let second = tree.create_text("c");
        tree.replace_with(old, &[first, second]).unwrap();

        assert!(!tree.is_live(old));
        assert_eq!(tree.children(p).len(), 4);
        assert_eq!(tree.children(p)[1], first);
        assert_eq!(tree.children(p)[2], second);
        assert_eq!(tree.text_content(p), "abcz");
    }

    #[test]
    fn replace_with_rejects_attached_replacement() {
        let mut tree = ContentTree::new();
        let (p, leaf) = paragraph(&mut tree, "x");
        let (_, other) = paragraph(&mut tree, "y");
        assert_eq!(tree.replace_with(leaf, &[other]), Err(TreeError::InvalidParent(other)));
        assert_eq!(tree.children(p), &[leaf]);
    }

    #[test]
    fn merge_text_children_joins_runs_and_drops_empty() {
        let mut tree = ContentTree::new();
        let p = tree
            .insert_tree(
                tree.document(),
                &Node::element(
                    "p",
                    vec![
                        Node::text("Hel"),
                        Node::text(""),
                        Node::text("lo "),
                        Node::element("b", vec![Node::text("big")]),
                        Node::text(""),
                    ],
                ),
            )
            .unwrap();
        let before = tree.len();
        assert!(tree.merge_text_children(p).unwrap());
        assert_eq!(tree.children(p).len(), 2);
        assert_eq!(tree.text(tree.children(p)[0]), Some("Hello "));
        assert_eq!(tree.len(), before - 3);
        assert!(!tree.merge_text_children(p).unwrap());
    }

    #[test]
    fn nearest_element_fails_closed_under_document() {
        let mut tree = ContentTree::new();
        let doc = tree.document();
        let loose = tree.create_text("loose");
        tree.append_child(doc, loose).unwrap();
        assert_eq!(tree.nearest_element(loose), None);
        assert_eq!(tree.nearest_element(doc), None);

        let (p, leaf) = paragraph(&mut tree, "x");
        assert_eq!(tree.nearest_element(leaf), Some(p));
        assert_eq!(tree.nearest_element(p), Some(p));
        assert_eq!(tree.nearest_element(NodeKey(999)), None);
    }

    #[test]
    fn materialize_round_trips_inserted_tree() {
        let mut tree = ContentTree::new();
        let input = Node::element_with_attrs(
            "section",
            &[("id", "main")],
            vec![Node::text("a"), Node::comment("c"), Node::element("em", vec![])],
        );
        let root = tree.insert_tree(tree.document(), &input).unwrap();
        let out = tree.materialize(root).unwrap();
        assert_eq!(out.key(), root);
        assert_eq!(out.attr("id"), Some("main"));
        assert_eq!(out.children().len(), 3);
        assert_eq!(
            tree.insert_tree(root, &Node::Document { key: NodeKey::INVALID, children: vec![] }),
            Err(TreeError::DocumentNotInsertable)
        );
    }

    #[test]
    fn removed_subtrees_are_dropped_and_recorded_on_parent() {
        let mut tree = ContentTree::new();
        let (p, leaf) = paragraph(&mut tree, "x");
        tree.take_records();
        tree.remove(p).unwrap();
        assert!(!tree.is_live(p));
        assert!(!tree.is_live(leaf));
        assert_eq!(tree.take_records(), vec![MutationRecord::child_list(tree.document())]);
        assert_eq!(tree.remove(tree.document()), Err(TreeError::InvalidParent(tree.document())));
    }

    #[test]
    fn attributes_update_in_place() {
        let mut tree = ContentTree::new();
        let (p, leaf) = paragraph(&mut tree, "x");
        tree.set_attribute(p, "class", Some("a")).unwrap();
        tree.set_attribute(p, "class", Some("b")).unwrap();
        assert_eq!(tree.attr(p, "class"), Some("b"));
        assert!(tree.remove_attribute(p, "class").unwrap());
        assert!(!tree.remove_attribute(p, "class").unwrap());
        assert_eq!(tree.set_attribute(leaf, "class", None), Err(TreeError::WrongNodeKind(leaf)));
    }
}
