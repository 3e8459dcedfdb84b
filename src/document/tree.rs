//! Arena-backed reference document
//!
//! Nodes live in a `Vec` and refer to each other by [`NodeId`]. Removed nodes
//! are detached (no parent) but keep their slot, so an id never changes
//! meaning until [`Document::compact`] drops the detached slots.

use super::traits::DocumentAdapter;
use super::types::{NodeKind, UnwrapOutcome, WrapOutcome, WrapperTag};
use crate::error::{AnchorError, Result};
use crate::text::{char_len, split_chars};

/// Compact node identifier (index into the arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Arena slot of this node
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub(crate) enum NodeData {
    Element {
        name: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
    Wrapper(WrapperTag),
}

#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub(crate) data: NodeData,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

/// Mutable document tree of elements, text leaves and annotation wrappers.
///
/// Every wrap and unwrap allocates fresh slots and leaves the replaced ones
/// detached, so a long-lived document that sees many edits should be
/// compacted now and then. Annotation paths survive compaction; node ids do
/// not.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) nodes: Vec<Slot>,
}

const ROOT: NodeId = NodeId(0);
const ROOT_NAME: &str = "#document";

impl Document {
    /// Create an empty document (a bare root)
    pub fn new() -> Self {
        Self {
            nodes: vec![Slot {
                data: NodeData::Element {
                    name: ROOT_NAME.to_string(),
                    attributes: Vec::new(),
                },
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Append an element under `parent`
    pub fn append_element(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        self.append_element_with_attributes(parent, name, Vec::new())
    }

    /// Append an element with attributes under `parent`
    pub fn append_element_with_attributes(
        &mut self,
        parent: NodeId,
        name: &str,
        attributes: Vec<(String, String)>,
    ) -> Result<NodeId> {
        self.check_container(parent)?;
        let id = self.alloc(
            NodeData::Element {
                name: name.to_string(),
                attributes,
            },
            Some(parent),
        );
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Append text under `parent`, merging with a trailing text sibling.
    ///
    /// Returns the leaf now holding the text; empty text creates nothing.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<Option<NodeId>> {
        self.check_container(parent)?;
        if let Some(&last) = self.nodes[parent.0].children.last() {
            if let NodeData::Text(existing) = &mut self.nodes[last.0].data {
                existing.push_str(text);
                return Ok(Some(last));
            }
        }
        if text.is_empty() {
            return Ok(None);
        }
        let id = self.alloc(NodeData::Text(text.to_string()), Some(parent));
        self.nodes[parent.0].children.push(id);
        Ok(Some(id))
    }

    /// Element name, `None` for text and wrappers
    pub fn element_name(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Concatenated text of every leaf, wrappers included
    pub fn text_content(&self) -> String {
        self.all_leaves_under(ROOT)
            .into_iter()
            .filter_map(|leaf| self.text(leaf))
            .collect()
    }

    /// Texts of the leaves in document order (empty leaves excluded)
    pub fn leaf_texts(&self) -> Vec<String> {
        self.all_leaves_under(ROOT)
            .into_iter()
            .filter_map(|leaf| self.text(leaf).map(str::to_string))
            .collect()
    }

    /// Number of nodes reachable from the root, root included
    pub fn attached_len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![ROOT];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(self.nodes[node.0].children.iter().copied());
        }
        count
    }

    /// Number of arena slots, detached ones included
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Rebuild the arena from the nodes reachable from the root.
    ///
    /// The tree shape is unchanged but every [`NodeId`] obtained earlier is
    /// invalidated.
    pub fn compact(&mut self) {
        let before = self.nodes.len();
        let mut old = std::mem::take(&mut self.nodes);
        let mut nodes: Vec<Slot> = Vec::new();

        // Pre-order, so a parent's new id exists before its children
        let mut stack = vec![(ROOT, None::<NodeId>)];
        while let Some((node, parent)) = stack.pop() {
            let id = NodeId(nodes.len());
            let slot = &mut old[node.0];
            let data = std::mem::replace(&mut slot.data, NodeData::Text(String::new()));
            let children = std::mem::take(&mut slot.children);
            nodes.push(Slot {
                data,
                parent,
                children: Vec::new(),
            });
            if let Some(parent) = parent {
                nodes[parent.0].children.push(id);
            }
            stack.extend(children.into_iter().rev().map(|child| (child, Some(id))));
        }

        tracing::debug!(before = before, after = nodes.len(), "Compacted document arena");
        self.nodes = nodes;
    }

    fn alloc(&mut self, data: NodeData, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Slot {
            data,
            parent,
            children: Vec::new(),
        });
        id
    }

    fn slot(&self, node: NodeId) -> Result<&Slot> {
        self.nodes
            .get(node.0)
            .ok_or_else(|| AnchorError::DetachedNode(format!("{:?}", node)))
    }

    fn check_container(&self, node: NodeId) -> Result<()> {
        match self.slot(node)?.data {
            NodeData::Element { .. } => Ok(()),
            _ => Err(AnchorError::InvalidSpan(format!(
                "{:?} cannot hold children",
                node
            ))),
        }
    }

    /// Parent and position of an attached node
    fn placement(&self, node: NodeId) -> Result<(NodeId, usize)> {
        let parent = self
            .slot(node)?
            .parent
            .ok_or_else(|| AnchorError::DetachedNode(format!("{:?}", node)))?;
        let index = self.nodes[parent.0]
            .children
            .iter()
            .position(|&child| child == node)
            .ok_or_else(|| AnchorError::DetachedNode(format!("{:?}", node)))?;
        Ok((parent, index))
    }

    fn text_of(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    fn detach(&mut self, node: NodeId) {
        self.nodes[node.0].parent = None;
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentAdapter for Document {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        ROOT
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node.0)
            .map(|slot| slot.children.clone())
            .unwrap_or_default()
    }

    fn child(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.nodes.get(node.0)?.children.get(index).copied()
    }

    fn kind(&self, node: NodeId) -> NodeKind {
        match self.nodes.get(node.0).map(|slot| &slot.data) {
            Some(NodeData::Text(_)) => NodeKind::Text,
            Some(NodeData::Wrapper(tag)) => NodeKind::Wrapper(*tag),
            Some(NodeData::Element { .. }) | None => NodeKind::Element,
        }
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        self.text_of(node)
    }

    fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        self.placement(node).ok().map(|(_, index)| index)
    }

    fn wrap(
        &mut self,
        node: NodeId,
        start: usize,
        end: usize,
        tag: WrapperTag,
    ) -> Result<WrapOutcome<NodeId>> {
        let Some(text) = self.text_of(node) else {
            return Err(AnchorError::InvalidSpan(format!(
                "{:?} is not a text leaf",
                node
            )));
        };
        let len = char_len(text);
        if start >= end || end > len {
            return Err(AnchorError::InvalidSpan(format!(
                "cannot wrap [{}, {}) of a {}-char leaf",
                start, end, len
            )));
        }
        let (head, middle, tail) = split_chars(text, start, end);
        let (head, middle, tail) = (head.to_string(), middle.to_string(), tail.to_string());
        let (parent, index) = self.placement(node)?;

        let wrapper = self.alloc(NodeData::Wrapper(tag), Some(parent));
        let inner = self.alloc(NodeData::Text(middle), Some(wrapper));
        self.nodes[wrapper.0].children.push(inner);

        let mut replacement = Vec::with_capacity(3);
        if head.is_empty() {
            self.detach(node);
        } else {
            self.nodes[node.0].data = NodeData::Text(head);
            replacement.push(node);
        }
        replacement.push(wrapper);
        if !tail.is_empty() {
            replacement.push(self.alloc(NodeData::Text(tail), Some(parent)));
        }

        let inserted = replacement.len() - 1;
        self.nodes[parent.0]
            .children
            .splice(index..=index, replacement);

        Ok(WrapOutcome {
            wrapper,
            inserted,
            consumed: end,
            next_index: index + inserted + 1,
        })
    }

    fn unwrap(&mut self, wrapper: NodeId) -> Result<UnwrapOutcome<NodeId>> {
        if !matches!(self.slot(wrapper)?.data, NodeData::Wrapper(_)) {
            return Err(AnchorError::NotAWrapper(self.path_of(wrapper)));
        }
        let (parent, index) = self.placement(wrapper)?;

        let inner: String = self.nodes[wrapper.0]
            .children
            .iter()
            .filter_map(|&child| self.text_of(child))
            .collect();

        let siblings = &self.nodes[parent.0].children;
        let left = index
            .checked_sub(1)
            .map(|i| siblings[i])
            .filter(|&n| self.text_of(n).is_some());
        let right = siblings
            .get(index + 1)
            .copied()
            .filter(|&n| self.text_of(n).is_some());

        let left_text = left.and_then(|n| self.text_of(n)).unwrap_or_default();
        let right_text = right.and_then(|n| self.text_of(n)).unwrap_or_default();
        let absorbed = char_len(left_text) + char_len(&inner);
        let merged_text = format!("{}{}{}", left_text, inner, right_text);

        let first = index - usize::from(left.is_some());
        let last = index + usize::from(right.is_some());

        for child in self.nodes[wrapper.0].children.clone() {
            self.detach(child);
        }
        self.detach(wrapper);
        for node in [left, right].into_iter().flatten() {
            self.detach(node);
        }

        let merged = if merged_text.is_empty() {
            None
        } else {
            Some(self.alloc(NodeData::Text(merged_text), Some(parent)))
        };
        let replacement: Vec<NodeId> = merged.into_iter().collect();
        let removed = (last - first + 1) - replacement.len();
        self.nodes[parent.0]
            .children
            .splice(first..=last, replacement);

        Ok(UnwrapOutcome {
            merged,
            removed,
            absorbed,
            merged_right: right.is_some(),
            next_index: first + usize::from(merged.is_some()),
        })
    }

    fn retag(&mut self, wrapper: NodeId, tag: WrapperTag) -> Result<()> {
        if let Some(NodeData::Wrapper(current)) =
            self.nodes.get_mut(wrapper.0).map(|slot| &mut slot.data)
        {
            *current = tag;
            return Ok(());
        }
        Err(AnchorError::NotAWrapper(self.path_of(wrapper)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::NodePath;

    /// `<p>` with the given text children separated by `<br>` elements
    fn paragraph(parts: &[&str]) -> (Document, NodeId) {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p").unwrap();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                doc.append_element(p, "br").unwrap();
            }
            doc.append_text(p, part).unwrap();
        }
        (doc, p)
    }

    #[test]
    fn test_append_text_coalesces() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p").unwrap();
        let a = doc.append_text(p, "Hello ").unwrap();
        let b = doc.append_text(p, "world").unwrap();
        assert_eq!(a, b);
        assert_eq!(doc.children(p).len(), 1);
        assert_eq!(doc.append_text(doc.root(), "").unwrap(), None);
        assert_eq!(doc.text_content(), "Hello world");
    }

    #[test]
    fn test_wrap_middle() {
        let (mut doc, p) = paragraph(&["abcdef"]);
        let leaf = doc.child(p, 0).unwrap();
        let outcome = doc.wrap(leaf, 2, 4, WrapperTag::new(0, 0)).unwrap();

        assert_eq!(outcome.inserted, 2);
        assert_eq!(outcome.consumed, 4);
        assert_eq!(outcome.next_index, 3);
        assert_eq!(doc.leaf_texts(), vec!["ab", "cd", "ef"]);
        assert_eq!(doc.kind(outcome.wrapper), NodeKind::Wrapper(WrapperTag::new(0, 0)));
        assert_eq!(doc.path_of(outcome.wrapper), NodePath::new(vec![0, 1]));
        assert_eq!(doc.children(outcome.wrapper).len(), 1);
    }

    #[test]
    fn test_wrap_omits_empty_remainders() {
        let (mut doc, p) = paragraph(&["abc"]);
        let leaf = doc.child(p, 0).unwrap();
        let outcome = doc.wrap(leaf, 0, 3, WrapperTag::pending(0)).unwrap();
        assert_eq!(outcome.inserted, 0);
        assert_eq!(outcome.next_index, 1);
        assert_eq!(doc.children(p), vec![outcome.wrapper]);

        let (mut doc, p) = paragraph(&["abc"]);
        let leaf = doc.child(p, 0).unwrap();
        let outcome = doc.wrap(leaf, 1, 3, WrapperTag::pending(0)).unwrap();
        assert_eq!(outcome.inserted, 1);
        assert_eq!(doc.leaf_texts(), vec!["a", "bc"]);
    }

    #[test]
    fn test_wrap_rejects_bad_ranges() {
        let (mut doc, p) = paragraph(&["abc"]);
        let leaf = doc.child(p, 0).unwrap();
        assert!(doc.wrap(leaf, 2, 2, WrapperTag::pending(0)).is_err());
        assert!(doc.wrap(leaf, 1, 4, WrapperTag::pending(0)).is_err());
        assert!(doc.wrap(p, 0, 1, WrapperTag::pending(0)).is_err());
    }

    #[test]
    fn test_wrap_counts_chars() {
        let (mut doc, p) = paragraph(&["naïve café"]);
        let leaf = doc.child(p, 0).unwrap();
        doc.wrap(leaf, 6, 10, WrapperTag::pending(0)).unwrap();
        assert_eq!(doc.leaf_texts(), vec!["naïve ", "café"]);
    }

    #[test]
    fn test_unwrap_restores_single_leaf() {
        let (mut doc, p) = paragraph(&["abcdef"]);
        let leaf = doc.child(p, 0).unwrap();
        let wrapped = doc.wrap(leaf, 2, 4, WrapperTag::new(0, 0)).unwrap();

        let outcome = doc.unwrap(wrapped.wrapper).unwrap();
        assert_eq!(outcome.removed, 2);
        assert_eq!(outcome.absorbed, 4);
        assert!(outcome.merged_right);
        assert_eq!(outcome.next_index, 1);
        assert_eq!(doc.leaf_texts(), vec!["abcdef"]);
        assert_eq!(doc.children(p).len(), 1);
    }

    #[test]
    fn test_unwrap_next_to_element() {
        let (mut doc, p) = paragraph(&["abc", "def"]);
        let leaf = doc.child(p, 0).unwrap();
        let wrapped = doc.wrap(leaf, 1, 3, WrapperTag::new(0, 0)).unwrap();
        assert_eq!(doc.children(p).len(), 4);

        let outcome = doc.unwrap(wrapped.wrapper).unwrap();
        assert_eq!(outcome.removed, 1);
        assert!(!outcome.merged_right);
        assert_eq!(outcome.next_index, 1);
        assert_eq!(doc.leaf_texts(), vec!["abc", "def"]);
        assert_eq!(doc.element_name(doc.child(p, 1).unwrap()), Some("br"));
    }

    #[test]
    fn test_unwrap_rejects_plain_nodes() {
        let (mut doc, p) = paragraph(&["abc"]);
        assert!(matches!(doc.unwrap(p), Err(AnchorError::NotAWrapper(_))));
    }

    #[test]
    fn test_resolve_and_path_of() {
        let (doc, p) = paragraph(&["one", "two"]);
        let two = doc.child(p, 2).unwrap();
        let path = doc.path_of(two);
        assert_eq!(path, NodePath::new(vec![0, 2]));
        assert_eq!(doc.resolve(&path).unwrap(), two);
        assert!(matches!(
            doc.resolve(&NodePath::new(vec![0, 9])),
            Err(AnchorError::StaleAddress(_))
        ));
    }

    #[test]
    fn test_all_leaves_under_preorder() {
        let mut doc = Document::new();
        let root = doc.root();
        let p = doc.append_element(root, "p").unwrap();
        doc.append_text(p, "a").unwrap();
        let b = doc.append_element(p, "b").unwrap();
        doc.append_text(b, "b").unwrap();
        doc.append_element(p, "i").unwrap();
        doc.append_text(p, "c").unwrap();
        let q = doc.append_element(root, "p").unwrap();
        doc.append_text(q, "d").unwrap();

        assert_eq!(doc.leaf_texts(), vec!["a", "b", "c", "d"]);
        assert_eq!(doc.all_leaves_under(b).len(), 1);
    }

    #[test]
    fn test_detached_nodes_are_unreachable() {
        let (mut doc, p) = paragraph(&["abcdef"]);
        let before = doc.attached_len();
        let leaf = doc.child(p, 0).unwrap();
        let wrapped = doc.wrap(leaf, 0, 6, WrapperTag::pending(0)).unwrap();
        assert_eq!(doc.parent(leaf), None);
        doc.unwrap(wrapped.wrapper).unwrap();
        assert_eq!(doc.attached_len(), before);
    }

    #[test]
    fn test_compact_drops_detached_slots() {
        let (mut doc, p) = paragraph(&["abcdef", "ghi"]);
        let markup = doc.to_markup(&crate::config::MarkupConfig::default());
        for _ in 0..10 {
            let leaf = doc.child(p, 0).unwrap();
            let wrapped = doc.wrap(leaf, 1, 4, WrapperTag::new(0, 0)).unwrap();
            doc.unwrap(wrapped.wrapper).unwrap();
        }
        let leaf = doc.child(p, 2).unwrap();
        doc.wrap(leaf, 0, 2, WrapperTag::new(0, 0)).unwrap();
        assert!(doc.arena_len() > doc.attached_len());

        let leaves = doc.leaf_texts();
        let wrapper_path = NodePath::new(vec![0, 2]);
        doc.compact();
        assert_eq!(doc.arena_len(), doc.attached_len());
        assert_eq!(doc.leaf_texts(), leaves);
        assert_eq!(
            doc.kind(doc.resolve(&wrapper_path).unwrap()),
            NodeKind::Wrapper(WrapperTag::new(0, 0))
        );

        let wrapper = doc.resolve(&wrapper_path).unwrap();
        doc.unwrap(wrapper).unwrap();
        doc.compact();
        assert_eq!(doc.to_markup(&crate::config::MarkupConfig::default()), markup);
        assert_eq!(doc.arena_len(), doc.attached_len());
    }
}
