//! Document adapter trait
//!
//! The primitives the annotation core needs from a host tree. Node handles
//! only have to stay valid for the duration of one core operation; anything
//! stored between operations is a [`NodePath`].

use std::fmt::Debug;

use super::types::{NodeKind, UnwrapOutcome, WrapOutcome, WrapperTag};
use crate::error::{AnchorError, Result};
use crate::path::NodePath;

/// Host document interface
pub trait DocumentAdapter {
    /// Node handle
    type Node: Copy + Eq + Debug;

    /// The document root
    fn root(&self) -> Self::Node;

    /// Parent of `node`, `None` for the root and detached nodes
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Children of `node` in order
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    /// The `index`-th child of `node`
    fn child(&self, node: Self::Node, index: usize) -> Option<Self::Node>;

    /// Kind of `node`
    fn kind(&self, node: Self::Node) -> NodeKind;

    /// Text of a text leaf, `None` for other kinds
    fn text(&self, node: Self::Node) -> Option<&str>;

    fn is_leaf(&self, node: Self::Node) -> bool {
        self.kind(node) == NodeKind::Text
    }

    /// Isolate chars `[start, end)` of a text leaf in a new wrapper holding
    /// exactly one text child. Empty remainders are not created.
    fn wrap(
        &mut self,
        node: Self::Node,
        start: usize,
        end: usize,
        tag: WrapperTag,
    ) -> Result<WrapOutcome<Self::Node>>;

    /// Remove a wrapper, merging its text with adjacent text siblings into a
    /// single leaf
    fn unwrap(&mut self, wrapper: Self::Node) -> Result<UnwrapOutcome<Self::Node>>;

    /// Replace the tag carried by a wrapper
    fn retag(&mut self, wrapper: Self::Node, tag: WrapperTag) -> Result<()>;

    /// Position of `node` among its parent's children
    fn index_in_parent(&self, node: Self::Node) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|&child| child == node)
    }

    /// Dereference a node path
    fn resolve(&self, path: &NodePath) -> Result<Self::Node> {
        let mut node = self.root();
        for &step in path.steps() {
            node = self
                .child(node, step)
                .ok_or_else(|| AnchorError::StaleAddress(path.clone()))?;
        }
        Ok(node)
    }

    /// Path of `node`, computed by walking to the root
    fn path_of(&self, node: Self::Node) -> NodePath {
        let mut steps = Vec::new();
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            steps.push(self.index_in_parent(current).unwrap_or(0));
            current = parent;
        }
        steps.reverse();
        NodePath::new(steps)
    }

    /// Text leaves under `node` in pre-order, empty texts excluded
    fn all_leaves_under(&self, node: Self::Node) -> Vec<Self::Node> {
        let mut leaves = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if self.is_leaf(current) {
                if self.text(current).is_some_and(|t| !t.is_empty()) {
                    leaves.push(current);
                }
            } else {
                stack.extend(self.children(current).into_iter().rev());
            }
        }
        leaves
    }

    /// The wrapper directly enclosing a text leaf, if any
    fn enclosing_wrapper(&self, leaf: Self::Node) -> Option<Self::Node> {
        let parent = self.parent(leaf)?;
        match self.kind(parent) {
            NodeKind::Wrapper(_) => Some(parent),
            _ => None,
        }
    }

    /// Closest ancestor-or-self that is a wrapper
    fn wrapper_ancestor(&self, node: Self::Node) -> Option<(Self::Node, WrapperTag)> {
        let mut current = Some(node);
        while let Some(n) = current {
            if let NodeKind::Wrapper(tag) = self.kind(n) {
                return Some((n, tag));
            }
            current = self.parent(n);
        }
        None
    }
}
