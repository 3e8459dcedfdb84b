//! Node path types
//!
//! A node path is the list of child indices leading from the document root
//! to a node. Node handles are not assumed to survive a re-scan of the host
//! document, so paths are the only address stored between operations.
//!
//! Format: `/0/2/1`
//! - `/0` - first child of the root
//! - `/2` - third child of that node
//! - `/1` - second child of that node

use serde::{Deserialize, Serialize};
use std::fmt;

/// Child-index path from the document root to a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath {
    steps: Vec<usize>,
}

impl NodePath {
    /// The path of the document root (no steps)
    pub fn root() -> Self {
        Self { steps: Vec::new() }
    }

    /// Create a path from child indices
    pub fn new(steps: Vec<usize>) -> Self {
        Self { steps }
    }

    /// Child indices, outermost first
    pub fn steps(&self) -> &[usize] {
        &self.steps
    }

    /// Number of steps; also the index of the component that addresses
    /// this node's children
    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// Path of the parent node, `None` for the root
    pub fn parent(&self) -> Option<NodePath> {
        if self.steps.is_empty() {
            return None;
        }
        Some(Self {
            steps: self.steps[..self.steps.len() - 1].to_vec(),
        })
    }

    /// Index of this node within its parent
    pub fn last(&self) -> Option<usize> {
        self.steps.last().copied()
    }

    /// Path of the `index`-th child of this node
    pub fn child(&self, index: usize) -> NodePath {
        let mut steps = Vec::with_capacity(self.steps.len() + 1);
        steps.extend_from_slice(&self.steps);
        steps.push(index);
        Self { steps }
    }

    /// Append a step
    pub fn push(&mut self, index: usize) {
        self.steps.push(index);
    }

    /// Whether `self` is a proper prefix of `other`
    pub fn is_ancestor_of(&self, other: &NodePath) -> bool {
        self.steps.len() < other.steps.len() && other.steps.starts_with(&self.steps)
    }

    /// Add `delta` to the component at `depth`.
    ///
    /// Returns `false` (leaving the path untouched) when the path is too
    /// short or the component would become negative.
    pub fn shift(&mut self, depth: usize, delta: isize) -> bool {
        let Some(step) = self.steps.get_mut(depth) else {
            return false;
        };
        match step.checked_add_signed(delta) {
            Some(shifted) => {
                *step = shifted;
                true
            }
            None => false,
        }
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(steps: Vec<usize>) -> Self {
        Self::new(steps)
    }
}

impl AsRef<[usize]> for NodePath {
    fn as_ref(&self) -> &[usize] {
        &self.steps
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return write!(f, "/");
        }
        for step in &self.steps {
            write!(f, "/{}", step)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(NodePath::root().to_string(), "/");
        assert_eq!(NodePath::new(vec![0, 2, 1]).to_string(), "/0/2/1");
    }

    #[test]
    fn test_parent_and_child() {
        let path = NodePath::new(vec![0, 2, 1]);
        assert_eq!(path.parent(), Some(NodePath::new(vec![0, 2])));
        assert_eq!(path.last(), Some(1));
        assert_eq!(NodePath::root().parent(), None);
        assert_eq!(NodePath::new(vec![0, 2]).child(1), path);
    }

    #[test]
    fn test_is_ancestor_of() {
        let a = NodePath::new(vec![0, 2]);
        let b = NodePath::new(vec![0, 2, 1]);
        assert!(a.is_ancestor_of(&b));
        assert!(!b.is_ancestor_of(&a));
        assert!(!a.is_ancestor_of(&a));
        assert!(NodePath::root().is_ancestor_of(&a));
    }

    #[test]
    fn test_shift() {
        let mut path = NodePath::new(vec![0, 3, 1]);
        assert!(path.shift(1, 2));
        assert_eq!(path.steps(), &[0, 5, 1]);
        assert!(path.shift(1, -5));
        assert_eq!(path.steps(), &[0, 0, 1]);

        // Negative results and missing components are refused
        assert!(!path.shift(1, -1));
        assert!(!path.shift(7, 1));
        assert_eq!(path.steps(), &[0, 0, 1]);
    }

    #[test]
    fn test_serializes_as_integer_array() {
        let path = NodePath::new(vec![0, 4, 2]);
        assert_eq!(serde_json::to_string(&path).unwrap(), "[0,4,2]");
        let back: NodePath = serde_json::from_str("[0,4,2]").unwrap();
        assert_eq!(back, path);
    }
}
