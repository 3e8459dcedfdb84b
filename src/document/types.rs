//! Document node types shared by every adapter

use serde::{Deserialize, Serialize};

/// Annotation id and leaf index carried by a wrapper node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrapperTag {
    /// Id of the owning annotation
    pub annotation: usize,
    /// Index of this leaf within the annotation's `leaf_paths`
    pub sub_index: usize,
}

impl WrapperTag {
    const PENDING: usize = usize::MAX;

    pub fn new(annotation: usize, sub_index: usize) -> Self {
        Self {
            annotation,
            sub_index,
        }
    }

    /// Tag for a wrapper whose annotation has not been assigned an id yet
    pub fn pending(sub_index: usize) -> Self {
        Self::new(Self::PENDING, sub_index)
    }

    pub fn is_pending(&self) -> bool {
        self.annotation == Self::PENDING
    }
}

/// Kind of a document node, as seen by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Text-bearing leaf
    Text,
    /// Wrapper isolating one annotated text fragment
    Wrapper(WrapperTag),
    /// Any other structural node (the root included)
    Element,
}

/// Result of wrapping part of a text leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapOutcome<N> {
    /// The new wrapper node
    pub wrapper: N,
    /// Sibling slots added to the parent: one per non-empty remainder (0-2)
    pub inserted: usize,
    /// Characters of the original leaf up to the end of the wrapped range
    pub consumed: usize,
    /// Index in the parent of the first sibling after the edited region
    pub next_index: usize,
}

/// Result of removing a wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnwrapOutcome<N> {
    /// The text leaf the wrapper's text merged into
    pub merged: Option<N>,
    /// Sibling slots removed from the parent
    pub removed: usize,
    /// Characters of the merged leaf that precede the former right neighbor
    pub absorbed: usize,
    /// Whether a text sibling to the right was merged
    pub merged_right: bool,
    /// Index in the parent of the first sibling after the merged leaf
    pub next_index: usize,
}
