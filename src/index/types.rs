//! Annotation records

use serde::{Deserialize, Serialize};

use crate::path::NodePath;

/// A registered annotation
///
/// `start_offset` counts chars of plain text immediately preceding the first
/// wrapper within its original leaf; `end_offset` is local to the last leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Dense, document-ordered id (equal to the record's position)
    pub id: usize,
    /// The literal text as supplied at creation
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
    /// Path of every wrapper, in document order
    pub leaf_paths: Vec<NodePath>,
}

impl Annotation {
    pub fn first_path(&self) -> Option<&NodePath> {
        self.leaf_paths.first()
    }

    pub fn last_path(&self) -> Option<&NodePath> {
        self.leaf_paths.last()
    }

    pub fn is_single_leaf(&self) -> bool {
        self.leaf_paths.len() == 1
    }
}

/// A user selection expressed as two text-leaf endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Path of the leaf where the selection starts
    pub start: NodePath,
    /// Char offset within the start leaf
    pub start_offset: usize,
    /// Path of the leaf where the selection ends
    pub end: NodePath,
    /// Char offset within the end leaf (exclusive)
    pub end_offset: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_serialization() {
        let annotation = Annotation {
            id: 2,
            text: "Ishmael".to_string(),
            start_offset: 8,
            end_offset: 15,
            leaf_paths: vec![NodePath::new(vec![0, 1, 1])],
        };

        let json = serde_json::to_string(&annotation).unwrap();
        assert_eq!(
            json,
            r#"{"id":2,"text":"Ishmael","startOffset":8,"endOffset":15,"leafPaths":[[0,1,1]]}"#
        );

        let back: Annotation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, annotation);
        assert!(back.is_single_leaf());
        assert_eq!(back.first_path(), back.last_path());
    }
}
