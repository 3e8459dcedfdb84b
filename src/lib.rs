//! Span Anchor
//!
//! Keeps annotated text spans anchored inside a mutable document tree.
//! Each annotation wraps its text in dedicated wrapper nodes and records
//! their [`NodePath`]s; adding or removing an annotation rebases the stored
//! paths and offsets of every annotation after it. When only the annotation
//! texts survive, [`AnnotationIndex::recover`] finds them again by
//! whitespace- and case-tolerant search.
//!
//! # Usage
//!
//! ```
//! use span_anchor::{AnnotationIndex, Document, MarkupConfig};
//!
//! let mut doc = Document::from_xhtml("<p>Call me Ishmael.</p>").unwrap();
//! let mut index = AnnotationIndex::default();
//!
//! let missing = index.recover(&mut doc, ["ishmael"]).unwrap();
//! assert!(missing.is_none());
//! assert_eq!(index.get(0).unwrap().text, "Ishmael");
//!
//! let markup = doc.to_markup(&MarkupConfig::default());
//! assert!(markup.contains(r#"data-annotation-id="0""#));
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod path;
pub mod recovery;
pub mod text;

pub use config::{AnchorConfig, LeafBoundary, MarkupConfig};
pub use document::{Document, DocumentAdapter, NodeId, NodeKind, WrapperTag};
pub use error::{AnchorError, Result};
pub use index::{Annotation, AnnotationIndex, Selection};
pub use path::NodePath;
pub use recovery::RecoveredSpan;
