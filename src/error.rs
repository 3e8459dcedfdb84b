//! Error types for span anchoring

use thiserror::Error;

use crate::path::{NodePath, PathParseError};

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, AnchorError>;

/// Anchoring error type
#[derive(Error, Debug)]
pub enum AnchorError {
    /// The text covered by the given leaves and offsets disagrees with the
    /// expected literal. Nothing was mutated; callers usually fall back to
    /// recovery.
    #[error("Span text mismatch: expected {expected:?}, found {found:?}")]
    SpanMismatch { expected: String, found: String },

    /// A stored node path no longer resolves against the document
    #[error("Stale address: {0}")]
    StaleAddress(NodePath),

    #[error("Invalid span: {0}")]
    InvalidSpan(String),

    /// The leaf at this path already belongs to an annotation
    #[error("Span overlaps an existing annotation at {0}")]
    Overlap(NodePath),

    #[error("Unknown annotation: {0}")]
    UnknownAnnotation(usize),

    #[error("Not an annotation wrapper: {0}")]
    NotAWrapper(NodePath),

    #[error("Node is not attached to the document: {0}")]
    DetachedNode(String),

    /// Index bookkeeping no longer matches the document. This is a logic
    /// error in the rebaser, not bad input.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("XHTML parse error: {0}")]
    Parse(#[from] roxmltree::Error),

    #[error("Invalid node path: {0}")]
    PathParse(#[from] PathParseError),
}
