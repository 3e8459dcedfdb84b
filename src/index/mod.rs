//! Annotation index
//!
//! [`AnnotationIndex`] owns the annotation records of one document. Every
//! mutation goes through `add`/`remove`, which wrap or unwrap text in the
//! document and then rebase the stored paths of the annotations that follow
//! the edit.

mod rebase;
mod store;
mod types;

pub use store::AnnotationIndex;
pub use types::{Annotation, Selection};
