//! Document adapter and the arena reference document
//!
//! The annotation core only talks to a tree through [`DocumentAdapter`].
//! [`Document`] is the in-crate implementation used by the CLI and tests; it
//! can be built node by node or parsed from XHTML.

mod markup;
mod traits;
mod tree;
mod types;

pub use traits::DocumentAdapter;
pub use tree::{Document, NodeId};
pub use types::{NodeKind, UnwrapOutcome, WrapOutcome, WrapperTag};
