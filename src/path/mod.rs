//! Node addressing
//!
//! Node paths address nodes by child position from the document root. They
//! are re-resolved against the live tree on demand and kept current by the
//! rebaser whenever an annotation changes a parent's child list.
//!
//! # Usage
//!
//! ```
//! use span_anchor::path::{is_before, NodePath};
//!
//! let a: NodePath = "/0/1/0".parse().unwrap();
//! let b = NodePath::new(vec![0, 2]);
//! assert!(is_before(&a, &b));
//! assert_eq!(b.child(3).to_string(), "/0/2/3");
//! ```

mod comparator;
mod parser;
mod types;

pub use comparator::{is_after, is_before};
pub use parser::{parse, PathParseError};
pub use types::NodePath;
