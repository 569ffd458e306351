//! Block tree access for Sift.
//!
//! The engine never owns the document; it reads and mutates it through
//! [`BlockTreeAdapter`]. [`BlockTree`] is the in-memory implementation used by
//! the CLI and the tests, and [`walk`] is the lazy pre-order traversal that
//! defines document order.

mod adapter;
mod document;
mod error;
pub mod walk;

pub use adapter::{BlockPatch, BlockTreeAdapter, Placement};
pub use document::{BlockTree, set_prop};
pub use error::TreeError;
pub use walk::{PreOrder, Visit, walk};

/// Result type for tree mutations.
pub type Result<T> = std::result::Result<T, TreeError>;
