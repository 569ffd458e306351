//! SQLite document store for Sift.
//!
//! [`DocumentDb`] keeps documents (title, parent, encoded content, archive
//! flag) in a single table and implements the engine's
//! [`sift_engine::DocumentService`], so the CLI can hand it straight to a
//! [`sift_engine::Processor`].

mod db;
mod error;

pub use db::DocumentDb;
pub use error::StoreError;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
