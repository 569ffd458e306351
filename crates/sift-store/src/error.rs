//! Error types for the document store.

use sift_types::DocumentId;
use thiserror::Error;

/// Errors from the SQLite document store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("document not found: {0}")]
    NotFound(DocumentId),

    /// No document id starts with the given prefix.
    #[error("no document matches prefix {0:?}")]
    NoMatch(String),

    /// More than one document id starts with the given prefix.
    #[error("prefix {prefix:?} is ambiguous ({count} documents)")]
    Ambiguous { prefix: String, count: usize },
}
