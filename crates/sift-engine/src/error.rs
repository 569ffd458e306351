//! Error types for the review engine.

use sift_types::{BlockId, CodecError};
use sift_tree::TreeError;
use thiserror::Error;

use crate::service::ServiceError;

/// Errors that can occur while applying an intent or a transform.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A tree mutation was rejected.
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    /// Content could not be encoded for a container or for storage.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The document service refused an operation.
    #[error("document service error: {0}")]
    Service(#[from] ServiceError),

    /// Restore called on a block that is not a hidden-container.
    #[error("block {0:?} is not a hidden container")]
    NotHidden(BlockId),

    /// The processor behind a request handle is gone.
    #[error("processor shut down")]
    Shutdown,
}
