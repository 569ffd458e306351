//! Error types for block tree mutations.

use sift_types::BlockId;
use thiserror::Error;

/// Errors that can occur while mutating a block tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Block not found in the tree.
    #[error("block not found: {0:?}")]
    BlockNotFound(BlockId),

    /// Patch does not apply to this block's kind.
    ///
    /// For example, setting a prop on a page-link.
    #[error("patch not supported on block {0:?}")]
    UnsupportedPatch(BlockId),

    /// Inserted block id already exists elsewhere in the tree.
    #[error("block already exists: {0:?}")]
    DuplicateBlock(BlockId),

    /// Mutation called with an empty id list.
    #[error("no target blocks given")]
    NoTargets,
}
