//! The narrow interface the engine uses to read and mutate a block tree.
//!
//! The host editor owns the real tree. Anything that can enumerate blocks in
//! document order and apply these point mutations can drive the engine;
//! [`crate::BlockTree`] is the in-memory implementation.

use serde_json::Value;
use sift_types::{Block, BlockId, BlockKind};
use strum::{AsRefStr, EnumString};

use crate::Result;
use crate::walk::{PreOrder, walk};

/// Where `insert_blocks` puts new blocks relative to the anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Placement {
    Before,
    After,
}

/// A point change to one block.
#[derive(Clone, Debug, PartialEq)]
pub enum BlockPatch {
    /// Replace the block's kind (type, props and content) wholesale.
    Kind(BlockKind),
    /// Set one prop on a content block.
    Prop { key: String, value: Value },
}

impl BlockPatch {
    pub fn prop(key: impl Into<String>, value: impl Into<Value>) -> Self {
        BlockPatch::Prop {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Block tree operations consumed by the engine.
///
/// Mutations either apply fully or fail without touching the tree.
pub trait BlockTreeAdapter {
    /// Root blocks in order.
    fn roots(&self) -> &[Block];

    /// Apply a patch to one block.
    fn update_block(&mut self, id: &BlockId, patch: BlockPatch) -> Result<()>;

    /// Remove `ids` (with their subtrees) and put `blocks` where the first id was.
    fn replace_blocks(&mut self, ids: &[BlockId], blocks: Vec<Block>) -> Result<()>;

    /// Remove `ids` with their subtrees.
    fn remove_blocks(&mut self, ids: &[BlockId]) -> Result<()>;

    /// Insert `blocks` as siblings of `anchor`.
    fn insert_blocks(&mut self, blocks: Vec<Block>, anchor: &BlockId, placement: Placement) -> Result<()>;

    /// Append `blocks` after the last root (works on an empty tree).
    fn append_blocks(&mut self, blocks: Vec<Block>) -> Result<()>;

    /// The block holding the editor's text cursor, if any.
    fn cursor_position(&self) -> Option<BlockId>;

    /// Enumerate blocks in document order.
    fn walk(&self) -> PreOrder<'_> {
        walk(self.roots())
    }

    /// Find a block anywhere in the tree.
    fn find(&self, id: &BlockId) -> Option<&Block> {
        self.walk().find(|v| v.block.id == *id).map(|v| v.block)
    }

    fn contains(&self, id: &BlockId) -> bool {
        self.find(id).is_some()
    }
}
