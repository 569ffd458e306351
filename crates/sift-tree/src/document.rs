//! In-memory block tree.
//!
//! Stands in for the host editor's document: a forest of [`Block`]s plus the
//! editor's text cursor. Mutations are all-or-nothing: every id is checked
//! before anything moves, so a failed call leaves the tree as it was.

use std::collections::HashSet;

use serde_json::Value;
use sift_types::{Block, BlockId, BlockKind, codec};

use crate::adapter::{BlockPatch, BlockTreeAdapter, Placement};
use crate::{Result, TreeError};

/// Block tree backed by a plain `Vec<Block>` forest.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlockTree {
    /// Root blocks in document order.
    blocks: Vec<Block>,

    /// Block holding the editor's text cursor.
    cursor: Option<BlockId>,

    /// Bumped on every successful mutation.
    version: u64,
}

impl BlockTree {
    /// Create a tree from root blocks.
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            cursor: None,
            version: 0,
        }
    }

    /// Decode stored document content.
    pub fn from_content(content: &str) -> std::result::Result<Self, codec::CodecError> {
        Ok(Self::new(codec::decode_document(content)?))
    }

    /// Encode the tree as stored document content.
    pub fn to_content(&self) -> std::result::Result<String, codec::CodecError> {
        codec::encode_document(&self.blocks)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the current version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Total number of blocks at any depth.
    pub fn block_count(&self) -> usize {
        self.walk().count()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Move the editor's text cursor.
    pub fn set_cursor(&mut self, id: Option<BlockId>) {
        self.cursor = id;
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn ids_in_subtrees(&self, targets: &HashSet<&BlockId>) -> HashSet<BlockId> {
        let mut out = HashSet::new();
        let mut it = self.walk();
        while let Some(visit) = it.next() {
            if targets.contains(&visit.block.id) {
                out.extend(visit.block.subtree_ids());
                it.skip_children();
            }
        }
        out
    }

    fn require_all(&self, ids: &[BlockId]) -> Result<()> {
        let present: HashSet<&BlockId> = self.walk().map(|v| &v.block.id).collect();
        match ids.iter().find(|id| !present.contains(id)) {
            Some(missing) => Err(TreeError::BlockNotFound(missing.clone())),
            None => Ok(()),
        }
    }

    /// Reject incoming blocks whose ids survive elsewhere in the tree or repeat.
    fn check_incoming(&self, incoming: &[Block], freed: &HashSet<BlockId>) -> Result<()> {
        let mut seen = HashSet::new();
        let existing: HashSet<&BlockId> = self.walk().map(|v| &v.block.id).collect();
        for id in incoming.iter().flat_map(Block::subtree_ids) {
            if (existing.contains(&id) && !freed.contains(&id)) || !seen.insert(id.clone()) {
                return Err(TreeError::DuplicateBlock(id));
            }
        }
        Ok(())
    }

    fn bump(&mut self) {
        self.version += 1;
    }
}

/// Rebuild a sibling list: `first` becomes `replacement`, `removed` ids vanish.
fn splice(
    list: Vec<Block>,
    first: Option<&BlockId>,
    removed: &HashSet<&BlockId>,
    replacement: &mut Option<Vec<Block>>,
) -> Vec<Block> {
    let mut out = Vec::with_capacity(list.len());
    for mut block in list {
        if Some(&block.id) == first {
            out.extend(replacement.take().unwrap_or_default());
        } else if removed.contains(&block.id) {
            continue;
        } else {
            block.children = splice(std::mem::take(&mut block.children), first, removed, replacement);
            out.push(block);
        }
    }
    out
}

/// Insert `incoming` next to `anchor` wherever it sits.
fn insert_at(list: &mut Vec<Block>, anchor: &BlockId, placement: Placement, incoming: &mut Option<Vec<Block>>) -> bool {
    if let Some(idx) = list.iter().position(|b| b.id == *anchor) {
        let at = match placement {
            Placement::Before => idx,
            Placement::After => idx + 1,
        };
        let blocks = incoming.take().unwrap_or_default();
        list.splice(at..at, blocks);
        return true;
    }
    list.iter_mut()
        .any(|b| insert_at(&mut b.children, anchor, placement, &mut *incoming))
}

fn find_mut<'a>(list: &'a mut [Block], id: &BlockId) -> Option<&'a mut Block> {
    for block in list.iter_mut() {
        if block.id == *id {
            return Some(block);
        }
        if let Some(found) = find_mut(&mut block.children, id) {
            return Some(found);
        }
    }
    None
}

impl BlockTreeAdapter for BlockTree {
    fn roots(&self) -> &[Block] {
        &self.blocks
    }

    fn update_block(&mut self, id: &BlockId, patch: BlockPatch) -> Result<()> {
        let block = find_mut(&mut self.blocks, id).ok_or_else(|| TreeError::BlockNotFound(id.clone()))?;
        match patch {
            BlockPatch::Kind(kind) => {
                if kind.is_hidden() && !block.children.is_empty() {
                    return Err(TreeError::UnsupportedPatch(id.clone()));
                }
                block.kind = kind;
            }
            BlockPatch::Prop { key, value } => match &mut block.kind {
                BlockKind::Content(content) => {
                    if content.props.get(&key) == Some(&value) {
                        return Ok(());
                    }
                    content.props.insert(key, value);
                }
                _ => return Err(TreeError::UnsupportedPatch(id.clone())),
            },
        }
        self.bump();
        Ok(())
    }

    fn replace_blocks(&mut self, ids: &[BlockId], blocks: Vec<Block>) -> Result<()> {
        let (first, rest) = ids.split_first().ok_or(TreeError::NoTargets)?;
        self.require_all(ids)?;
        let targets: HashSet<&BlockId> = ids.iter().collect();
        let freed = self.ids_in_subtrees(&targets);
        self.check_incoming(&blocks, &freed)?;

        tracing::trace!(first = %first, removed = rest.len(), inserted = blocks.len(), "replace_blocks");
        let removed: HashSet<&BlockId> = rest.iter().collect();
        let mut replacement = Some(blocks);
        self.blocks = splice(std::mem::take(&mut self.blocks), Some(first), &removed, &mut replacement);
        self.bump();
        Ok(())
    }

    fn remove_blocks(&mut self, ids: &[BlockId]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.require_all(ids)?;
        let removed: HashSet<&BlockId> = ids.iter().collect();
        let mut none = None;
        self.blocks = splice(std::mem::take(&mut self.blocks), None, &removed, &mut none);
        self.bump();
        Ok(())
    }

    fn insert_blocks(&mut self, blocks: Vec<Block>, anchor: &BlockId, placement: Placement) -> Result<()> {
        self.require_all(std::slice::from_ref(anchor))?;
        self.check_incoming(&blocks, &HashSet::new())?;
        let mut incoming = Some(blocks);
        insert_at(&mut self.blocks, anchor, placement, &mut incoming);
        self.bump();
        Ok(())
    }

    fn append_blocks(&mut self, blocks: Vec<Block>) -> Result<()> {
        self.check_incoming(&blocks, &HashSet::new())?;
        self.blocks.extend(blocks);
        self.bump();
        Ok(())
    }

    fn cursor_position(&self) -> Option<BlockId> {
        self.cursor.clone().filter(|id| self.contains(id))
    }
}

/// Set a prop on a content block, returning whether anything changed.
pub fn set_prop(tree: &mut impl BlockTreeAdapter, id: &BlockId, key: &str, value: Value) -> Result<bool> {
    let before = tree
        .find(id)
        .and_then(|b| match &b.kind {
            BlockKind::Content(c) => c.props.get(key).cloned(),
            _ => None,
        });
    if before.as_ref() == Some(&value) {
        return Ok(false);
    }
    tree.update_block(id, BlockPatch::Prop { key: key.to_string(), value })?;
    Ok(true)
}

// ============================================================================
// Tests
// ============================================================================
