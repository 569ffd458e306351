//! Collect: copy what survived review under a Summary heading.
//!
//! The visible blocks are copied (fresh ids, containers dropped) before the
//! hidden ones are restored, then appended after the last root behind a few
//! spacer paragraphs and a heading whose id is derived from the document id.

use std::slice;

use sift_tree::BlockTreeAdapter;
use sift_types::{Block, BlockId, DocumentId};
use tracing::{info, warn};

use crate::hide::untoggle_all;
use crate::options::EngineOptions;
use crate::Result;

/// Result of [`collect`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectOutcome {
    /// Id of the appended heading, for bringing it into view.
    pub heading: BlockId,
    /// Root ids of the copied Summary set, in document order.
    pub summary: Vec<BlockId>,
    /// Containers expanded by the untoggle step.
    pub restored: usize,
}

/// Deep copy of a visible block with fresh ids; containers are dropped.
fn visible_copy(block: &Block) -> Option<Block> {
    if block.is_hidden() {
        return None;
    }
    Some(Block {
        id: BlockId::fresh(),
        kind: block.kind.clone(),
        children: block.children.iter().filter_map(visible_copy).collect(),
    })
}

/// The Summary set: every visible root, recursively, in document order.
pub fn summary_set(roots: &[Block]) -> Vec<Block> {
    roots.iter().filter_map(visible_copy).collect()
}

/// Partition the document: snapshot visible blocks, untoggle, append the summary.
pub fn collect(tree: &mut impl BlockTreeAdapter, document: DocumentId, options: &EngineOptions) -> Result<CollectOutcome> {
    let summary = summary_set(tree.roots());
    let restored = untoggle_all(tree)?;

    let heading = BlockId::summary_heading(document);
    if let Some(mut moved) = tree.find(&heading).cloned() {
        moved.id = BlockId::fresh();
        warn!(old = %heading, new = %moved.id, "summary heading id taken by an earlier collect, re-minting it");
        tree.replace_blocks(slice::from_ref(&heading), vec![moved])?;
    }

    let summary_ids: Vec<BlockId> = summary.iter().map(|b| b.id.clone()).collect();
    let mut appended: Vec<Block> = (0..options.spacer_count)
        .map(|_| Block::paragraph(BlockId::fresh(), ""))
        .collect();
    appended.push(Block::heading(heading.clone(), options.summary_level, &options.summary_title));
    appended.extend(summary);
    tree.append_blocks(appended)?;

    info!(document = %document.short(), summary = summary_ids.len(), restored, "collected summary");
    Ok(CollectOutcome {
        heading,
        summary: summary_ids,
        restored,
    })
}
