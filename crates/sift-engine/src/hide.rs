//! Hide and restore: the reversible transform.
//!
//! Hiding replaces a run of blocks with a hidden-container whose
//! `originalContent` prop holds the encoded snapshots. A container that ends
//! up next to another container (as a sibling) is merged into it, so the
//! document never shows two containers back to back. Restoring splices the
//! snapshots back in place of the container with their original ids.

use std::collections::HashSet;
use std::slice;

use sift_tree::{BlockPatch, BlockTreeAdapter, TreeError, Visit, walk};
use sift_types::{Block, BlockId, BlockKind, codec};
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::traversal::boundary_neighbors;
use crate::Result;

/// Upper bound on untoggle passes. Each pass peels one nesting level.
const MAX_UNTOGGLE_PASSES: usize = 256;

/// Where the hidden blocks ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Merge {
    /// A new container replaced the first target.
    New,
    /// Appended to the container right before the run.
    IntoPrevious,
    /// Prepended to the container right after the run.
    IntoNext,
    /// Both neighbours were containers; everything went into the previous one.
    Bridged,
}

/// Result of [`hide`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HideOutcome {
    Hidden {
        container: BlockId,
        merge: Merge,
        /// Targets actually hidden (after dropping missing ones).
        hidden: usize,
        next_eligible: Option<BlockId>,
    },
    /// No target survived selection; the tree is untouched.
    NothingHidden,
}

impl HideOutcome {
    /// Where the review cursor goes next. `None` means end of document.
    pub fn next_eligible(&self) -> Option<&BlockId> {
        match self {
            HideOutcome::Hidden { next_eligible, .. } => next_eligible.as_ref(),
            HideOutcome::NothingHidden => None,
        }
    }
}

/// Result of [`restore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored { blocks: usize, reminted: usize },
    /// Empty or unparseable payload; the container was deleted.
    Discarded,
}

/// Decode a payload, treating garbage as empty.
pub(crate) fn decode_or_empty(container: &BlockId, payload: &str) -> Vec<Block> {
    match codec::decode_payload(payload) {
        Ok(blocks) => blocks,
        Err(e) => {
            warn!(container = %container, error = %e, "unparseable hidden payload, treating as empty");
            Vec::new()
        }
    }
}

fn container_kind(blocks: &[Block]) -> Result<BlockKind> {
    Ok(BlockKind::Hidden {
        original_content: codec::encode_payload(blocks)?,
    })
}

// ============================================================================
// Hide
// ============================================================================

/// Blocks leaving the document, in document order.
struct Selection {
    /// Accepted targets.
    targets: Vec<BlockId>,
    /// Targets plus absorbed in-between blocks.
    removed: Vec<BlockId>,
    snapshots: Vec<Block>,
}

/// Accept targets that exist, are eligible and are not inside an earlier target.
fn accept_targets(roots: &[Block], wanted: &HashSet<&BlockId>) -> Vec<BlockId> {
    let mut accepted = Vec::new();
    let mut it = walk(roots);
    while let Some(visit) = it.next() {
        if wanted.contains(&visit.block.id) && visit.block.is_eligible() {
            accepted.push(visit.block.id.clone());
            it.skip_children();
        }
    }
    accepted
}

/// Snapshot the targets and absorb the ineligible blocks lying between them.
///
/// A page-link or container sitting between two targets would otherwise be
/// displaced (or left adjacent to the new container). Absorbed containers are
/// flattened into the run.
fn select(roots: &[Block], targets: &[BlockId]) -> Option<Selection> {
    let wanted: HashSet<&BlockId> = targets.iter().collect();
    let accepted = accept_targets(roots, &wanted);
    let (first, last) = (accepted.first()?, accepted.last()?);
    let accepted_set: HashSet<&BlockId> = accepted.iter().collect();

    let mut removed = Vec::new();
    let mut snapshots = Vec::new();
    let mut started = false;
    let mut it = walk(roots);
    while let Some(visit) = it.next() {
        let block = visit.block;
        if block.id == *first {
            started = true;
        }
        if !started {
            continue;
        }
        if accepted_set.contains(&block.id) {
            removed.push(block.id.clone());
            snapshots.push(block.clone());
            it.skip_children();
            if block.id == *last {
                break;
            }
        } else if !block.is_eligible() && !block.subtree_ids().iter().any(|id| accepted_set.contains(id)) {
            removed.push(block.id.clone());
            match &block.kind {
                BlockKind::Hidden { original_content } => {
                    snapshots.extend(decode_or_empty(&block.id, original_content));
                }
                _ => snapshots.push(block.clone()),
            }
            it.skip_children();
        }
    }

    Some(Selection {
        targets: accepted,
        removed,
        snapshots,
    })
}

/// A sibling hidden-container next to the run.
struct Neighbour {
    id: BlockId,
    payload: Vec<Block>,
    /// Ineligible siblings between the container and the run, in document order.
    between: Vec<Block>,
}

fn has_eligible(block: &Block) -> bool {
    walk(slice::from_ref(block)).any(|v| v.block.is_eligible())
}

/// Nearest container among `siblings` (ordered moving away from the run).
///
/// Page-links and other blocks with nothing reviewable in them are looked
/// past, so no two containers are left with only ineligible blocks between.
fn scan_for_container<'a>(siblings: impl Iterator<Item = &'a Block>) -> Option<Neighbour> {
    let mut between = Vec::new();
    for block in siblings {
        if let BlockKind::Hidden { original_content } = &block.kind {
            return Some(Neighbour {
                id: block.id.clone(),
                payload: decode_or_empty(&block.id, original_content),
                between,
            });
        }
        if has_eligible(block) {
            return None;
        }
        between.push(block.clone());
    }
    None
}

/// Sibling list holding `visit`.
fn siblings_of<'a>(roots: &'a [Block], visit: &Visit<'a>) -> &'a [Block] {
    visit.parent.map(|p| p.children.as_slice()).unwrap_or(roots)
}

fn container_before<'a>(roots: &'a [Block], first: Option<Visit<'a>>) -> Option<Neighbour> {
    let first = first?;
    let siblings = siblings_of(roots, &first);
    let idx = siblings.iter().position(|b| b.id == first.block.id)?;
    let mut found = scan_for_container(siblings[..idx].iter().rev())?;
    found.between.reverse();
    Some(found)
}

fn container_after<'a>(roots: &'a [Block], last: Option<Visit<'a>>) -> Option<Neighbour> {
    let last = last?;
    let siblings = siblings_of(roots, &last);
    let idx = siblings.iter().position(|b| b.id == last.block.id)?;
    scan_for_container(siblings[idx + 1..].iter())
}

/// Hide `targets` (pile then cursor) behind a single container.
///
/// Missing and ineligible targets are dropped, as are targets nested inside
/// an earlier target (its snapshot already carries them).
pub fn hide(tree: &mut impl BlockTreeAdapter, targets: &[BlockId]) -> Result<HideOutcome> {
    let Some(selection) = select(tree.roots(), targets) else {
        debug!(requested = targets.len(), "hide: no target left");
        return Ok(HideOutcome::NothingHidden);
    };
    let hidden = selection.targets.len();
    let (first, last) = match (selection.targets.first(), selection.targets.last()) {
        (Some(first), Some(last)) => (first.clone(), last.clone()),
        _ => return Ok(HideOutcome::NothingHidden),
    };

    let (prev, next, next_eligible) = {
        let roots = tree.roots();
        let boundary = boundary_neighbors(roots, slice::from_ref(&first), &last);
        (
            container_before(roots, boundary.first),
            container_after(roots, boundary.last),
            boundary.next_eligible.map(|b| b.id.clone()),
        )
    };

    let Selection {
        mut removed,
        snapshots,
        ..
    } = selection;

    let (container, merge) = match (prev, next) {
        (Some(prev), Some(next)) => {
            removed.extend(prev.between.iter().chain(&next.between).map(|b| b.id.clone()));
            removed.push(next.id);
            let mut payload = prev.payload;
            payload.extend(prev.between);
            payload.extend(snapshots);
            payload.extend(next.between);
            payload.extend(next.payload);
            tree.update_block(&prev.id, BlockPatch::Kind(container_kind(&payload)?))?;
            tree.remove_blocks(&removed)?;
            (prev.id, Merge::Bridged)
        }
        (Some(prev), None) => {
            removed.extend(prev.between.iter().map(|b| b.id.clone()));
            let mut payload = prev.payload;
            payload.extend(prev.between);
            payload.extend(snapshots);
            tree.update_block(&prev.id, BlockPatch::Kind(container_kind(&payload)?))?;
            tree.remove_blocks(&removed)?;
            (prev.id, Merge::IntoPrevious)
        }
        (None, Some(next)) => {
            removed.extend(next.between.iter().map(|b| b.id.clone()));
            let mut payload = snapshots;
            payload.extend(next.between);
            payload.extend(next.payload);
            tree.update_block(&next.id, BlockPatch::Kind(container_kind(&payload)?))?;
            tree.remove_blocks(&removed)?;
            (next.id, Merge::IntoNext)
        }
        (None, None) => {
            let container = Block::new(BlockId::fresh(), container_kind(&snapshots)?);
            let id = container.id.clone();
            tree.replace_blocks(&removed, vec![container])?;
            (id, Merge::New)
        }
    };

    debug!(container = %container, ?merge, hidden, removed = removed.len(), "hide");
    Ok(HideOutcome::Hidden {
        container,
        merge,
        hidden,
        next_eligible,
    })
}

// ============================================================================
// Restore
// ============================================================================

/// Give `block` and its subtree ids not yet in `taken`, re-minting clashes.
fn claim_ids(block: &mut Block, taken: &mut HashSet<BlockId>) -> usize {
    let mut reminted = 0;
    if !taken.insert(block.id.clone()) {
        let fresh = BlockId::fresh();
        warn!(old = %block.id, new = %fresh, "restored block id already in use, re-minting");
        block.id = fresh.clone();
        taken.insert(fresh);
        reminted += 1;
    }
    for child in &mut block.children {
        reminted += claim_ids(child, taken);
    }
    reminted
}

/// Expand one hidden-container back into its blocks.
pub fn restore(tree: &mut impl BlockTreeAdapter, container: &BlockId) -> Result<RestoreOutcome> {
    let block = tree
        .find(container)
        .ok_or_else(|| TreeError::BlockNotFound(container.clone()))?;
    let BlockKind::Hidden { original_content } = &block.kind else {
        return Err(EngineError::NotHidden(container.clone()));
    };
    let mut blocks = decode_or_empty(container, original_content);

    if blocks.is_empty() {
        tree.remove_blocks(slice::from_ref(container))?;
        debug!(container = %container, "restore: empty payload, container discarded");
        return Ok(RestoreOutcome::Discarded);
    }

    let mut taken: HashSet<BlockId> = tree
        .walk()
        .map(|v| v.block.id.clone())
        .filter(|id| id != container)
        .collect();
    let reminted = blocks.iter_mut().map(|b| claim_ids(b, &mut taken)).sum();
    let count = blocks.len();
    tree.replace_blocks(slice::from_ref(container), blocks)?;

    debug!(container = %container, blocks = count, reminted, "restore");
    Ok(RestoreOutcome::Restored {
        blocks: count,
        reminted,
    })
}

/// Restore every container, repeating until none is left.
///
/// Payloads may themselves hold containers (hidden inside a hidden parent),
/// so one pass is not enough. Returns the number of containers expanded.
pub fn untoggle_all(tree: &mut impl BlockTreeAdapter) -> Result<usize> {
    let mut restored = 0;
    for pass in 0..MAX_UNTOGGLE_PASSES {
        let containers: Vec<BlockId> = tree
            .walk()
            .filter(|v| v.block.is_hidden())
            .map(|v| v.block.id.clone())
            .collect();
        if containers.is_empty() {
            return Ok(restored);
        }
        debug!(pass, containers = containers.len(), "untoggle pass");
        for id in &containers {
            restore(tree, id)?;
            restored += 1;
        }
    }
    warn!(restored, "untoggle_all gave up after {MAX_UNTOGGLE_PASSES} passes");
    Ok(restored)
}

// ============================================================================
// Tests
// ============================================================================
