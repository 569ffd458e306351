//! Highlight marker transform.
//!
//! A highlight is a single prop on a content block. Setting or clearing it is
//! idempotent and never changes structure; page-links and containers carry no
//! props and are skipped.

use serde_json::Value;
use sift_tree::{BlockTreeAdapter, set_prop};
use sift_types::{BlockId, CLEARED_HIGHLIGHT, HIGHLIGHT_PROP};
use tracing::debug;

use crate::Result;

/// Set the marker on `ids`. Returns how many blocks changed.
///
/// Ids that no longer exist or are not content blocks are skipped.
pub fn highlight(tree: &mut impl BlockTreeAdapter, ids: &[BlockId], color: &str) -> Result<usize> {
    let mut changed = 0;
    for id in ids {
        let eligible = tree.find(id).is_some_and(|b| b.is_eligible());
        if !eligible {
            continue;
        }
        if set_prop(tree, id, HIGHLIGHT_PROP, Value::from(color))? {
            changed += 1;
        }
    }
    debug!(requested = ids.len(), changed, "highlight");
    Ok(changed)
}

/// Clear the marker on every block where it is set to `color`.
pub fn clear_highlights(tree: &mut impl BlockTreeAdapter, color: &str) -> Result<usize> {
    let marked: Vec<BlockId> = tree
        .walk()
        .filter(|v| v.block.is_highlighted_with(color))
        .map(|v| v.block.id.clone())
        .collect();
    for id in &marked {
        set_prop(tree, id, HIGHLIGHT_PROP, Value::from(CLEARED_HIGHLIGHT))?;
    }
    debug!(cleared = marked.len(), "clear_highlights");
    Ok(marked.len())
}
