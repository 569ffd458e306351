//! Sub-pages: page-link creation and archive-on-removal.

use std::collections::BTreeSet;

use sift_tree::{BlockPatch, BlockTreeAdapter};
use sift_types::{Block, BlockId, BlockKind, DocumentId};
use tracing::{debug, info};

use crate::hide::decode_or_empty;
use crate::service::DocumentService;
use crate::Result;

/// Title given to sub-pages created without one.
pub const DEFAULT_PAGE_TITLE: &str = "Untitled";

/// Create a child document of `parent` and turn the block at the editor
/// cursor into a link to it.
///
/// Returns `None` (and creates nothing) when there is no cursor or the cursor
/// sits on a page-link or container.
pub fn create_sub_page(
    tree: &mut impl BlockTreeAdapter,
    service: &mut impl DocumentService,
    parent: DocumentId,
    title: &str,
) -> Result<Option<(BlockId, DocumentId)>> {
    let Some(at) = tree.cursor_position() else {
        debug!("create_sub_page: no cursor");
        return Ok(None);
    };
    if !tree.find(&at).is_some_and(Block::is_eligible) {
        debug!(block = %at, "create_sub_page: cursor not on a content block");
        return Ok(None);
    }

    let title = if title.trim().is_empty() { DEFAULT_PAGE_TITLE } else { title };
    let page = service.create(title, Some(parent))?;
    tree.update_block(
        &at,
        BlockPatch::Kind(BlockKind::PageLink {
            page_id: page.to_string(),
        }),
    )?;
    info!(block = %at, page = %page.short(), parent = %parent.short(), "created sub-page");
    Ok(Some((at, page)))
}

/// Every linked document id in `roots`, including links folded away inside
/// hidden-containers (a hidden link is not a deleted link).
pub fn linked_pages(roots: &[Block]) -> BTreeSet<DocumentId> {
    let mut out = BTreeSet::new();
    collect_links(roots, &mut out);
    out
}

fn collect_links(blocks: &[Block], out: &mut BTreeSet<DocumentId>) {
    for block in blocks {
        match &block.kind {
            BlockKind::PageLink { .. } => out.extend(block.linked_document()),
            BlockKind::Hidden { original_content } => {
                collect_links(&decode_or_empty(&block.id, original_content), out);
            }
            BlockKind::Content(_) => {}
        }
        collect_links(&block.children, out);
    }
}

/// Remembers which documents a page links to, to spot links that vanished.
#[derive(Clone, Debug, Default)]
pub struct PageLinkTracker {
    known: BTreeSet<DocumentId>,
}

impl PageLinkTracker {
    pub fn new(roots: &[Block]) -> Self {
        Self {
            known: linked_pages(roots),
        }
    }

    pub fn known(&self) -> &BTreeSet<DocumentId> {
        &self.known
    }

    /// Record the current links and return the ones that disappeared.
    pub fn removed(&mut self, roots: &[Block]) -> Vec<DocumentId> {
        let current = linked_pages(roots);
        let gone = self.known.difference(&current).copied().collect();
        self.known = current;
        gone
    }

    /// Keep tracking `page` as linked so the next call reports it again.
    ///
    /// Used when archiving a vanished page failed.
    pub fn retry_later(&mut self, page: DocumentId) {
        self.known.insert(page);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_tree::BlockTree;
    use sift_types::codec;

    use crate::service::InMemoryDocuments;

    #[test]
    fn test_create_sub_page_at_cursor() {
        let mut svc = InMemoryDocuments::new();
        let parent = svc.insert("Parent", "");
        let mut tree = BlockTree::new(vec![Block::paragraph("p", "/page")]);
        tree.set_cursor(Some(BlockId::new("p")));

        let (block, page) = create_sub_page(&mut tree, &mut svc, parent, "").unwrap().unwrap();
        assert_eq!(block, BlockId::new("p"));
        assert_eq!(tree.blocks()[0].linked_document(), Some(page));
        let record = svc.load(page).unwrap();
        assert_eq!(record.title, DEFAULT_PAGE_TITLE);
        assert_eq!(record.parent, Some(parent));
    }

    #[test]
    fn test_create_sub_page_without_cursor() {
        let mut svc = InMemoryDocuments::new();
        let parent = svc.insert("Parent", "");
        let mut tree = BlockTree::new(vec![Block::paragraph("p", "")]);
        assert_eq!(create_sub_page(&mut tree, &mut svc, parent, "x").unwrap(), None);
        assert_eq!(svc.list().unwrap().len(), 1);
    }

    #[test]
    fn test_tracker_sees_links_inside_containers() {
        let a = DocumentId::new();
        let b = DocumentId::new();
        let payload = codec::encode_payload(&[Block::page_link("lb", b)]).unwrap();
        let roots = vec![Block::page_link("la", a), Block::hidden("h", payload)];
        let mut tracker = PageLinkTracker::new(&roots);
        assert_eq!(tracker.known().len(), 2);

        let after = vec![Block::hidden("h", codec::encode_payload(&[Block::page_link("lb", b)]).unwrap())];
        assert_eq!(tracker.removed(&after), vec![a]);
        assert!(tracker.removed(&after).is_empty());
    }

    #[test]
    fn test_retry_later_reports_page_again() {
        let a = DocumentId::new();
        let mut tracker = PageLinkTracker::new(&[Block::page_link("la", a)]);
        assert_eq!(tracker.removed(&[]), vec![a]);
        tracker.retry_later(a);
        assert_eq!(tracker.removed(&[]), vec![a]);
        assert!(tracker.removed(&[]).is_empty());
    }
}
