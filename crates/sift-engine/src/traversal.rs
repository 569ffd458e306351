//! Document-order neighbour queries.
//!
//! Pure functions over a snapshot of root blocks. Each runs a single lazy
//! pre-order walk and stops as soon as it has its answer. An id that is not in
//! the tree (deleted behind the engine's back) is never an error: the query
//! just finds nothing, which callers treat as "end of document".

use sift_tree::{Visit, walk};
use sift_types::{Block, BlockId};

/// First eligible block in document order.
pub fn first_eligible(doc: &[Block]) -> Option<BlockId> {
    walk(doc)
        .find(|v| v.block.is_eligible())
        .map(|v| v.block.id.clone())
}

/// First eligible block after `id`. `None` at the end or when `id` is absent.
pub fn next_eligible_after(doc: &[Block], id: &BlockId) -> Option<BlockId> {
    let mut it = walk(doc);
    it.by_ref().find(|v| v.block.id == *id)?;
    it.find(|v| v.block.is_eligible())
        .map(|v| v.block.id.clone())
}

/// Last eligible block before `id`. The walk stops at `id`.
///
/// `None` when `id` is the first eligible block or absent.
pub fn previous_eligible_before(doc: &[Block], id: &BlockId) -> Option<BlockId> {
    let mut last = None;
    for visit in walk(doc) {
        if visit.block.id == *id {
            return last;
        }
        if visit.block.is_eligible() {
            last = Some(visit.block.id.clone());
        }
    }
    None
}

/// Neighbourhood of a contiguous run of target blocks.
#[derive(Debug, Default)]
pub struct Boundary<'a> {
    /// Literal block immediately before the first target.
    pub prev: Option<Visit<'a>>,
    /// The first target itself.
    pub first: Option<Visit<'a>>,
    /// The last target itself.
    pub last: Option<Visit<'a>>,
    /// Literal block right after the last target's subtree, eligible or not.
    pub next_immediate: Option<Visit<'a>>,
    /// First eligible block after the last target's subtree.
    pub next_eligible: Option<&'a Block>,
}

/// One walk computing [`Boundary`] for `targets` ending at `last`.
///
/// The last target's descendants are skipped: they leave the document along
/// with their parent, so they can be neither neighbour nor next cursor.
pub fn boundary_neighbors<'a>(doc: &'a [Block], targets: &[BlockId], last: &BlockId) -> Boundary<'a> {
    let mut out = Boundary::default();
    let first = targets.first();
    let mut previous: Option<Visit<'a>> = None;
    let mut it = walk(doc);

    while let Some(visit) = it.next() {
        if out.first.is_none() && Some(&visit.block.id) == first {
            out.prev = previous;
            out.first = Some(visit);
        }
        if visit.block.id == *last {
            out.last = Some(visit);
            it.skip_children();
            out.next_immediate = it.next();
            out.next_eligible = match out.next_immediate {
                Some(next) if next.block.is_eligible() => Some(next.block),
                Some(_) => it.find(|v| v.block.is_eligible()).map(|v| v.block),
                None => None,
            };
            break;
        }
        previous = Some(visit);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_types::DocumentId;

    fn id(s: &str) -> BlockId {
        BlockId::new(s)
    }

    fn doc() -> Vec<Block> {
        vec![
            Block::page_link("link", DocumentId::new()),
            Block::paragraph("p1", "one").with_children(vec![
                Block::paragraph("p1a", "one-a"),
                Block::hidden("h1", "[]"),
            ]),
            Block::hidden("h2", "[]"),
            Block::paragraph("p2", "two"),
            Block::paragraph("p3", "three"),
        ]
    }

    #[test]
    fn test_first_eligible_skips_page_links() {
        assert_eq!(first_eligible(&doc()), Some(id("p1")));
    }

    #[test]
    fn test_first_eligible_none() {
        let only_links = vec![Block::page_link("l", DocumentId::new()), Block::hidden("h", "[]")];
        assert_eq!(first_eligible(&only_links), None);
        assert_eq!(first_eligible(&[]), None);
    }

    #[test]
    fn test_next_eligible_descends_and_skips_containers() {
        let d = doc();
        assert_eq!(next_eligible_after(&d, &id("p1")), Some(id("p1a")));
        assert_eq!(next_eligible_after(&d, &id("p1a")), Some(id("p2")));
        assert_eq!(next_eligible_after(&d, &id("p3")), None);
    }

    #[test]
    fn test_next_eligible_missing_id() {
        assert_eq!(next_eligible_after(&doc(), &id("ghost")), None);
    }

    #[test]
    fn test_previous_eligible() {
        let d = doc();
        assert_eq!(previous_eligible_before(&d, &id("p2")), Some(id("p1a")));
        assert_eq!(previous_eligible_before(&d, &id("p1")), None);
        assert_eq!(previous_eligible_before(&d, &id("ghost")), None);
    }

    #[test]
    fn test_next_then_previous_is_identity() {
        let d = doc();
        for start in ["p1", "p1a", "p2"] {
            let next = next_eligible_after(&d, &id(start)).unwrap();
            assert_eq!(previous_eligible_before(&d, &next), Some(id(start)));
        }
    }

    #[test]
    fn test_boundary_middle_run() {
        let d = doc();
        let b = boundary_neighbors(&d, &[id("p2")], &id("p2"));
        assert_eq!(b.prev.map(|v| v.block.id.as_str()), Some("h2"));
        assert_eq!(b.next_immediate.map(|v| v.block.id.as_str()), Some("p3"));
        assert_eq!(b.next_eligible.map(|v| v.id.as_str()), Some("p3"));
    }

    #[test]
    fn test_boundary_skips_last_subtree() {
        let d = doc();
        let b = boundary_neighbors(&d, &[id("p1")], &id("p1"));
        assert_eq!(b.prev.map(|v| v.block.id.as_str()), Some("link"));
        assert_eq!(b.next_immediate.map(|v| v.block.id.as_str()), Some("h2"));
        assert_eq!(b.next_eligible.map(|v| v.id.as_str()), Some("p2"));
    }

    #[test]
    fn test_boundary_at_end() {
        let d = doc();
        let b = boundary_neighbors(&d, &[id("p2"), id("p3")], &id("p3"));
        assert_eq!(b.first.map(|v| v.block.id.as_str()), Some("p2"));
        assert!(b.next_immediate.is_none());
        assert!(b.next_eligible.is_none());
    }

    #[test]
    fn test_boundary_first_root_has_no_prev() {
        let d = vec![Block::paragraph("a", ""), Block::paragraph("b", "")];
        let b = boundary_neighbors(&d, &[id("a")], &id("a"));
        assert!(b.prev.is_none());
        assert_eq!(b.next_eligible.map(|v| v.id.as_str()), Some("b"));
    }
}
