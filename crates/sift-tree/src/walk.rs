//! Lazy depth-first pre-order traversal.
//!
//! "Document order" everywhere in Sift means this walk: parent before
//! children, children in order, roots in order. The iterator is lazy, so a
//! caller that finds what it wants simply stops pulling (`find`, `break`, `?`).

use sift_types::Block;

/// One step of the walk.
#[derive(Clone, Copy, Debug)]
pub struct Visit<'a> {
    pub block: &'a Block,
    /// 0 for roots.
    pub depth: usize,
    /// `None` for roots.
    pub parent: Option<&'a Block>,
}

/// Depth-first pre-order iterator over a forest.
pub struct PreOrder<'a> {
    stack: Vec<Visit<'a>>,
    /// Children pushed for the most recently yielded block.
    last_pushed: usize,
}

impl<'a> PreOrder<'a> {
    fn new(roots: &'a [Block]) -> Self {
        // Push roots in reverse order to process first root first
        let stack = roots
            .iter()
            .rev()
            .map(|block| Visit { block, depth: 0, parent: None })
            .collect();
        Self { stack, last_pushed: 0 }
    }

    /// Do not descend into the block most recently returned by `next()`.
    pub fn skip_children(&mut self) {
        let keep = self.stack.len().saturating_sub(self.last_pushed);
        self.stack.truncate(keep);
        self.last_pushed = 0;
    }
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let visit = self.stack.pop()?;
        let block = visit.block;
        for child in block.children.iter().rev() {
            self.stack.push(Visit {
                block: child,
                depth: visit.depth + 1,
                parent: Some(block),
            });
        }
        self.last_pushed = block.children.len();
        Some(visit)
    }
}

/// Walk a forest in document order.
pub fn walk(roots: &[Block]) -> PreOrder<'_> {
    PreOrder::new(roots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(iter: impl Iterator<Item = Visit<'static>>) -> Vec<&'static str> {
        iter.map(|v| v.block.id.as_str()).collect()
    }

    fn forest() -> &'static [Block] {
        let blocks = vec![
            Block::paragraph("a", "").with_children(vec![
                Block::paragraph("a1", "").with_children(vec![Block::paragraph("a1x", "")]),
                Block::paragraph("a2", ""),
            ]),
            Block::paragraph("b", ""),
        ];
        Box::leak(blocks.into_boxed_slice())
    }

    #[test]
    fn test_preorder_order() {
        assert_eq!(ids(walk(forest())), vec!["a", "a1", "a1x", "a2", "b"]);
    }

    #[test]
    fn test_depth_and_parent() {
        let visits: Vec<_> = walk(forest()).collect();
        assert_eq!(visits[0].depth, 0);
        assert!(visits[0].parent.is_none());
        assert_eq!(visits[2].depth, 2);
        assert_eq!(visits[2].parent.map(|p| p.id.as_str()), Some("a1"));
        assert_eq!(visits[3].parent.map(|p| p.id.as_str()), Some("a"));
        assert!(visits[4].parent.is_none());
    }

    #[test]
    fn test_skip_children() {
        let mut it = walk(forest());
        assert_eq!(it.next().map(|v| v.block.id.as_str()), Some("a"));
        assert_eq!(it.next().map(|v| v.block.id.as_str()), Some("a1"));
        it.skip_children();
        assert_eq!(ids(it), vec!["a2", "b"]);
    }

    #[test]
    fn test_early_stop_is_lazy() {
        let found = walk(forest()).find(|v| v.block.id.as_str() == "a1").unwrap();
        assert_eq!(found.depth, 1);
    }

    #[test]
    fn test_empty_forest() {
        assert_eq!(walk(&[]).count(), 0);
    }
}
