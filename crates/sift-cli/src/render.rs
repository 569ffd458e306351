//! Plain-text outline of a document for the terminal.
//!
//! ```text
//! > * Intro paragraph
//!     nested item
//!   [hidden: 3]
//!   → page 0192f3a1
//! ```
//!
//! Column one marks the review cursor (`>`), column two marks blocks on the
//! selection pile (`+`) or highlighted ones (`*`).

use std::fmt::Write;

use sift_engine::{DocumentRecord, SessionState};
use sift_tree::walk;
use sift_types::{Block, BlockId, BlockKind, codec};

const INDENT: &str = "  ";

/// Render `roots` with the session's cursor and pile marked.
pub fn outline(roots: &[Block], state: &SessionState, highlight_color: &str) -> String {
    let cursor = state.cursor();
    let pile = state.pile();
    let mut out = String::new();
    for visit in walk(roots) {
        let block = visit.block;
        let cursor_mark = if cursor == Some(&block.id) { '>' } else { ' ' };
        let mark = if pile.contains(&block.id) {
            '+'
        } else if block.is_highlighted_with(highlight_color) {
            '*'
        } else {
            ' '
        };
        let _ = writeln!(
            out,
            "{cursor_mark}{mark} {}{}",
            INDENT.repeat(visit.depth),
            describe(block)
        );
    }
    out
}

/// Line of `id` in the [`outline`] output (one line per block, walk order).
pub fn line_of(roots: &[Block], id: &BlockId) -> Option<usize> {
    walk(roots).position(|v| v.block.id == *id)
}

/// First outline line to draw so `focus` fits in a `height`-line viewport.
///
/// With `pin_top` the focus line is drawn first where the outline allows it;
/// otherwise it sits mid-screen.
pub fn scroll_offset(total: usize, height: usize, focus: Option<usize>, pin_top: bool) -> usize {
    if height == 0 || total <= height {
        return 0;
    }
    let Some(line) = focus else {
        return 0;
    };
    let start = if pin_top { line } else { line.saturating_sub(height / 2) };
    start.min(total - height)
}

/// One-line label for a block.
pub fn describe(block: &Block) -> String {
    match &block.kind {
        BlockKind::Content(c) => {
            let text = block.plain_text();
            if text.is_empty() {
                format!("({})", c.block_type)
            } else {
                text
            }
        }
        BlockKind::PageLink { page_id } => match block.linked_document() {
            Some(doc) => format!("→ page {}", doc.short()),
            None if page_id.is_empty() => "→ page (unset)".to_string(),
            None => format!("→ page {page_id}"),
        },
        BlockKind::Hidden { original_content } => match codec::decode_payload(original_content) {
            Ok(blocks) => format!("[hidden: {}]", blocks.len()),
            Err(_) => "[hidden: unreadable]".to_string(),
        },
    }
}

/// Table of documents for `sift list`.
pub fn document_table(docs: &[DocumentRecord]) -> String {
    let mut out = String::new();
    for doc in docs {
        let parent = doc.parent.map(|p| p.short()).unwrap_or_else(|| "-".to_string());
        let archived = if doc.is_archived { " (archived)" } else { "" };
        let _ = writeln!(out, "{}  {:<8}  {}{archived}", doc.id.short(), parent, doc.title);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_types::DocumentId;

    #[test]
    fn test_outline_marks_cursor_and_nesting() {
        let roots = vec![
            Block::paragraph("a", "first").with_children(vec![Block::paragraph("b", "child")]),
            Block::paragraph("c", ""),
        ];
        let state = SessionState::Active {
            cursor: BlockId::new("b"),
            pile: vec![BlockId::new("a")],
        };
        let text = outline(&roots, &state, "yellow");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![" + first", ">    child", "   (paragraph)"]);
    }

    #[test]
    fn test_describe_special_blocks() {
        let payload = codec::encode_payload(&[Block::paragraph("x", "1"), Block::paragraph("y", "2")]).unwrap();
        assert_eq!(describe(&Block::hidden("h", payload)), "[hidden: 2]");
        assert_eq!(describe(&Block::hidden("h", "garbage")), "[hidden: unreadable]");

        let doc = DocumentId::new();
        assert_eq!(describe(&Block::page_link("l", doc)), format!("→ page {}", doc.short()));
    }

    #[test]
    fn test_scroll_offset() {
        assert_eq!(scroll_offset(5, 10, Some(4), false), 0);
        assert_eq!(scroll_offset(100, 10, None, false), 0);
        assert_eq!(scroll_offset(100, 10, Some(50), false), 45);
        assert_eq!(scroll_offset(100, 10, Some(3), false), 0);
        assert_eq!(scroll_offset(100, 10, Some(80), true), 80);
        assert_eq!(scroll_offset(100, 10, Some(97), true), 90);
    }

    #[test]
    fn test_line_of_follows_walk_order() {
        let roots = vec![
            Block::paragraph("a", "").with_children(vec![Block::paragraph("b", "")]),
            Block::paragraph("c", ""),
        ];
        assert_eq!(line_of(&roots, &BlockId::new("c")), Some(2));
        assert_eq!(line_of(&roots, &BlockId::new("zz")), None);
    }

    #[test]
    fn test_highlight_mark_in_idle() {
        let mut block = Block::paragraph("a", "bright");
        if let BlockKind::Content(c) = &mut block.kind {
            c.props.insert("backgroundColor".into(), "yellow".into());
        }
        let text = outline(&[block], &SessionState::Idle, "yellow");
        assert_eq!(text, " * bright\n");
    }
}
