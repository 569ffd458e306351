//! One-shot subcommands against the document store.

use std::path::Path;

use anyhow::{Context, Result, bail};
use sift_engine::{EngineOptions, Processor, hide};
use sift_store::DocumentDb;
use sift_tree::{BlockTree, BlockTreeAdapter};
use sift_types::{Block, BlockId, BlockKind, ContentBlock, DocumentId, codec};
use tracing::info;

use crate::render;

/// Load a stored document into an in-memory tree.
pub fn load_tree(db: &DocumentDb, id: DocumentId) -> Result<BlockTree> {
    let record = db
        .get(id)?
        .with_context(|| format!("document {} not found", id.short()))?;
    BlockTree::from_content(&record.content)
        .with_context(|| format!("document {} has unreadable content", id.short()))
}

/// Turn file contents into blocks.
///
/// Encoded documents (versioned or a bare block array) are taken as is.
/// Anything else is read as plain text: `#` lines become headings, `- ` lines
/// bullet items, other non-empty lines paragraphs.
pub fn blocks_from_file(text: &str) -> Vec<Block> {
    let trimmed = text.trim_start();
    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && let Ok(blocks) = codec::decode_document(text)
    {
        return blocks;
    }
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let id = BlockId::fresh();
            let hashes = line.chars().take_while(|c| *c == '#').count();
            if (1..=3).contains(&hashes) {
                Block::heading(id, hashes as u8, line[hashes..].trim())
            } else if let Some(item) = line.strip_prefix("- ") {
                Block::new(id, BlockKind::Content(ContentBlock::with_text("bulletListItem", item)))
            } else {
                Block::paragraph(id, line)
            }
        })
        .collect()
}

pub fn import(db: &DocumentDb, file: &Path, title: Option<String>, parent: Option<&str>) -> Result<DocumentId> {
    let text = std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let blocks = blocks_from_file(&text);
    let content = codec::encode_document(&blocks)?;
    let parent = parent.map(|p| db.resolve(p)).transpose()?;
    let title = title.unwrap_or_else(|| {
        file.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_string())
    });
    let id = db.insert_document(&title, parent, &content)?;
    info!(document = %id.short(), blocks = blocks.len(), "imported");
    Ok(id)
}

pub fn list(db: &DocumentDb, include_archived: bool) -> Result<String> {
    let docs = db.list_documents(include_archived)?;
    Ok(render::document_table(&docs))
}

pub fn show(db: &DocumentDb, query: &str, options: &EngineOptions) -> Result<String> {
    let id = db.resolve(query)?;
    let tree = load_tree(db, id)?;
    Ok(render::outline(
        tree.blocks(),
        &sift_engine::SessionState::Idle,
        &options.highlight_color,
    ))
}

/// Re-encode the stored content in the current format.
pub fn export(db: &DocumentDb, query: &str) -> Result<String> {
    let id = db.resolve(query)?;
    let tree = load_tree(db, id)?;
    Ok(tree.to_content()?)
}

/// Restore every hidden-container in a document. Returns how many were opened.
pub fn untoggle(db: &DocumentDb, query: &str) -> Result<usize> {
    let id = db.resolve(query)?;
    let mut tree = load_tree(db, id)?;
    let restored = hide::untoggle_all(&mut tree)?;
    if restored > 0 {
        db.update_content(id, &tree.to_content()?)?;
    }
    info!(document = %id.short(), restored, "untoggled");
    Ok(restored)
}

/// Turn `block` into a link to a new child document.
pub fn page(db: DocumentDb, query: &str, block: &str, title: &str, options: EngineOptions) -> Result<DocumentId> {
    let id = db.resolve(query)?;
    let mut tree = load_tree(&db, id)?;
    let block = BlockId::new(block);
    if !tree.contains(&block) {
        bail!("block {block} not found in document {}", id.short());
    }
    tree.set_cursor(Some(block.clone()));

    let (mut processor, mut notices) = Processor::new(id, tree, db, options);
    let created = processor.create_sub_page(title)?;
    if let Ok(notice) = notices.try_recv() {
        bail!("{notice}");
    }
    created.with_context(|| format!("block {block} cannot become a page-link"))
}
