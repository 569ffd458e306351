//! Block model: a tagged union over what the engine needs to tell apart.
//!
//! ## Design: three categories, one open bucket
//!
//! The rendering layer has an open-ended set of block types (paragraph,
//! heading, list items, code, images...). The engine only cares about three
//! categories:
//!
//! - [`BlockKind::PageLink`]: a reference to another document. Never reviewed.
//! - [`BlockKind::Hidden`]: a container holding the serialized snapshots of
//!   blocks the user hid. Never reviewed, never has children.
//! - [`BlockKind::Content`]: everything else. Type name, props and inline
//!   content are carried verbatim so the rendering layer's format survives a
//!   hide/restore round trip untouched.
//!
//! On the wire a block is `{"id","type","props","content"?,"children"}`; see
//! [`crate::codec`] for the document and payload envelopes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::{BlockId, DocumentId};

/// Wire type name of page-link blocks.
pub const PAGE_LINK_TYPE: &str = "page";
/// Wire type name of hidden-container blocks.
pub const HIDDEN_TYPE: &str = "hidden";
/// Prop holding a page-link's target document.
pub const PAGE_ID_PROP: &str = "pageId";
/// Prop holding a hidden-container's payload.
pub const ORIGINAL_CONTENT_PROP: &str = "originalContent";

/// Prop used as the highlight marker on content blocks.
pub const HIGHLIGHT_PROP: &str = "backgroundColor";
/// Default highlight value. A block is highlighted when its marker prop equals it.
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "yellow";
/// Value written when a highlight is cleared (the renderer's "no colour").
pub const CLEARED_HIGHLIGHT: &str = "default";

/// A node in the document tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBlock", into = "RawBlock")]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    /// Always empty for [`BlockKind::Hidden`].
    pub children: Vec<Block>,
}

/// What a block is, as far as the engine is concerned.
#[derive(Clone, Debug, PartialEq)]
pub enum BlockKind {
    /// Any renderable block the engine does not need to distinguish.
    Content(ContentBlock),
    /// Link to another document (`pageId` may be empty before the page exists).
    PageLink { page_id: String },
    /// Reversible container. `original_content` is an encoded payload
    /// (see [`crate::codec::decode_payload`]); it may be malformed.
    Hidden { original_content: String },
}

/// Type-keyed data of an ordinary block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContentBlock {
    /// Renderer type name (`paragraph`, `heading`, `bulletListItem`, ...).
    pub block_type: String,
    pub props: Map<String, Value>,
    /// Inline content, absent for blocks without text.
    pub content: Option<Value>,
}

impl ContentBlock {
    pub fn new(block_type: impl Into<String>) -> Self {
        Self {
            block_type: block_type.into(),
            props: Map::new(),
            content: None,
        }
    }

    /// Content block holding a single unstyled text run.
    pub fn with_text(block_type: impl Into<String>, text: &str) -> Self {
        let content = if text.is_empty() {
            Value::Array(Vec::new())
        } else {
            serde_json::json!([{ "type": "text", "text": text, "styles": {} }])
        };
        Self {
            block_type: block_type.into(),
            props: Map::new(),
            content: Some(content),
        }
    }
}

impl BlockKind {
    /// Check if the review cursor may land on this kind.
    pub fn is_eligible(&self) -> bool {
        matches!(self, BlockKind::Content(_))
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self, BlockKind::Hidden { .. })
    }

    /// Wire type name.
    pub fn type_name(&self) -> &str {
        match self {
            BlockKind::Content(c) => &c.block_type,
            BlockKind::PageLink { .. } => PAGE_LINK_TYPE,
            BlockKind::Hidden { .. } => HIDDEN_TYPE,
        }
    }
}

impl Block {
    pub fn new(id: impl Into<BlockId>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            kind,
            children: Vec::new(),
        }
    }

    /// A paragraph with plain text.
    pub fn paragraph(id: impl Into<BlockId>, text: &str) -> Self {
        Self::new(id, BlockKind::Content(ContentBlock::with_text("paragraph", text)))
    }

    /// A heading of the given level with plain text.
    pub fn heading(id: impl Into<BlockId>, level: u8, text: &str) -> Self {
        let mut content = ContentBlock::with_text("heading", text);
        content.props.insert("level".to_string(), Value::from(level));
        Self::new(id, BlockKind::Content(content))
    }

    /// A link to another document.
    pub fn page_link(id: impl Into<BlockId>, page: DocumentId) -> Self {
        Self::new(
            id,
            BlockKind::PageLink {
                page_id: page.to_string(),
            },
        )
    }

    /// A hidden-container holding an already-encoded payload.
    pub fn hidden(id: impl Into<BlockId>, original_content: impl Into<String>) -> Self {
        Self::new(
            id,
            BlockKind::Hidden {
                original_content: original_content.into(),
            },
        )
    }

    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = children;
        self
    }

    pub fn is_eligible(&self) -> bool {
        self.kind.is_eligible()
    }

    pub fn is_hidden(&self) -> bool {
        self.kind.is_hidden()
    }

    /// Check if the highlight marker is set to `color`.
    pub fn is_highlighted_with(&self, color: &str) -> bool {
        match &self.kind {
            BlockKind::Content(c) => c.props.get(HIGHLIGHT_PROP).and_then(Value::as_str) == Some(color),
            _ => false,
        }
    }

    /// Check if the default highlight marker is set.
    pub fn is_highlighted(&self) -> bool {
        self.is_highlighted_with(DEFAULT_HIGHLIGHT_COLOR)
    }

    /// Target document of a page-link, when it parses.
    pub fn linked_document(&self) -> Option<DocumentId> {
        match &self.kind {
            BlockKind::PageLink { page_id } => DocumentId::parse(page_id).ok(),
            _ => None,
        }
    }

    /// Concatenated text of the inline content (links included).
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        if let BlockKind::Content(ContentBlock { content: Some(v), .. }) = &self.kind {
            collect_text(v, &mut out);
        }
        out
    }

    /// Ids of this block and all its descendants, pre-order.
    pub fn subtree_ids(&self) -> Vec<BlockId> {
        let mut ids = vec![self.id.clone()];
        for child in &self.children {
            ids.extend(child.subtree_ids());
        }
        ids
    }
}

fn collect_text(value: &Value, out: &mut String) {
    match value {
        Value::String(s) => out.push_str(s),
        Value::Array(items) => items.iter().for_each(|v| collect_text(v, out)),
        Value::Object(obj) => {
            if let Some(Value::String(text)) = obj.get("text") {
                out.push_str(text);
            }
            if let Some(inner) = obj.get("content") {
                collect_text(inner, out);
            }
        }
        _ => {}
    }
}

// ============================================================================
// Wire representation
// ============================================================================

/// Rejected block shapes.
#[derive(Debug, thiserror::Error)]
#[error("malformed block {id}: {reason}")]
pub struct BlockShapeError {
    pub id: BlockId,
    pub reason: &'static str,
}

/// Loosely-typed wire record; converted to [`Block`] on the way in.
#[derive(Serialize, Deserialize)]
struct RawBlock {
    id: BlockId,
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    props: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<Value>,
    #[serde(default)]
    children: Vec<Block>,
}

fn string_prop(props: &Map<String, Value>, key: &str) -> String {
    props
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

impl TryFrom<RawBlock> for Block {
    type Error = BlockShapeError;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        let kind = match raw.block_type.as_str() {
            PAGE_LINK_TYPE => BlockKind::PageLink {
                page_id: string_prop(&raw.props, PAGE_ID_PROP),
            },
            HIDDEN_TYPE => {
                if !raw.children.is_empty() {
                    return Err(BlockShapeError {
                        id: raw.id,
                        reason: "hidden container with children",
                    });
                }
                BlockKind::Hidden {
                    original_content: string_prop(&raw.props, ORIGINAL_CONTENT_PROP),
                }
            }
            "" => {
                return Err(BlockShapeError {
                    id: raw.id,
                    reason: "empty type",
                });
            }
            _ => BlockKind::Content(ContentBlock {
                block_type: raw.block_type,
                props: raw.props,
                content: raw.content,
            }),
        };
        Ok(Block {
            id: raw.id,
            kind,
            children: raw.children,
        })
    }
}

impl From<Block> for RawBlock {
    fn from(block: Block) -> Self {
        let (block_type, props, content) = match block.kind {
            BlockKind::Content(c) => (c.block_type, c.props, c.content),
            BlockKind::PageLink { page_id } => {
                let mut props = Map::new();
                props.insert(PAGE_ID_PROP.to_string(), Value::String(page_id));
                (PAGE_LINK_TYPE.to_string(), props, None)
            }
            BlockKind::Hidden { original_content } => {
                let mut props = Map::new();
                props.insert(ORIGINAL_CONTENT_PROP.to_string(), Value::String(original_content));
                (HIDDEN_TYPE.to_string(), props, None)
            }
        };
        RawBlock {
            id: block.id,
            block_type,
            props,
            content,
            children: block.children,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
