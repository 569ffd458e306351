//! Shared identity, block, and wire-format types for Sift.
//!
//! A pure leaf crate with **no internal sift dependencies**; the tree adapter,
//! engine, store, and CLI all build on it.
//!
//! # Key Types
//!
//! |------------------|-----------------------------------------------------|
//! | Type             | Purpose                                             |
//! |------------------|-----------------------------------------------------|
//! | [`DocumentId`]   | Which document (UUIDv7)                             |
//! | [`BlockId`]      | Opaque block id, unique within a snapshot           |
//! | [`Block`]        | Tree node: id + [`BlockKind`] + children            |
//! | [`BlockKind`]    | Content / PageLink / Hidden                         |
//! | [`ContentBlock`] | Renderer type name, props, inline content, verbatim |
//! |------------------|-----------------------------------------------------|
//!
//! Encoding lives in [`codec`].

pub mod block;
pub mod codec;
pub mod ids;

pub use block::{
    Block, BlockKind, BlockShapeError, CLEARED_HIGHLIGHT, ContentBlock, DEFAULT_HIGHLIGHT_COLOR,
    HIDDEN_TYPE, HIGHLIGHT_PROP, ORIGINAL_CONTENT_PROP, PAGE_ID_PROP, PAGE_LINK_TYPE,
};
pub use codec::CodecError;
pub use ids::{BlockId, DocumentId};
