//! Typed identifiers for documents and blocks.
//!
//! `DocumentId` wraps a UUIDv7 (time-ordered, globally unique) and displays as
//! standard UUID text for logging. The `short()` form (first 8 hex chars) is
//! for human-facing output only, never a lookup key.
//!
//! `BlockId` is an opaque string: the rendering layer mints its own ids and the
//! engine must carry them through hide/restore untouched. Ids the engine mints
//! itself are UUIDv7 strings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A document identifier (UUIDv7).
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(uuid::Uuid);

impl DocumentId {
    /// Create a new time-ordered ID (UUIDv7).
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// First 8 hex characters, for human display only (not lookup).
    pub fn short(&self) -> String {
        self.0.as_simple().to_string()[..8].to_string()
    }

    /// Full 32-character hex string (no hyphens).
    pub fn to_hex(&self) -> String {
        self.0.as_simple().to_string()
    }

    /// Parse from a hex string (32 chars, no hyphens) or standard UUID format.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        uuid::Uuid::parse_str(s).map(Self)
    }

    /// Check if a query string matches this ID by hex prefix.
    pub fn matches_hex_prefix(&self, prefix: &str) -> bool {
        self.to_hex().starts_with(prefix)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<uuid::Uuid> for DocumentId {
    fn from(u: uuid::Uuid) -> Self {
        Self(u)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.short())
    }
}

/// Fixed namespace for deriving deterministic block ids via UUIDv5.
const SIFT_BLOCK_NS: uuid::Uuid = uuid::uuid!("3f0c2a9e-6d41-4b7a-9e15-c8d2a7b04f61");

/// Opaque block identifier, unique within one document snapshot.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    /// Wrap an existing id string (as produced by the rendering layer).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh, globally unique id (UUIDv7 text).
    pub fn fresh() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// The deterministic id of the Summary heading appended to `document`.
    ///
    /// Same document always yields the same id, so the host can scroll to it
    /// after a Collect without being told anything else.
    pub fn summary_heading(document: DocumentId) -> Self {
        let mut name = b"summary-heading:".to_vec();
        name.extend_from_slice(document.as_uuid().as_bytes());
        Self(uuid::Uuid::new_v5(&SIFT_BLOCK_NS, &name).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, for human display only.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for BlockId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({})", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_new_is_unique() {
        assert_ne!(DocumentId::new(), DocumentId::new());
    }

    #[test]
    fn test_document_id_parse_roundtrip() {
        let id = DocumentId::new();
        assert_eq!(DocumentId::parse(&id.to_string()).unwrap(), id);
        assert_eq!(DocumentId::parse(&id.to_hex()).unwrap(), id);
    }

    #[test]
    fn test_document_id_short_and_prefix() {
        let id = DocumentId::new();
        assert_eq!(id.short().len(), 8);
        assert!(id.matches_hex_prefix(&id.short()));
        assert!(!id.matches_hex_prefix("zz"));
    }

    #[test]
    fn test_document_id_serde_is_transparent() {
        let id = DocumentId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }

    #[test]
    fn test_block_id_fresh_is_unique() {
        let a = BlockId::fresh();
        let b = BlockId::fresh();
        assert_ne!(a, b);
    }

    #[test]
    fn test_summary_heading_is_deterministic() {
        let doc = DocumentId::new();
        assert_eq!(BlockId::summary_heading(doc), BlockId::summary_heading(doc));
        assert_ne!(
            BlockId::summary_heading(doc),
            BlockId::summary_heading(DocumentId::new())
        );
    }

    #[test]
    fn test_block_id_short_handles_short_ids() {
        assert_eq!(BlockId::new("p1").short(), "p1");
        assert_eq!(BlockId::new("0123456789").short(), "01234567");
    }

    #[test]
    fn test_block_id_serde_is_transparent() {
        let id = BlockId::new("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
