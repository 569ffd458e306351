//! Versioned string encodings for document content and hidden payloads.
//!
//! Both use the same envelope:
//!
//! ```text
//! { "version": 1, "blocks": [ Block, ... ] }
//! ```
//!
//! Decoders also accept a bare JSON array of blocks, which is what the
//! rendering layer writes natively. Round-trip law: `decode(encode(x)) == x`.

use serde::{Deserialize, Serialize};

use crate::block::Block;

/// Current envelope version.
pub const FORMAT_VERSION: u32 = 1;

/// Errors from encoding or decoding block sequences.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported format version {0} (expected {FORMAT_VERSION})")]
    UnsupportedVersion(u32),
}

pub type Result<T> = std::result::Result<T, CodecError>;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    blocks: &'a [Block],
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    blocks: Vec<Block>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Incoming {
    Versioned(Envelope),
    Bare(Vec<Block>),
}

fn decode(s: &str) -> Result<Vec<Block>> {
    match serde_json::from_str::<Incoming>(s)? {
        Incoming::Versioned(env) if env.version == FORMAT_VERSION => Ok(env.blocks),
        Incoming::Versioned(env) => Err(CodecError::UnsupportedVersion(env.version)),
        Incoming::Bare(blocks) => Ok(blocks),
    }
}

/// Encode a document's root blocks (pretty-printed, the stored form).
pub fn encode_document(blocks: &[Block]) -> Result<String> {
    let env = EnvelopeRef {
        version: FORMAT_VERSION,
        blocks,
    };
    Ok(serde_json::to_string_pretty(&env)?)
}

/// Decode stored document content. An empty string is an empty document.
pub fn decode_document(s: &str) -> Result<Vec<Block>> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    decode(s)
}

/// Encode the snapshots held by a hidden-container.
pub fn encode_payload(blocks: &[Block]) -> Result<String> {
    let env = EnvelopeRef {
        version: FORMAT_VERSION,
        blocks,
    };
    Ok(serde_json::to_string(&env)?)
}

/// Decode a hidden-container payload.
pub fn decode_payload(s: &str) -> Result<Vec<Block>> {
    decode(s)
}

// ============================================================================
// Tests
// ============================================================================
