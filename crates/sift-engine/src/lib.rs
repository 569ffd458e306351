//! Review engine for Sift.
//!
//! Walks a document block by block and lets the user keep, highlight or hide
//! each one. Hiding is reversible: hidden blocks are folded into
//! hidden-containers that carry their serialized snapshots. When the walk
//! runs off the end, Collect copies what is still visible under a Summary
//! heading.
//!
//! # Layers
//!
//! - [`traversal`]: pure document-order queries (first/next/previous eligible,
//!   run boundaries).
//! - [`hide`], [`highlight`], [`partition`]: the tree transforms.
//! - [`Session`]: the Idle / Active / ReviewComplete state machine.
//! - [`Processor`]: intent loop with chrome requests, notifications and
//!   persistence through a [`DocumentService`].
//!
//! The engine never owns the document; it works through
//! [`sift_tree::BlockTreeAdapter`].

mod error;
pub mod hide;
pub mod highlight;
mod intent;
mod notify;
mod options;
pub mod pages;
pub mod partition;
mod processor;
mod service;
mod session;
pub mod traversal;

pub use error::EngineError;
pub use hide::{HideOutcome, Merge, RestoreOutcome};
pub use intent::{ChromeRequest, Intent, RequestHandle};
pub use notify::{Notification, NotificationReceiver};
pub use options::EngineOptions;
pub use pages::PageLinkTracker;
pub use partition::CollectOutcome;
pub use processor::Processor;
pub use service::{DocumentRecord, DocumentService, InMemoryDocuments, ServiceError, now_secs};
pub use session::{Phase, Session, SessionState, Transition};

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
