//! Document service: where documents live between sessions.
//!
//! The engine only needs to create sub-pages, save content and archive pages
//! whose link disappeared. `load` and `list` serve the CLI. Implementations:
//! [`InMemoryDocuments`] here, and the SQLite store in `sift-store`.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use sift_types::DocumentId;
use thiserror::Error;

/// Errors a document service may report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("document not found: {0}")]
    NotFound(DocumentId),

    /// Parent given to `create` does not exist.
    #[error("parent document not found: {0}")]
    ParentNotFound(DocumentId),

    /// Storage backend failure, stringified.
    #[error("backend error: {0}")]
    Backend(String),
}

/// A stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub title: String,
    pub parent: Option<DocumentId>,
    /// Encoded block content (see `sift_types::codec`); empty for a new page.
    pub content: String,
    pub is_archived: bool,
    /// Unix seconds.
    pub created_at: i64,
    /// Unix seconds.
    pub updated_at: i64,
}

/// Persistence operations consumed by the engine and the CLI.
pub trait DocumentService {
    /// Create an empty document, optionally as a child of `parent`.
    fn create(&mut self, title: &str, parent: Option<DocumentId>) -> Result<DocumentId, ServiceError>;

    /// Replace a document's content.
    fn update(&mut self, id: DocumentId, content: &str) -> Result<(), ServiceError>;

    /// Archive a document and every descendant document.
    fn archive(&mut self, id: DocumentId) -> Result<(), ServiceError>;

    fn load(&self, id: DocumentId) -> Result<DocumentRecord, ServiceError>;

    /// Non-archived documents, oldest first.
    fn list(&self) -> Result<Vec<DocumentRecord>, ServiceError>;
}

/// Current time as Unix seconds.
pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Process-local document service for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct InMemoryDocuments {
    docs: HashMap<DocumentId, DocumentRecord>,
    /// Insertion order, for stable listing.
    order: Vec<DocumentId>,
}

impl InMemoryDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document with content in one step.
    pub fn insert(&mut self, title: &str, content: &str) -> DocumentId {
        let now = now_secs();
        let record = DocumentRecord {
            id: DocumentId::new(),
            title: title.to_string(),
            parent: None,
            content: content.to_string(),
            is_archived: false,
            created_at: now,
            updated_at: now,
        };
        let id = record.id;
        self.docs.insert(id, record);
        self.order.push(id);
        id
    }

    fn get_mut(&mut self, id: DocumentId) -> Result<&mut DocumentRecord, ServiceError> {
        self.docs.get_mut(&id).ok_or(ServiceError::NotFound(id))
    }
}

impl DocumentService for InMemoryDocuments {
    fn create(&mut self, title: &str, parent: Option<DocumentId>) -> Result<DocumentId, ServiceError> {
        if let Some(parent) = parent
            && !self.docs.contains_key(&parent)
        {
            return Err(ServiceError::ParentNotFound(parent));
        }
        let id = self.insert(title, "");
        self.get_mut(id)?.parent = parent;
        Ok(id)
    }

    fn update(&mut self, id: DocumentId, content: &str) -> Result<(), ServiceError> {
        let doc = self.get_mut(id)?;
        doc.content = content.to_string();
        doc.updated_at = now_secs();
        Ok(())
    }

    fn archive(&mut self, id: DocumentId) -> Result<(), ServiceError> {
        self.get_mut(id)?;
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(doc) = self.docs.get_mut(&current) {
                doc.is_archived = true;
                doc.updated_at = now_secs();
            }
            pending.extend(
                self.docs
                    .values()
                    .filter(|d| d.parent == Some(current) && !d.is_archived)
                    .map(|d| d.id),
            );
        }
        Ok(())
    }

    fn load(&self, id: DocumentId) -> Result<DocumentRecord, ServiceError> {
        self.docs.get(&id).cloned().ok_or(ServiceError::NotFound(id))
    }

    fn list(&self) -> Result<Vec<DocumentRecord>, ServiceError> {
        Ok(self
            .order
            .iter()
            .filter_map(|id| self.docs.get(id))
            .filter(|d| !d.is_archived)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_update_load() {
        let mut svc = InMemoryDocuments::new();
        let root = svc.insert("Notes", "[]");
        let child = svc.create("Child", Some(root)).unwrap();
        svc.update(child, "{\"version\":1,\"blocks\":[]}").unwrap();

        let loaded = svc.load(child).unwrap();
        assert_eq!(loaded.title, "Child");
        assert_eq!(loaded.parent, Some(root));
        assert!(loaded.content.contains("version"));
        assert_eq!(svc.list().unwrap().len(), 2);
    }

    #[test]
    fn test_create_with_unknown_parent() {
        let mut svc = InMemoryDocuments::new();
        let ghost = DocumentId::new();
        assert_eq!(svc.create("x", Some(ghost)), Err(ServiceError::ParentNotFound(ghost)));
    }

    #[test]
    fn test_archive_cascades_to_children() {
        let mut svc = InMemoryDocuments::new();
        let root = svc.insert("root", "");
        let child = svc.create("child", Some(root)).unwrap();
        let grandchild = svc.create("grandchild", Some(child)).unwrap();
        let other = svc.insert("other", "");

        svc.archive(child).unwrap();
        assert!(svc.load(grandchild).unwrap().is_archived);
        let listed: Vec<DocumentId> = svc.list().unwrap().iter().map(|d| d.id).collect();
        assert_eq!(listed, vec![root, other]);
    }

    #[test]
    fn test_missing_document() {
        let mut svc = InMemoryDocuments::new();
        let ghost = DocumentId::new();
        assert_eq!(svc.update(ghost, ""), Err(ServiceError::NotFound(ghost)));
        assert_eq!(svc.archive(ghost), Err(ServiceError::NotFound(ghost)));
    }
}
