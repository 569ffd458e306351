//! SQLite persistence for documents.
//!
//! One row per document; content is the encoded block tree as written by the
//! engine. Archiving is soft and cascades to child documents.

use std::path::Path;

use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use sift_engine::{DocumentRecord, DocumentService, ServiceError, now_secs};
use sift_types::DocumentId;
use tracing::debug;

use crate::error::StoreError;
use crate::Result;

/// Database handle for document persistence.
pub struct DocumentDb {
    conn: Connection,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    parent_id TEXT REFERENCES documents(id),
    content TEXT NOT NULL DEFAULT '',
    is_archived INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_documents_parent ON documents(parent_id);
"#;

const COLUMNS: &str = "id, title, parent_id, content, is_archived, created_at, updated_at";

fn parse_id(idx: usize, text: String) -> rusqlite::Result<DocumentId> {
    DocumentId::parse(&text).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<DocumentRecord> {
    let parent: Option<String> = row.get(2)?;
    Ok(DocumentRecord {
        id: parse_id(0, row.get(0)?)?,
        title: row.get(1)?,
        parent: parent.map(|p| parse_id(2, p)).transpose()?,
        content: row.get(3)?,
        is_archived: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

impl DocumentDb {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Create an in-memory database (for testing and `--ephemeral`).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // =========================================================================
    // Documents
    // =========================================================================

    /// Insert a new document with content.
    pub fn insert_document(&self, title: &str, parent: Option<DocumentId>, content: &str) -> Result<DocumentId> {
        if let Some(parent) = parent
            && self.get(parent)?.is_none()
        {
            return Err(StoreError::NotFound(parent));
        }
        let id = DocumentId::new();
        let now = now_secs();
        self.conn.execute(
            "INSERT INTO documents (id, title, parent_id, content, is_archived, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)",
            params![id.to_string(), title, parent.map(|p| p.to_string()), content, now],
        )?;
        debug!(document = %id.short(), title, "inserted document");
        Ok(id)
    }

    /// Get a document by id, archived or not.
    pub fn get(&self, id: DocumentId) -> Result<Option<DocumentRecord>> {
        let sql = format!("SELECT {COLUMNS} FROM documents WHERE id = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![id.to_string()], record_from_row)
            .optional()?)
    }

    /// List documents, oldest first.
    pub fn list_documents(&self, include_archived: bool) -> Result<Vec<DocumentRecord>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM documents WHERE is_archived = 0 OR ?1 ORDER BY created_at, rowid"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![include_archived], record_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Direct children of a document.
    pub fn children(&self, parent: DocumentId) -> Result<Vec<DocumentRecord>> {
        let sql = format!("SELECT {COLUMNS} FROM documents WHERE parent_id = ?1 ORDER BY created_at, rowid");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![parent.to_string()], record_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Replace a document's content.
    pub fn update_content(&self, id: DocumentId, content: &str) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE documents SET content = ?1, updated_at = ?2 WHERE id = ?3",
            params![content, now_secs(), id.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    /// Archive a document and all its descendants. Returns how many rows changed.
    pub fn archive_tree(&self, id: DocumentId) -> Result<usize> {
        if self.get(id)?.is_none() {
            return Err(StoreError::NotFound(id));
        }
        let changed = self.conn.execute(
            "WITH RECURSIVE subtree(id) AS (
                 SELECT id FROM documents WHERE id = ?1
                 UNION ALL
                 SELECT d.id FROM documents d JOIN subtree s ON d.parent_id = s.id
             )
             UPDATE documents SET is_archived = 1, updated_at = ?2
             WHERE id IN subtree AND is_archived = 0",
            params![id.to_string(), now_secs()],
        )?;
        debug!(document = %id.short(), changed, "archived document tree");
        Ok(changed)
    }

    /// Resolve a full id or a hex prefix of one (hyphens ignored).
    pub fn resolve(&self, query: &str) -> Result<DocumentId> {
        if let Ok(id) = DocumentId::parse(query) {
            return Ok(id);
        }
        let prefix: String = query.chars().filter(|c| *c != '-').collect::<String>().to_lowercase();
        let matches: Vec<DocumentId> = self
            .list_documents(true)?
            .into_iter()
            .map(|d| d.id)
            .filter(|id| id.matches_hex_prefix(&prefix))
            .collect();
        match matches.as_slice() {
            [] => Err(StoreError::NoMatch(query.to_string())),
            [one] => Ok(*one),
            many => Err(StoreError::Ambiguous {
                prefix: query.to_string(),
                count: many.len(),
            }),
        }
    }
}

// ============================================================================
// DocumentService
// ============================================================================

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ServiceError::NotFound(id),
            other => ServiceError::Backend(other.to_string()),
        }
    }
}

impl DocumentService for DocumentDb {
    fn create(&mut self, title: &str, parent: Option<DocumentId>) -> std::result::Result<DocumentId, ServiceError> {
        self.insert_document(title, parent, "").map_err(|e| match e {
            StoreError::NotFound(id) => ServiceError::ParentNotFound(id),
            other => other.into(),
        })
    }

    fn update(&mut self, id: DocumentId, content: &str) -> std::result::Result<(), ServiceError> {
        Ok(self.update_content(id, content)?)
    }

    fn archive(&mut self, id: DocumentId) -> std::result::Result<(), ServiceError> {
        self.archive_tree(id)?;
        Ok(())
    }

    fn load(&self, id: DocumentId) -> std::result::Result<DocumentRecord, ServiceError> {
        self.get(id)?.ok_or(ServiceError::NotFound(id))
    }

    fn list(&self) -> std::result::Result<Vec<DocumentRecord>, ServiceError> {
        Ok(self.list_documents(false)?)
    }
}
