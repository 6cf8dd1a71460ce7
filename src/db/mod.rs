//! The document store.
//!
//! Records are JSON documents addressed by slash-separated paths (see
//! [`paths`]). The store offers point reads, filtered queries with a limit,
//! collection-group queries across every household, shallow merges,
//! conditional merges and a change feed. Writes are last-write-wins per
//! document. The store never validates what it holds; readers do.

mod schema;
pub mod paths;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

/// How many unread change events a slow subscriber may fall behind by
/// before it has to re-read its snapshot.
const CHANGE_FEED_CAPACITY: usize = 256;

const DOCUMENT_COLUMNS: &str = "path, doc_id, data";

pub struct Database {
    conn: Arc<Mutex<Connection>>,
    changes: broadcast::Sender<DocumentChange>,
}

/// A raw document as held by the store.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub path: String,
    pub id: String,
    pub data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Written,
    Deleted,
}

/// Notification that a document was written or deleted.
#[derive(Debug, Clone)]
pub struct DocumentChange {
    pub path: String,
    pub collection: String,
    pub kind: ChangeKind,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self::from_connection(conn))
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            conn: Arc::new(Mutex::new(conn)),
            changes,
        }
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    /// Subscribe to every write and delete from now on.
    pub fn watch(&self) -> broadcast::Receiver<DocumentChange> {
        self.changes.subscribe()
    }

    // ============================================================
    // Reads
    // ============================================================

    pub fn get(&self, path: &str) -> Result<Option<StoredDocument>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let doc = conn
            .query_row(
                &format!("SELECT {} FROM documents WHERE path = ?", DOCUMENT_COLUMNS),
                [path],
                read_document,
            )
            .optional()?;
        Ok(doc)
    }

    /// Every document directly inside `collection`, oldest first.
    pub fn list(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM documents WHERE collection = ? ORDER BY created_at, doc_id",
            DOCUMENT_COLUMNS
        ))?;

        let docs = stmt
            .query_map([collection], read_document)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(docs)
    }

    /// Documents in `collection` whose string `field` equals `value`.
    pub fn find_where(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        limit: usize,
    ) -> Result<Vec<StoredDocument>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM documents
             WHERE collection = ? AND json_extract(data, ?) = ?
             ORDER BY created_at, doc_id LIMIT ?",
            DOCUMENT_COLUMNS
        ))?;

        let docs = stmt
            .query_map(
                (collection, json_path(field), value, limit as i64),
                read_document,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(docs)
    }

    /// Like [`find_where`](Self::find_where), but across every collection
    /// whose last path segment is `group` (e.g. all `crew` collections).
    pub fn find_in_group(
        &self,
        group: &str,
        field: &str,
        value: &str,
        limit: usize,
    ) -> Result<Vec<StoredDocument>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM documents
             WHERE collection_group = ? AND json_extract(data, ?) = ?
             ORDER BY created_at, doc_id LIMIT ?",
            DOCUMENT_COLUMNS
        ))?;

        let docs = stmt
            .query_map(
                (group, json_path(field), value, limit as i64),
                read_document,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(docs)
    }

    // ============================================================
    // Writes
    // ============================================================

    /// Create or replace the document at `path`.
    pub fn set(&self, path: &str, data: &Value) -> Result<()> {
        let (collection, id) = split_path(path)?;
        let now = Utc::now().to_rfc3339();
        {
            let conn = self.conn.lock().expect("database lock poisoned");
            conn.execute(
                "INSERT INTO documents (path, collection, collection_group, doc_id, data, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                 ON CONFLICT(path) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
                (
                    path,
                    collection,
                    paths::group_of(collection),
                    id,
                    serde_json::to_string(data)?,
                    &now,
                ),
            )?;
        }
        self.notify(path, collection, ChangeKind::Written);
        Ok(())
    }

    /// Create the document at `path` only if nothing is there yet.
    ///
    /// Returns `false` when a document already exists.
    pub fn create(&self, path: &str, data: &Value) -> Result<bool> {
        let (collection, id) = split_path(path)?;
        let now = Utc::now().to_rfc3339();
        let rows = {
            let conn = self.conn.lock().expect("database lock poisoned");
            conn.execute(
                "INSERT OR IGNORE INTO documents (path, collection, collection_group, doc_id, data, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                (
                    path,
                    collection,
                    paths::group_of(collection),
                    id,
                    serde_json::to_string(data)?,
                    &now,
                ),
            )?
        };
        if rows > 0 {
            self.notify(path, collection, ChangeKind::Written);
        }
        Ok(rows > 0)
    }

    /// Add a document under a generated id and return the id.
    pub fn add(&self, collection: &str, data: &Value) -> Result<String> {
        let id = Uuid::new_v4().simple().to_string();
        self.set(&format!("{}/{}", collection, id), data)?;
        Ok(id)
    }

    /// Shallow-merge `fields` into the existing document at `path`.
    ///
    /// Returns `false` when there is no such document.
    pub fn merge(&self, path: &str, fields: &Value) -> Result<bool> {
        let (collection, _) = split_path(path)?;
        let rows = {
            let conn = self.conn.lock().expect("database lock poisoned");
            conn.execute(
                "UPDATE documents SET data = json_patch(data, ?1), updated_at = ?2 WHERE path = ?3",
                (serde_json::to_string(fields)?, Utc::now().to_rfc3339(), path),
            )?
        };
        if rows > 0 {
            self.notify(path, collection, ChangeKind::Written);
        }
        Ok(rows > 0)
    }

    /// Merge `fields` only if the string `field` still equals `expected`.
    ///
    /// The check and the write happen in one statement, so two writers
    /// racing on the same precondition cannot both succeed. Returns
    /// `false` when the document is missing or the precondition failed.
    pub fn merge_if(&self, path: &str, field: &str, expected: &str, fields: &Value) -> Result<bool> {
        let (collection, _) = split_path(path)?;
        let rows = {
            let conn = self.conn.lock().expect("database lock poisoned");
            conn.execute(
                "UPDATE documents SET data = json_patch(data, ?1), updated_at = ?2
                 WHERE path = ?3 AND json_extract(data, ?4) = ?5",
                (
                    serde_json::to_string(fields)?,
                    Utc::now().to_rfc3339(),
                    path,
                    json_path(field),
                    expected,
                ),
            )?
        };
        if rows > 0 {
            self.notify(path, collection, ChangeKind::Written);
        }
        Ok(rows > 0)
    }

    pub fn delete(&self, path: &str) -> Result<bool> {
        let (collection, _) = split_path(path)?;
        let rows = {
            let conn = self.conn.lock().expect("database lock poisoned");
            conn.execute("DELETE FROM documents WHERE path = ?", [path])?
        };
        if rows > 0 {
            self.notify(path, collection, ChangeKind::Deleted);
        }
        Ok(rows > 0)
    }

    fn notify(&self, path: &str, collection: &str, kind: ChangeKind) {
        // No subscribers is not an error.
        let _ = self.changes.send(DocumentChange {
            path: path.to_string(),
            collection: collection.to_string(),
            kind,
        });
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            changes: self.changes.clone(),
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("subscribers", &self.changes.receiver_count())
            .finish_non_exhaustive()
    }
}

fn split_path(path: &str) -> Result<(&str, &str)> {
    paths::split(path).ok_or_else(|| anyhow::anyhow!("Invalid document path: {}", path))
}

fn json_path(field: &str) -> String {
    format!("$.{}", field)
}

fn read_document(row: &Row<'_>) -> rusqlite::Result<StoredDocument> {
    let raw: String = row.get(2)?;
    Ok(StoredDocument {
        path: row.get(0)?,
        id: row.get(1)?,
        data: serde_json::from_str(&raw).unwrap_or(Value::Null),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn db() -> Database {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    #[test]
    fn merge_keeps_untouched_fields() {
        let db = db();
        db.set("api/v1/starships/S1", &json!({"name": "A", "hullIntegrity": 90}))
            .unwrap();

        assert!(db
            .merge("api/v1/starships/S1", &json!({"hullIntegrity": 75}))
            .unwrap());

        let doc = db.get("api/v1/starships/S1").unwrap().unwrap();
        assert_eq!(doc.data, json!({"name": "A", "hullIntegrity": 75}));
    }

    #[test]
    fn merge_reports_missing_documents() {
        let db = db();
        assert!(!db.merge("api/v1/starships/nope", &json!({"a": 1})).unwrap());
    }

    #[test]
    fn rejects_paths_without_a_collection() {
        let db = db();
        assert!(db.set("orphan", &json!({})).is_err());
    }

    #[test]
    fn writes_are_announced_on_the_change_feed() {
        let db = db();
        let mut feed = db.watch();

        let id = db.add("api/v1/starships/S1/modules", &json!({"name": "Bridge"})).unwrap();

        let change = feed.try_recv().unwrap();
        assert_eq!(change.collection, "api/v1/starships/S1/modules");
        assert_eq!(change.path, format!("api/v1/starships/S1/modules/{}", id));
        assert_eq!(change.kind, ChangeKind::Written);
    }

    #[test]
    fn corrupt_bodies_read_back_as_null() {
        let db = db();
        {
            let conn = db.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO documents VALUES ('c/x', 'c', 'c', 'x', 'not json', '', '')",
                [],
            )
            .unwrap();
        }
        let doc = db.get("c/x").unwrap().unwrap();
        assert_eq!(doc.data, Value::Null);
    }
}
