//! SQLite storage backend for scenarios

use super::traits::{DocumentStore, OpenStore, StorageError, StorageResult};
use crate::document::{Document, DocumentId, ID_FIELD, REVISION_FIELD};
use crate::schema::CollectionSchema;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite-backed document store
///
/// Uses a single SQLite database with one table for collection schemas and
/// one for documents. Document bodies are stored as JSON; `_id` and `__v`
/// live in their own columns. Thread-safe via internal mutex on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            -- Collections table: one row per collection with its field schema
            CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                schema_json TEXT NOT NULL
            );

            -- Documents table; seq preserves insertion order
            CREATE TABLE IF NOT EXISTS documents (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                revision INTEGER NOT NULL DEFAULT 0,
                body_json TEXT NOT NULL,
                UNIQUE (collection, id),
                FOREIGN KEY (collection) REFERENCES collections(name) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_documents_collection
                ON documents(collection, seq);

            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- Enable WAL mode for concurrent reads during writes
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    /// Lock the connection. A poisoned lock is recovered: every statement is
    /// atomic, so a panicking holder cannot leave the database half-written.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load_schema(conn: &Connection, name: &str) -> StorageResult<Option<CollectionSchema>> {
        let json: Option<String> = conn
            .query_row(
                "SELECT schema_json FROM collections WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn require_collection(conn: &Connection, name: &str) -> StorageResult<CollectionSchema> {
        Self::load_schema(conn, name)?.ok_or_else(|| StorageError::CollectionNotFound(name.to_string()))
    }

    /// Rebuild a document from its columns
    fn row_to_document(id: String, revision: i64, body_json: &str) -> StorageResult<Document> {
        let mut document: Document = serde_json::from_str(body_json)?;
        document.insert(ID_FIELD.to_string(), Value::String(id));
        document.insert(REVISION_FIELD.to_string(), Value::from(revision));
        Ok(document)
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn define_collection(&self, name: &str, schema: CollectionSchema) -> StorageResult<()> {
        let json = serde_json::to_string(&schema)?;
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT INTO collections (name, schema_json) VALUES (?1, ?2)
            ON CONFLICT(name) DO UPDATE SET schema_json = excluded.schema_json
            "#,
            params![name, json],
        )?;
        Ok(())
    }

    async fn list_collections(&self) -> StorageResult<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT name FROM collections ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    async fn describe(&self, name: &str) -> StorageResult<Option<CollectionSchema>> {
        let conn = self.conn();
        Self::load_schema(&conn, name)
    }

    async fn create(&self, collection: &str, document: Document) -> StorageResult<Document> {
        let conn = self.conn();
        let schema = Self::require_collection(&conn, collection)?;
        schema
            .validate(&document)
            .map_err(|message| StorageError::Validation {
                collection: collection.to_string(),
                message,
            })?;

        let id = match document.get(ID_FIELD) {
            Some(Value::String(s)) => s.clone(),
            _ => DocumentId::new().to_string(),
        };
        let revision = document
            .get(REVISION_FIELD)
            .and_then(Value::as_i64)
            .unwrap_or(0);

        let mut body = document;
        body.remove(ID_FIELD);
        body.remove(REVISION_FIELD);
        let body_json = serde_json::to_string(&body)?;

        conn.execute(
            "INSERT INTO documents (collection, id, revision, body_json) VALUES (?1, ?2, ?3, ?4)",
            params![collection, id, revision, body_json],
        )?;

        body.insert(ID_FIELD.to_string(), Value::String(id));
        body.insert(REVISION_FIELD.to_string(), Value::from(revision));
        Ok(body)
    }

    async fn remove_all(&self, collection: &str) -> StorageResult<u64> {
        let conn = self.conn();
        Self::require_collection(&conn, collection)?;
        let removed = conn.execute(
            "DELETE FROM documents WHERE collection = ?1",
            params![collection],
        )?;
        Ok(removed as u64)
    }

    async fn find_all(&self, collection: &str) -> StorageResult<Vec<Document>> {
        let conn = self.conn();
        Self::require_collection(&conn, collection)?;
        let mut stmt = conn.prepare(
            "SELECT id, revision, body_json FROM documents WHERE collection = ?1 ORDER BY seq",
        )?;
        let rows = stmt
            .query_map(params![collection], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, String>(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, revision, body)| Self::row_to_document(id, revision, &body))
            .collect()
    }

    async fn find(&self, collection: &str, id: &DocumentId) -> StorageResult<Option<Document>> {
        let conn = self.conn();
        let row = conn
            .query_row(
                "SELECT id, revision, body_json FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id.as_str()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, String>(2)?)),
            )
            .optional()?;

        match row {
            Some((id, revision, body)) => Ok(Some(Self::row_to_document(id, revision, &body)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSchema, ScalarKind};
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    async fn create_test_store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .define_collection(
                "widgets",
                CollectionSchema::new().with_field("name", FieldSchema::scalar(ScalarKind::String)),
            )
            .await
            .unwrap();
        store
            .define_collection(
                "users",
                CollectionSchema::new().with_field("favourite", FieldSchema::reference("widgets")),
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_define_and_list_collections() {
        let store = create_test_store().await;

        assert_eq!(store.list_collections().await.unwrap(), vec!["users", "widgets"]);
        assert!(store.describe("widgets").await.unwrap().is_some());
        assert!(store.describe("gadgets").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_revision() {
        let store = create_test_store().await;

        let created = store.create("widgets", doc(json!({ "name": "Widget" }))).await.unwrap();

        let id = created[ID_FIELD].as_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
        assert_eq!(created[REVISION_FIELD], json!(0));
        assert_eq!(created["name"], json!("Widget"));
    }

    #[tokio::test]
    async fn test_create_keeps_supplied_id() {
        let store = create_test_store().await;
        let id = DocumentId::new();

        store
            .create("widgets", doc(json!({ "_id": id.as_str(), "__v": 3, "name": "W" })))
            .await
            .unwrap();

        let loaded = store.find("widgets", &id).await.unwrap().unwrap();
        assert_eq!(loaded[REVISION_FIELD], json!(3));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_document() {
        let store = create_test_store().await;

        let err = store
            .create("users", doc(json!({ "favourite": "widget-quz" })))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Validation { ref collection, .. } if collection == "users"));
        assert!(store.find_all("users").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_in_unknown_collection() {
        let store = create_test_store().await;
        let err = store.create("gadgets", Document::new()).await.unwrap_err();
        assert!(matches!(err, StorageError::CollectionNotFound(_)));
    }

    #[tokio::test]
    async fn test_find_all_in_insertion_order() {
        let store = create_test_store().await;
        for name in ["c", "a", "b"] {
            store.create("widgets", doc(json!({ "name": name }))).await.unwrap();
        }

        let names: Vec<Value> = store
            .find_all("widgets")
            .await
            .unwrap()
            .into_iter()
            .map(|d| d["name"].clone())
            .collect();

        assert_eq!(names, vec![json!("c"), json!("a"), json!("b")]);
    }

    #[tokio::test]
    async fn test_remove_all_only_touches_one_collection() {
        let store = create_test_store().await;
        store.create("widgets", doc(json!({ "name": "a" }))).await.unwrap();
        store.create("widgets", doc(json!({ "name": "b" }))).await.unwrap();
        store.create("users", Document::new()).await.unwrap();

        assert_eq!(store.remove_all("widgets").await.unwrap(), 2);
        assert_eq!(store.remove_all("widgets").await.unwrap(), 0);
        assert_eq!(store.find_all("users").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_file_store_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("scenario.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.define_collection("widgets", CollectionSchema::new()).await.unwrap();
            store.create("widgets", doc(json!({ "name": "kept" }))).await.unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        let all = reopened.find_all("widgets").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0]["name"], json!("kept"));
    }
}
