//! Storage trait definitions

use crate::document::{Document, DocumentId};
use crate::schema::CollectionSchema;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Validation failed for {collection}: {message}")]
    Validation { collection: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for document storage backends
///
/// Implementations must be thread-safe (Send + Sync): the importer calls
/// `create` from many concurrently running tasks.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // === Collection Operations ===

    /// Create a collection or replace its schema
    async fn define_collection(&self, name: &str, schema: CollectionSchema) -> StorageResult<()>;

    /// List all collection names
    async fn list_collections(&self) -> StorageResult<Vec<String>>;

    /// Schema of a collection, or `None` if it does not exist
    async fn describe(&self, name: &str) -> StorageResult<Option<CollectionSchema>>;

    // === Document Operations ===

    /// Validate and insert a document, returning it with `_id` and `__v` set
    ///
    /// A string `_id` already present on the document is kept; otherwise a
    /// fresh one is assigned.
    async fn create(&self, collection: &str, document: Document) -> StorageResult<Document>;

    /// Delete every document of a collection, returning how many were removed
    async fn remove_all(&self, collection: &str) -> StorageResult<u64>;

    /// All documents of a collection, in insertion order
    async fn find_all(&self, collection: &str) -> StorageResult<Vec<Document>>;

    /// Load a single document by ID
    async fn find(&self, collection: &str, id: &DocumentId) -> StorageResult<Option<Document>>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: DocumentStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
