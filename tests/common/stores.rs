use async_trait::async_trait;
use scenario::{CollectionSchema, Document, DocumentId, DocumentStore, StorageError, StorageResult};
use std::sync::Arc;
use std::time::Duration;

/// Delays every `create` by a fixed amount.
pub struct SlowStore {
    inner: Arc<dyn DocumentStore>,
    delay: Duration,
}

impl SlowStore {
    pub fn new(inner: Arc<dyn DocumentStore>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl DocumentStore for SlowStore {
    async fn define_collection(&self, name: &str, schema: CollectionSchema) -> StorageResult<()> {
        self.inner.define_collection(name, schema).await
    }

    async fn list_collections(&self) -> StorageResult<Vec<String>> {
        self.inner.list_collections().await
    }

    async fn describe(&self, name: &str) -> StorageResult<Option<CollectionSchema>> {
        self.inner.describe(name).await
    }

    async fn create(&self, collection: &str, document: Document) -> StorageResult<Document> {
        tokio::time::sleep(self.delay).await;
        self.inner.create(collection, document).await
    }

    async fn remove_all(&self, collection: &str) -> StorageResult<u64> {
        self.inner.remove_all(collection).await
    }

    async fn find_all(&self, collection: &str) -> StorageResult<Vec<Document>> {
        self.inner.find_all(collection).await
    }

    async fn find(&self, collection: &str, id: &DocumentId) -> StorageResult<Option<Document>> {
        self.inner.find(collection, id).await
    }
}

/// Rejects `create` for documents whose `name` matches, and optionally
/// `remove_all` for one collection.
pub struct FailingStore {
    inner: Arc<dyn DocumentStore>,
    reject_name: Option<String>,
    reject_remove: Option<String>,
}

impl FailingStore {
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner,
            reject_name: None,
            reject_remove: None,
        }
    }

    pub fn rejecting_name(mut self, name: &str) -> Self {
        self.reject_name = Some(name.to_string());
        self
    }

    pub fn rejecting_remove(mut self, collection: &str) -> Self {
        self.reject_remove = Some(collection.to_string());
        self
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn define_collection(&self, name: &str, schema: CollectionSchema) -> StorageResult<()> {
        self.inner.define_collection(name, schema).await
    }

    async fn list_collections(&self) -> StorageResult<Vec<String>> {
        self.inner.list_collections().await
    }

    async fn describe(&self, name: &str) -> StorageResult<Option<CollectionSchema>> {
        self.inner.describe(name).await
    }

    async fn create(&self, collection: &str, document: Document) -> StorageResult<Document> {
        let name = document.get("name").and_then(|v| v.as_str());
        if name.is_some() && name == self.reject_name.as_deref() {
            return Err(StorageError::Validation {
                collection: collection.to_string(),
                message: "name: rejected".to_string(),
            });
        }
        self.inner.create(collection, document).await
    }

    async fn remove_all(&self, collection: &str) -> StorageResult<u64> {
        if self.reject_remove.as_deref() == Some(collection) {
            return Err(StorageError::CollectionNotFound(collection.to_string()));
        }
        self.inner.remove_all(collection).await
    }

    async fn find_all(&self, collection: &str) -> StorageResult<Vec<Document>> {
        self.inner.find_all(collection).await
    }

    async fn find(&self, collection: &str, id: &DocumentId) -> StorageResult<Option<Document>> {
        self.inner.find(collection, id).await
    }
}
