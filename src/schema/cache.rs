//! Per-process cache of descriptor trees

use super::descriptor::DescriptorTree;
use crate::storage::{DocumentStore, StorageError};
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while describing a collection
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Collection name -> descriptor tree, filled on first use.
///
/// Entries live until [`DescriptorCache::reset`]; schema changes in the store
/// are not detected. Concurrent first lookups of the same collection may both
/// hit the store; they produce the same tree and the first insert wins.
#[derive(Debug, Default)]
pub struct DescriptorCache {
    entries: DashMap<String, Arc<DescriptorTree>>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Get the descriptor tree of a collection, asking the store if unseen.
    pub async fn describe(
        &self,
        store: &dyn DocumentStore,
        collection: &str,
    ) -> Result<Arc<DescriptorTree>, SchemaError> {
        if let Some(tree) = self.get(collection) {
            return Ok(tree);
        }

        let schema = store
            .describe(collection)
            .await?
            .ok_or_else(|| SchemaError::UnknownCollection(collection.to_string()))?;
        let tree = Arc::new(DescriptorTree::from_schema(&schema));
        tracing::debug!(collection, references = tree.reference_paths().count(), "described collection");

        let entry = self.entries.entry(collection.to_string()).or_insert(tree);
        Ok(Arc::clone(entry.value()))
    }

    /// Cached tree of a collection, without consulting the store.
    pub fn get(&self, collection: &str) -> Option<Arc<DescriptorTree>> {
        self.entries.get(collection).map(|entry| Arc::clone(entry.value()))
    }

    /// Forget every cached tree.
    pub fn reset(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
