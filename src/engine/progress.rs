//! Progress record of an import

use serde::Serialize;
use std::collections::BTreeMap;

/// What an import did: rows created per collection and collections emptied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub created: BTreeMap<String, usize>,
    pub nuked: Vec<String>,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_created(&mut self, collection: &str) {
        *self.created.entry(collection.to_string()).or_insert(0) += 1;
    }

    /// Rows created in one collection.
    pub fn created_in(&self, collection: &str) -> usize {
        self.created.get(collection).copied().unwrap_or(0)
    }

    pub fn total_created(&self) -> usize {
        self.created.values().sum()
    }
}
