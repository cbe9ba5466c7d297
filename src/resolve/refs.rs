//! Label -> document ID table shared by every task of a run

use crate::document::DocumentId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ReferenceError {
    #[error("label '{label}' is already resolved to {existing}")]
    AlreadyResolved { label: String, existing: DocumentId },
}

/// Write-once map from symbolic label to the ID of the created document.
///
/// Writers to different labels never block each other or readers.
#[derive(Debug, Default)]
pub struct ReferenceTable {
    entries: DashMap<String, DocumentId>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// ID a label resolved to, if it has been created.
    pub fn resolve(&self, label: &str) -> Option<DocumentId> {
        self.entries.get(label).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.contains_key(label)
    }

    /// Record the ID of a created document. Each label may be set once.
    pub fn set(&self, label: impl Into<String>, id: DocumentId) -> Result<(), ReferenceError> {
        match self.entries.entry(label.into()) {
            Entry::Occupied(existing) => Err(ReferenceError::AlreadyResolved {
                label: existing.key().clone(),
                existing: existing.get().clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(id);
                Ok(())
            }
        }
    }

    /// Forget every label.
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
