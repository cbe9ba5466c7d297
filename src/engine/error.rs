//! Errors surfaced by imports and exports

use super::progress::Progress;
use crate::document::Scenario;
use crate::resolve::{InjectError, ReferenceError};
use crate::scheduler::{SchedulerError, StallReport};
use crate::schema::SchemaError;
use crate::storage::StorageError;
use serde_json::{json, Value};
use thiserror::Error;

/// Errors that can occur while importing or exporting a scenario
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Invalid label on {collection}[{index}]: {message}")]
    InvalidLabel {
        collection: String,
        index: usize,
        message: String,
    },

    #[error("Duplicate label: {0}")]
    DuplicateLabel(String),

    #[error("Label '{0}' was already created by an earlier import")]
    LabelAlreadyResolved(String),

    #[error("Failed to empty collection {collection}: {source}")]
    Nuke {
        collection: String,
        source: StorageError,
    },

    #[error("Failed to create {task} in {collection}: {source}")]
    Creation {
        collection: String,
        task: String,
        source: StorageError,
    },

    #[error("Store returned a {0} document without an id")]
    MissingId(String),

    #[error("Reference '{label}' in field '{field}' used before it was resolved")]
    ReferenceNotReady { label: String, field: String },

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error("{0}")]
    Unresolvable(StallReport),

    #[error("Missing Keys: {}", .keys.join(", "))]
    MissingKeys { keys: Vec<String> },

    #[error("Task panicked: {0}")]
    Panicked(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ScenarioError {
    /// True for mistakes in the call or the scenario itself, reported before
    /// the store is modified.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidScenario(_)
                | Self::UnknownCollection(_)
                | Self::InvalidLabel { .. }
                | Self::DuplicateLabel(_)
                | Self::LabelAlreadyResolved(_)
                | Self::MissingKeys { .. }
        )
    }

    /// The stall report, if the run could not resolve its references.
    pub fn stall_report(&self) -> Option<&StallReport> {
        match self {
            Self::Unresolvable(report) => Some(report),
            _ => None,
        }
    }

    /// Machine-readable detail for unresolvable runs and missing keys.
    pub fn payload(&self) -> Option<Value> {
        match self {
            Self::Unresolvable(report) => serde_json::to_value(report).ok(),
            Self::MissingKeys { keys } => Some(json!({ "error": "Missing Keys", "keys": keys })),
            _ => None,
        }
    }
}

impl From<SchemaError> for ScenarioError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::UnknownCollection(name) => Self::UnknownCollection(name),
            SchemaError::Storage(source) => Self::Storage(source),
        }
    }
}

impl From<InjectError> for ScenarioError {
    fn from(err: InjectError) -> Self {
        match err {
            InjectError::ReferenceNotReady { label, field } => Self::ReferenceNotReady { label, field },
        }
    }
}

impl From<SchedulerError<ScenarioError>> for ScenarioError {
    fn from(err: SchedulerError<ScenarioError>) -> Self {
        match err {
            SchedulerError::DuplicateTask(key) => Self::DuplicateLabel(key),
            SchedulerError::Task { source, .. } => source,
            SchedulerError::Stalled(report) => Self::Unresolvable(report),
            SchedulerError::Panicked(message) => Self::Panicked(message),
        }
    }
}

impl TryFrom<Value> for Scenario {
    type Error = ScenarioError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Scenario::from_value(value).map_err(ScenarioError::InvalidScenario)
    }
}

/// A failed import, with whatever was created before it failed.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ImportFailure {
    #[source]
    pub error: ScenarioError,
    pub progress: Progress,
}
