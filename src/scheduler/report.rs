//! Scheduler outcomes

use serde::Serialize;
use thiserror::Error;

/// A task that had not completed when the run stalled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnresolvedTask {
    /// Label (or anonymous ID) of the task
    pub key: String,
    /// Dependencies that never completed
    pub waiting_on: Vec<String>,
    /// True if the task's own work had started but not finished
    pub running: bool,
}

impl std::fmt::Display for UnresolvedTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.running {
            write!(f, "{} (running)", self.key)
        } else {
            write!(f, "{} (waiting on {})", self.key, self.waiting_on.join(", "))
        }
    }
}

/// Why a run could not finish: tasks remain and none can make progress.
///
/// Serializes as `{ "unresolved": [...], "processed": n }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StallReport {
    /// Keys of every unfinished task, in registration order
    pub unresolved: Vec<String>,
    /// Number of tasks that completed before the stall
    pub processed: usize,
    /// Per-task detail behind `unresolved`
    #[serde(skip)]
    pub tasks: Vec<UnresolvedTask>,
}

impl StallReport {
    pub fn new(tasks: Vec<UnresolvedTask>, processed: usize) -> Self {
        Self {
            unresolved: tasks.iter().map(|t| t.key.clone()).collect(),
            processed,
            tasks,
        }
    }
}

impl std::fmt::Display for StallReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let remaining: Vec<String> = self.tasks.iter().map(|t| t.to_string()).collect();
        write!(
            f,
            "Unresolvable circular reference. Remaining refs: {}. Processed: {}",
            remaining.join("; "),
            self.processed
        )
    }
}

/// Errors that end a scheduler run
#[derive(Debug, Error)]
pub enum SchedulerError<E> {
    #[error("duplicate task: {0}")]
    DuplicateTask(String),

    #[error("task {key} failed: {source}")]
    Task { key: String, source: E },

    #[error("{0}")]
    Stalled(StallReport),

    #[error("task panicked: {0}")]
    Panicked(String),
}
