//! Dependency-driven task scheduler
//!
//! Tasks are registered up front with the labels they wait for. [`TaskGraph::run`]
//! starts every task whose labels are all done, concurrently, and keeps doing
//! so as tasks complete. A task may wait for a label that is registered after
//! it; whether a label is unsatisfiable is only known once nothing can make
//! progress, which is reported as a [`StallReport`].

mod graph;
mod report;

pub use graph::{RunSummary, TaskFuture, TaskGraph, TaskKey, TaskState};
pub use report::{SchedulerError, StallReport, UnresolvedTask};
