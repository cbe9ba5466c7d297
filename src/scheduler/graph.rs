//! TaskGraph: registration and execution of dependent tasks

use super::report::{SchedulerError, StallReport, UnresolvedTask};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Boxed future produced by a task's work function.
pub type TaskFuture<E> = Pin<Box<dyn Future<Output = Result<(), E>> + Send>>;

type TaskWork<E> = Box<dyn FnOnce() -> TaskFuture<E> + Send>;

/// Identity of a task.
///
/// Only labeled tasks can be depended on. Anonymous tasks live in their own
/// namespace, so an anonymous key never satisfies a dependency even if the
/// strings match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskKey {
    Label(String),
    Anonymous(String),
}

impl TaskKey {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Label(s) | Self::Anonymous(s) => s,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Label(s) => Some(s),
            Self::Anonymous(_) => None,
        }
    }
}

impl std::fmt::Display for TaskKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle of a task within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Done,
    Failed,
}

/// Result of a run in which every task completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of tasks that ran to completion
    pub processed: usize,
}

struct TaskEntry<E> {
    key: TaskKey,
    dependencies: BTreeSet<String>,
    work: TaskWork<E>,
}

/// A set of tasks, each waiting for zero or more labels.
///
/// Build it with [`TaskGraph::add`], then consume it with [`TaskGraph::run`].
pub struct TaskGraph<E> {
    tasks: Vec<TaskEntry<E>>,
    keys: HashSet<TaskKey>,
    timeout: Duration,
}

impl<E: Send + 'static> TaskGraph<E> {
    /// Create an empty graph. `timeout` is the longest the run may go without
    /// a task completing.
    pub fn new(timeout: Duration) -> Self {
        Self {
            tasks: Vec::new(),
            keys: HashSet::new(),
            timeout,
        }
    }

    /// Register a task.
    ///
    /// `work` is called once, when every label in `dependencies` belongs to a
    /// completed task. Dependencies may name tasks registered later.
    pub fn add<I, S, F, Fut>(&mut self, key: TaskKey, dependencies: I, work: F) -> Result<(), SchedulerError<E>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
    {
        if !self.keys.insert(key.clone()) {
            return Err(SchedulerError::DuplicateTask(key.to_string()));
        }
        self.tasks.push(TaskEntry {
            key,
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            work: Box::new(move || -> TaskFuture<E> { Box::pin(work()) }),
        });
        Ok(())
    }

    /// Dependency labels that no registered task provides, sorted.
    pub fn missing_dependencies(&self) -> Vec<String> {
        let missing: BTreeSet<&String> = self
            .tasks
            .iter()
            .flat_map(|t| t.dependencies.iter())
            .filter(|dep| !self.keys.contains(&TaskKey::Label((*dep).clone())))
            .collect();
        missing.into_iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every task, respecting dependencies.
    ///
    /// Ready tasks run concurrently on the current tokio runtime. The run
    /// ends when:
    /// - every task is done (`Ok`);
    /// - a task fails: nothing new is started, tasks already running are
    ///   awaited, and the first failure is returned;
    /// - nothing is running and tasks remain, or `timeout` passes without a
    ///   completion: the run has stalled.
    pub async fn run(self) -> Result<RunSummary, SchedulerError<E>> {
        let TaskGraph { tasks, timeout, .. } = self;
        let total = tasks.len();

        let mut keys = Vec::with_capacity(total);
        let mut dependencies = Vec::with_capacity(total);
        let mut works = Vec::with_capacity(total);
        for task in tasks {
            keys.push(task.key);
            dependencies.push(task.dependencies);
            works.push(Some(task.work));
        }

        let mut states = vec![TaskState::Pending; total];
        let mut remaining: Vec<usize> = dependencies.iter().map(BTreeSet::len).collect();
        let mut dependents: HashMap<&str, Vec<usize>> = HashMap::new();
        for (index, deps) in dependencies.iter().enumerate() {
            for dep in deps {
                dependents.entry(dep.as_str()).or_default().push(index);
            }
        }

        let mut ready: VecDeque<usize> = (0..total).filter(|&i| remaining[i] == 0).collect();
        let mut done_labels: HashSet<&str> = HashSet::new();
        let mut running: JoinSet<(usize, Result<(), E>)> = JoinSet::new();
        let mut processed = 0;
        let mut failure: Option<SchedulerError<E>> = None;
        let mut deadline = Instant::now() + timeout;

        loop {
            if failure.is_none() {
                while let Some(index) = ready.pop_front() {
                    let Some(work) = works[index].take() else {
                        continue;
                    };
                    states[index] = TaskState::Running;
                    tracing::debug!(task = %keys[index], "task started");
                    let future = work();
                    running.spawn(async move { (index, future.await) });
                }
            }

            if running.is_empty() {
                if let Some(err) = failure {
                    return Err(err);
                }
                if processed == total {
                    return Ok(RunSummary { processed });
                }
                let report = stall_report(&keys, &dependencies, &states, &done_labels, processed);
                tracing::warn!(unresolved = report.unresolved.len(), processed, "no runnable tasks left");
                return Err(SchedulerError::Stalled(report));
            }

            let joined = match tokio::time::timeout_at(deadline, running.join_next()).await {
                Ok(Some(joined)) => joined,
                Ok(None) => continue,
                Err(_) => {
                    if let Some(err) = failure {
                        return Err(err);
                    }
                    let report = stall_report(&keys, &dependencies, &states, &done_labels, processed);
                    tracing::warn!(
                        timeout_ms = timeout.as_millis() as u64,
                        unresolved = report.unresolved.len(),
                        processed,
                        "no task completed within the timeout"
                    );
                    return Err(SchedulerError::Stalled(report));
                }
            };

            match joined {
                Ok((index, Ok(()))) => {
                    states[index] = TaskState::Done;
                    processed += 1;
                    deadline = Instant::now() + timeout;
                    tracing::debug!(task = %keys[index], processed, "task done");

                    if let Some(label) = keys[index].label() {
                        done_labels.insert(label);
                        if let Some(waiting) = dependents.get(label) {
                            for &dependent in waiting {
                                remaining[dependent] -= 1;
                                if remaining[dependent] == 0 {
                                    ready.push_back(dependent);
                                }
                            }
                        }
                    }
                }
                Ok((index, Err(source))) => {
                    states[index] = TaskState::Failed;
                    tracing::debug!(task = %keys[index], "task failed");
                    if failure.is_none() {
                        failure = Some(SchedulerError::Task {
                            key: keys[index].to_string(),
                            source,
                        });
                    }
                }
                Err(join_error) => {
                    if failure.is_none() {
                        failure = Some(SchedulerError::Panicked(join_error.to_string()));
                    }
                }
            }
        }
    }
}

fn stall_report(
    keys: &[TaskKey],
    dependencies: &[BTreeSet<String>],
    states: &[TaskState],
    done_labels: &HashSet<&str>,
    processed: usize,
) -> StallReport {
    let tasks = keys
        .iter()
        .zip(dependencies)
        .zip(states)
        .filter(|(_, state)| **state != TaskState::Done)
        .map(|((key, deps), state)| UnresolvedTask {
            key: key.to_string(),
            waiting_on: deps
                .iter()
                .filter(|dep| !done_labels.contains(dep.as_str()))
                .cloned()
                .collect(),
            running: *state == TaskState::Running,
        })
        .collect();
    StallReport::new(tasks, processed)
}
