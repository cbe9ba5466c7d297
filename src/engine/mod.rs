//! Scenario engine: imports a scenario into a document store
//!
//! An import walks every row of the scenario, turns it into a task keyed by
//! its label and waiting on the labels it references, and hands the tasks to
//! the scheduler. Each task swaps its labels for real IDs, creates the
//! document, and records its own label for the tasks waiting on it.
//!
//! The label table outlives a single import, so a later import can reference
//! documents created by an earlier one when run with `reset: false`.

mod error;
mod export;
mod options;
mod progress;

pub use error::{ImportFailure, ScenarioError};
pub use options::{ExportOptions, ImportOptions, Keys, Nuke};
pub use progress::Progress;

use crate::document::{flatten, unflatten, DocumentId, FlatRow, Row, Scenario, ID_FIELD};
use crate::resolve::{dependencies, inject, ReferenceTable};
use crate::scheduler::{TaskGraph, TaskKey};
use crate::schema::{DescriptorCache, DescriptorTree};
use crate::storage::DocumentStore;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinSet;

type SharedProgress = Arc<Mutex<Progress>>;

/// Imports scenarios into one store.
///
/// Imports on the same engine are serialized; a second call waits for the
/// first to finish.
pub struct ScenarioEngine {
    store: Arc<dyn DocumentStore>,
    descriptors: DescriptorCache,
    refs: Arc<ReferenceTable>,
    defaults: ImportOptions,
    run_lock: tokio::sync::Mutex<()>,
}

impl ScenarioEngine {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            descriptors: DescriptorCache::new(),
            refs: Arc::new(ReferenceTable::new()),
            defaults: ImportOptions::default(),
            run_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Options used by [`ScenarioEngine::import`].
    pub fn with_defaults(mut self, defaults: ImportOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn defaults(&self) -> &ImportOptions {
        &self.defaults
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Labels resolved so far, across imports since the last reset.
    pub fn references(&self) -> &ReferenceTable {
        &self.refs
    }

    /// ID created for a label, if any.
    pub fn resolve(&self, label: &str) -> Option<DocumentId> {
        self.refs.resolve(label)
    }

    pub fn descriptors(&self) -> &DescriptorCache {
        &self.descriptors
    }

    /// Import with the engine's default options.
    pub async fn import(&self, scenario: &Scenario) -> Result<Progress, ImportFailure> {
        self.import_with(scenario, self.defaults.clone()).await
    }

    /// Import with explicit options.
    ///
    /// On failure the returned [`ImportFailure`] carries the progress made
    /// before the error, since documents already created stay in the store.
    pub async fn import_with(
        &self,
        scenario: &Scenario,
        options: ImportOptions,
    ) -> Result<Progress, ImportFailure> {
        let _guard = self.run_lock.lock().await;
        let progress: SharedProgress = Arc::default();

        tracing::info!(
            collections = scenario.collections().count(),
            rows = scenario.row_count(),
            "importing scenario"
        );
        let result = self.run_import(scenario, &options, &progress).await;
        let progress = lock(&progress).clone();

        match result {
            Ok(()) => {
                tracing::info!(created = progress.total_created(), "import complete");
                Ok(progress)
            }
            Err(error) => {
                tracing::warn!(%error, created = progress.total_created(), "import failed");
                Err(ImportFailure { error, progress })
            }
        }
    }

    async fn run_import(
        &self,
        scenario: &Scenario,
        options: &ImportOptions,
        progress: &SharedProgress,
    ) -> Result<(), ScenarioError> {
        if options.reset {
            self.refs.reset();
        }
        if options.reset_descriptors {
            self.descriptors.reset();
        }

        // Everything that can be rejected up front is, before the store is touched.
        let targets = self.nuke_targets(&options.nuke).await?;
        let graph = self.plan(scenario, options, progress).await?;

        if options.check_dependencies {
            let keys = graph.missing_dependencies();
            if !keys.is_empty() {
                return Err(ScenarioError::MissingKeys { keys });
            }
        }

        self.nuke(targets, progress).await?;

        let summary = graph.run().await?;
        tracing::debug!(processed = summary.processed, "all tasks completed");
        Ok(())
    }

    /// Build one task per row.
    async fn plan(
        &self,
        scenario: &Scenario,
        options: &ImportOptions,
        progress: &SharedProgress,
    ) -> Result<TaskGraph<ScenarioError>, ScenarioError> {
        let mut graph = TaskGraph::new(options.timeout());

        for (collection, rows) in scenario.collections() {
            let tree = self.describe(collection).await?;

            for (index, row) in rows.iter().enumerate() {
                let mut row = row.clone();
                let key = self.task_key(collection, index, &mut row, options)?;

                let mut flat = flatten(&row);
                // Labels from earlier imports are already satisfied.
                let waiting_on: Vec<String> = dependencies(&flat, &tree, &options.keys.after)
                    .into_iter()
                    .filter(|label| !self.refs.contains(label))
                    .collect();
                flat.remove(&options.keys.after);

                let task = CreateTask {
                    store: Arc::clone(&self.store),
                    refs: Arc::clone(&self.refs),
                    progress: Arc::clone(progress),
                    tree: Arc::clone(&tree),
                    collection: collection.to_string(),
                    key: key.clone(),
                    row: flat,
                };
                graph.add(key, waiting_on, move || task.run())?;
            }
        }

        tracing::debug!(tasks = graph.len(), "planned import");
        Ok(graph)
    }

    /// Take the label off a row and turn it into the row's task key.
    fn task_key(
        &self,
        collection: &str,
        index: usize,
        row: &mut Row,
        options: &ImportOptions,
    ) -> Result<TaskKey, ScenarioError> {
        match row.remove(&options.keys.reference) {
            None | Some(Value::Null) => Ok(TaskKey::Anonymous(format!("{collection}[{index}]"))),
            Some(Value::String(label)) if label.is_empty() => Err(ScenarioError::InvalidLabel {
                collection: collection.to_string(),
                index,
                message: "label is empty".to_string(),
            }),
            Some(Value::String(label)) => {
                if self.refs.contains(&label) {
                    return Err(ScenarioError::LabelAlreadyResolved(label));
                }
                Ok(TaskKey::Label(label))
            }
            Some(other) => Err(ScenarioError::InvalidLabel {
                collection: collection.to_string(),
                index,
                message: format!("expected a string, got {other}"),
            }),
        }
    }

    async fn describe(&self, collection: &str) -> Result<Arc<DescriptorTree>, ScenarioError> {
        Ok(self.descriptors.describe(self.store.as_ref(), collection).await?)
    }

    /// Resolve the nuke option to a sorted list of existing collections.
    async fn nuke_targets(&self, nuke: &Nuke) -> Result<Vec<String>, ScenarioError> {
        match nuke {
            Nuke::All(false) => Ok(Vec::new()),
            Nuke::All(true) => Ok(self.store.list_collections().await?),
            Nuke::Collections(names) => {
                let names: BTreeSet<&String> = names.iter().collect();
                let mut targets = Vec::with_capacity(names.len());
                for name in names {
                    if self.store.describe(name).await?.is_none() {
                        return Err(ScenarioError::UnknownCollection(name.clone()));
                    }
                    targets.push(name.clone());
                }
                Ok(targets)
            }
        }
    }

    /// Empty the target collections concurrently.
    async fn nuke(&self, targets: Vec<String>, progress: &SharedProgress) -> Result<(), ScenarioError> {
        let mut removals = JoinSet::new();
        for collection in targets {
            let store = Arc::clone(&self.store);
            removals.spawn(async move {
                let result = store.remove_all(&collection).await;
                (collection, result)
            });
        }

        let mut failure = None;
        while let Some(joined) = removals.join_next().await {
            match joined {
                Ok((collection, Ok(removed))) => {
                    tracing::debug!(%collection, removed, "emptied collection");
                    lock(progress).nuked.push(collection);
                }
                Ok((collection, Err(source))) => {
                    failure.get_or_insert(ScenarioError::Nuke { collection, source });
                }
                Err(join_err) => {
                    failure.get_or_insert(ScenarioError::Panicked(join_err.to_string()));
                }
            }
        }
        lock(progress).nuked.sort();

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Work of one row: inject IDs, create, publish the label.
struct CreateTask {
    store: Arc<dyn DocumentStore>,
    refs: Arc<ReferenceTable>,
    progress: SharedProgress,
    tree: Arc<DescriptorTree>,
    collection: String,
    key: TaskKey,
    row: FlatRow,
}

impl CreateTask {
    async fn run(mut self) -> Result<(), ScenarioError> {
        if let Err(err) = inject(&mut self.row, &self.tree, &self.refs) {
            tracing::error!(task = %self.key, %err, "task started before its references resolved");
            return Err(err.into());
        }

        let document = unflatten(std::mem::take(&mut self.row));
        let created = self
            .store
            .create(&self.collection, document)
            .await
            .map_err(|source| ScenarioError::Creation {
                collection: self.collection.clone(),
                task: self.key.to_string(),
                source,
            })?;

        if let Some(label) = self.key.label() {
            let id = created
                .get(ID_FIELD)
                .and_then(Value::as_str)
                .map(DocumentId::from)
                .ok_or_else(|| ScenarioError::MissingId(self.collection.clone()))?;
            tracing::debug!(label, %id, collection = %self.collection, "created");
            self.refs.set(label, id)?;
        } else {
            tracing::trace!(task = %self.key, "created");
        }

        lock(&self.progress).record_created(&self.collection);
        Ok(())
    }
}

fn lock(progress: &SharedProgress) -> MutexGuard<'_, Progress> {
    progress.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
