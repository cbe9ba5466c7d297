//! Export: read collections back out as a scenario

use super::{ExportOptions, ScenarioEngine, ScenarioError};
use crate::document::{Document, Row, Scenario, ID_FIELD, REVISION_FIELD};
use serde_json::Value;

impl ScenarioEngine {
    /// Read collections back into scenario form.
    ///
    /// Documents keep their `_id`. With `with_refs`, each row is also labeled
    /// with its own ID, so references (stored as IDs) resolve against those
    /// labels when the export is imported again.
    pub async fn export(&self, options: ExportOptions) -> Result<Scenario, ScenarioError> {
        let collections = match &options.collections {
            Some(names) => {
                for name in names {
                    if self.store().describe(name).await?.is_none() {
                        return Err(ScenarioError::UnknownCollection(name.clone()));
                    }
                }
                names.clone()
            }
            None => self.store().list_collections().await?,
        };

        let mut scenario = Scenario::new();
        for collection in collections {
            let rows: Vec<Row> = self
                .store()
                .find_all(&collection)
                .await?
                .into_iter()
                .map(|document| export_row(document, &options))
                .collect();
            tracing::debug!(%collection, rows = rows.len(), "exported collection");
            scenario = scenario.with_rows(collection, rows);
        }
        Ok(scenario)
    }
}

fn export_row(mut document: Document, options: &ExportOptions) -> Row {
    if document.get(REVISION_FIELD).and_then(Value::as_u64) == Some(0) {
        document.remove(REVISION_FIELD);
    }
    if options.with_refs {
        if let Some(id) = document.get(ID_FIELD).cloned() {
            document.insert(options.ref_key.clone(), id);
        }
    }
    document
}
