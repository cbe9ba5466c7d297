//! Scenario: the complete input of an import

use super::Row;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Collection name -> rows to create in that collection.
///
/// Serializes as a plain map, which is also the shape `export` produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scenario {
    collections: BTreeMap<String, Vec<Row>>,
}

impl Scenario {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scenario from arbitrary JSON.
    ///
    /// The value must be an object whose members are arrays of objects.
    /// The error names the first offending part.
    pub fn from_value(value: Value) -> Result<Self, String> {
        let Value::Object(map) = value else {
            return Err(format!("expected an object of collections, got {}", kind_of(&value)));
        };

        let mut scenario = Self::new();
        for (collection, rows) in map {
            let Value::Array(items) = rows else {
                return Err(format!(
                    "collection '{}' must be an array of rows, got {}",
                    collection,
                    kind_of(&rows)
                ));
            };
            let mut parsed = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                match item {
                    Value::Object(row) => parsed.push(row),
                    other => {
                        return Err(format!(
                            "row {} of '{}' must be an object, got {}",
                            index,
                            collection,
                            kind_of(&other)
                        ))
                    }
                }
            }
            scenario.collections.insert(collection, parsed);
        }
        Ok(scenario)
    }

    /// Add rows to a collection (appending if it already has some).
    pub fn with_rows(mut self, collection: impl Into<String>, rows: Vec<Row>) -> Self {
        self.collections.entry(collection.into()).or_default().extend(rows);
        self
    }

    /// Iterate over (collection, rows) in collection-name order.
    pub fn collections(&self) -> impl Iterator<Item = (&str, &[Row])> {
        self.collections.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Rows of a single collection, if present.
    pub fn rows(&self, collection: &str) -> Option<&[Row]> {
        self.collections.get(collection).map(|v| v.as_slice())
    }

    /// Total number of rows across all collections.
    pub fn row_count(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
