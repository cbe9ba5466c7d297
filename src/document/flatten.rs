//! Flattening of nested rows into dotted paths
//!
//! Schema descriptors address nested fields by dotted path
//! (`preferences.defaults.items`), so rows are flattened into the same key
//! space before dependency extraction and reference injection.

use super::Row;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A row keyed by dotted path. Values are scalars or arrays, never objects.
pub type FlatRow = BTreeMap<String, Value>;

/// Flatten a nested row into a map of dotted path -> leaf value.
///
/// Objects are recursed into; arrays and scalars are leaves, so an array of
/// objects stays a single value at its path. Empty objects are dropped.
pub fn flatten(row: &Row) -> FlatRow {
    let mut out = FlatRow::new();
    flatten_into(row, None, &mut out);
    out
}

fn flatten_into(map: &Map<String, Value>, prefix: Option<&str>, out: &mut FlatRow) {
    for (key, value) in map {
        let path = match prefix {
            Some(p) => format!("{}.{}", p, key),
            None => key.clone(),
        };
        match value {
            Value::Object(inner) => flatten_into(inner, Some(&path), out),
            leaf => {
                out.insert(path, leaf.clone());
            }
        }
    }
}

/// Rebuild a nested row from a flat one. Inverse of [`flatten`].
///
/// If a path runs through a segment that already holds a non-object value,
/// that value is replaced by an object. `flatten` never produces such input.
pub fn unflatten(flat: FlatRow) -> Row {
    let mut root = Map::new();
    for (path, value) in flat {
        let mut segments: Vec<&str> = path.split('.').collect();
        let Some(last) = segments.pop() else {
            continue;
        };

        let mut current = &mut root;
        for segment in segments {
            let slot = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            current = match slot {
                Value::Object(m) => m,
                _ => unreachable!("slot was just made an object"),
            };
        }
        current.insert(last.to_string(), value);
    }
    root
}
