//! Dependency extraction

use crate::document::{flatten, FlatRow};
use crate::schema::{DescriptorTree, FieldDescriptor};
use serde_json::Value;

/// Labels that must be resolved before `row` can be created.
///
/// Only fields present in the row count, so an omitted reference is simply
/// optional. Sub-document arrays are searched element by element with their
/// nested descriptor tree. The `after_key` field adds labels with no data
/// relationship; it may hold a single label or an array of them.
///
/// Order is not meaningful and duplicates are possible.
pub fn dependencies(row: &FlatRow, tree: &DescriptorTree, after_key: &str) -> Vec<String> {
    let mut labels = Vec::new();
    collect(row, tree, &mut labels);
    if let Some(after) = row.get(after_key) {
        push_labels(after, &mut labels);
    }
    labels
}

fn collect(row: &FlatRow, tree: &DescriptorTree, labels: &mut Vec<String>) {
    for (path, value) in row {
        match tree.get(path) {
            Some(FieldDescriptor::SingleRef) | Some(FieldDescriptor::ArrayRef) => {
                push_labels(value, labels)
            }
            Some(FieldDescriptor::SubDocument(nested)) => {
                if let Value::Array(elements) = value {
                    for element in elements {
                        if let Value::Object(sub) = element {
                            collect(&flatten(sub), nested, labels);
                        }
                    }
                }
            }
            Some(FieldDescriptor::None) | None => {}
        }
    }
}

/// A string is one label, an array contributes its string elements.
fn push_labels(value: &Value, labels: &mut Vec<String>) {
    match value {
        Value::String(label) => labels.push(label.clone()),
        Value::Array(items) => labels.extend(items.iter().filter_map(Value::as_str).map(String::from)),
        _ => {}
    }
}
