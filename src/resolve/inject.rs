//! Reference injection

use super::refs::ReferenceTable;
use crate::document::{flatten, unflatten, FlatRow};
use crate::schema::{DescriptorTree, FieldDescriptor};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum InjectError {
    /// A label was used before its document was created. The scheduler only
    /// runs a row once all of its labels are resolved, so this is a bug.
    #[error("reference '{label}' in field '{field}' is not resolved yet")]
    ReferenceNotReady { label: String, field: String },
}

/// Replace every label in the reference fields of `row` with its document ID.
///
/// Walks the same fields as [`super::dependencies`]. Fails on the first label
/// the table cannot resolve; the row may then be partially rewritten.
pub fn inject(row: &mut FlatRow, tree: &DescriptorTree, refs: &ReferenceTable) -> Result<(), InjectError> {
    inject_at(row, tree, refs, None)
}

fn inject_at(
    row: &mut FlatRow,
    tree: &DescriptorTree,
    refs: &ReferenceTable,
    prefix: Option<&str>,
) -> Result<(), InjectError> {
    for (path, value) in row.iter_mut() {
        let Some(descriptor) = tree.get(path) else {
            continue;
        };
        let field = match prefix {
            Some(p) => format!("{}.{}", p, path),
            None => path.clone(),
        };

        match descriptor {
            FieldDescriptor::SingleRef => replace_label(value, refs, &field)?,
            FieldDescriptor::ArrayRef => {
                if let Value::Array(items) = value {
                    for (i, item) in items.iter_mut().enumerate() {
                        replace_label(item, refs, &format!("{}[{}]", field, i))?;
                    }
                }
            }
            FieldDescriptor::SubDocument(nested) => {
                if let Value::Array(elements) = value {
                    for (i, element) in elements.iter_mut().enumerate() {
                        if let Value::Object(sub) = element {
                            let mut flat = flatten(sub);
                            inject_at(&mut flat, nested, refs, Some(&format!("{}[{}]", field, i)))?;
                            *sub = unflatten(flat);
                        }
                    }
                }
            }
            FieldDescriptor::None => {}
        }
    }
    Ok(())
}

fn replace_label(value: &mut Value, refs: &ReferenceTable, field: &str) -> Result<(), InjectError> {
    if let Value::String(label) = value {
        let id = refs.resolve(label).ok_or_else(|| InjectError::ReferenceNotReady {
            label: label.clone(),
            field: field.to_string(),
        })?;
        *value = Value::from(id);
    }
    Ok(())
}
