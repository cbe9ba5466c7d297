//! Collection schema as reported by the store

use crate::document::{Document, ID_FIELD, REVISION_FIELD};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Kind of a plain (non-reference) value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    String,
    Number,
    Boolean,
    #[default]
    Any,
}

/// Type of a single schema field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldSchema {
    /// A plain value
    Scalar {
        #[serde(default)]
        kind: ScalarKind,
    },
    /// The ID of a document, optionally naming its collection
    Reference {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        collection: Option<String>,
    },
    /// An array of values of one type
    Array { items: Box<FieldSchema> },
    /// A nested object
    Object { fields: BTreeMap<String, FieldSchema> },
}

impl FieldSchema {
    pub fn scalar(kind: ScalarKind) -> Self {
        Self::Scalar { kind }
    }

    pub fn string() -> Self {
        Self::scalar(ScalarKind::String)
    }

    pub fn number() -> Self {
        Self::scalar(ScalarKind::Number)
    }

    pub fn boolean() -> Self {
        Self::scalar(ScalarKind::Boolean)
    }

    pub fn reference(collection: impl Into<String>) -> Self {
        Self::Reference {
            collection: Some(collection.into()),
        }
    }

    pub fn array(items: FieldSchema) -> Self {
        Self::Array {
            items: Box::new(items),
        }
    }

    pub fn object(fields: impl IntoIterator<Item = (impl Into<String>, FieldSchema)>) -> Self {
        Self::Object {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Check a value against this field type. `path` is used in the message.
    fn validate(&self, path: &str, value: &Value) -> Result<(), String> {
        if value.is_null() {
            return Ok(());
        }
        match self {
            Self::Scalar { kind } => {
                let ok = match kind {
                    ScalarKind::String => value.is_string(),
                    ScalarKind::Number => value.is_number(),
                    ScalarKind::Boolean => value.is_boolean(),
                    ScalarKind::Any => !value.is_object() && !value.is_array(),
                };
                if ok {
                    Ok(())
                } else {
                    Err(format!("{}: expected {:?} value, got {}", path, kind, value))
                }
            }
            Self::Reference { .. } => match value.as_str() {
                Some(s) if Uuid::parse_str(s).is_ok() => Ok(()),
                _ => Err(format!("{}: cast to document id failed for value {}", path, value)),
            },
            Self::Array { items } => match value {
                Value::Array(elements) => {
                    for (i, element) in elements.iter().enumerate() {
                        items.validate(&format!("{}[{}]", path, i), element)?;
                    }
                    Ok(())
                }
                other => Err(format!("{}: expected array, got {}", path, other)),
            },
            Self::Object { fields } => match value {
                Value::Object(map) => validate_fields(fields, map, Some(path)),
                other => Err(format!("{}: expected object, got {}", path, other)),
            },
        }
    }
}

fn validate_fields(
    fields: &BTreeMap<String, FieldSchema>,
    map: &serde_json::Map<String, Value>,
    prefix: Option<&str>,
) -> Result<(), String> {
    for (name, value) in map {
        if prefix.is_none() && (name == ID_FIELD || name == REVISION_FIELD) {
            continue;
        }
        let Some(field) = fields.get(name) else {
            continue;
        };
        let path = match prefix {
            Some(p) => format!("{}.{}", p, name),
            None => name.clone(),
        };
        field.validate(&path, value)?;
    }
    Ok(())
}

/// Schema of a whole collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub fields: BTreeMap<String, FieldSchema>,
}

impl CollectionSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field to the schema
    pub fn with_field(mut self, name: impl Into<String>, field: FieldSchema) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    /// Validate a document before it is persisted.
    ///
    /// Fields without a schema entry are accepted as-is. `_id` and `__v` are
    /// managed by the store and never checked here.
    pub fn validate(&self, document: &Document) -> Result<(), String> {
        validate_fields(&self.fields, document, None)
    }
}
