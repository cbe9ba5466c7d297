//! Foreign-key descriptors

use super::field::{CollectionSchema, FieldSchema};
use std::collections::BTreeMap;

/// How a field relates to other documents.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDescriptor {
    /// Plain value, never a reference
    None,
    /// Holds one label / document ID
    SingleRef,
    /// Holds an array of labels / document IDs
    ArrayRef,
    /// Holds an array of sub-documents, each described by the nested tree
    SubDocument(DescriptorTree),
}

impl FieldDescriptor {
    pub fn is_reference(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Dotted field path -> descriptor, for one collection or sub-document.
///
/// Paths use the same key space as [`crate::document::flatten`]: nested
/// objects contribute `outer.inner` keys, arrays of objects are a single
/// [`FieldDescriptor::SubDocument`] entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorTree {
    fields: BTreeMap<String, FieldDescriptor>,
}

/// Identity fields are assigned by the store and never describe references.
const IDENTITY_FIELDS: [&str; 2] = ["_id", "id"];

impl DescriptorTree {
    /// Derive the descriptor tree of a collection schema.
    pub fn from_schema(schema: &CollectionSchema) -> Self {
        Self::from_fields(&schema.fields)
    }

    fn from_fields(fields: &BTreeMap<String, FieldSchema>) -> Self {
        let mut tree = Self::default();
        tree.describe_into(fields, None);
        tree
    }

    fn describe_into(&mut self, fields: &BTreeMap<String, FieldSchema>, prefix: Option<&str>) {
        for (name, field) in fields {
            if IDENTITY_FIELDS.contains(&name.as_str()) {
                continue;
            }
            let path = match prefix {
                Some(p) => format!("{}.{}", p, name),
                None => name.clone(),
            };
            match field {
                FieldSchema::Object { fields } => self.describe_into(fields, Some(&path)),
                other => {
                    self.fields.insert(path, Self::describe_field(other));
                }
            }
        }
    }

    fn describe_field(field: &FieldSchema) -> FieldDescriptor {
        match field {
            FieldSchema::Reference { .. } => FieldDescriptor::SingleRef,
            FieldSchema::Array { items } => match items.as_ref() {
                FieldSchema::Reference { .. } => FieldDescriptor::ArrayRef,
                FieldSchema::Object { fields } => {
                    FieldDescriptor::SubDocument(Self::from_fields(fields))
                }
                _ => FieldDescriptor::None,
            },
            _ => FieldDescriptor::None,
        }
    }

    /// Descriptor of a dotted path, if the schema knows it.
    pub fn get(&self, path: &str) -> Option<&FieldDescriptor> {
        self.fields.get(path)
    }

    /// All described paths.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Paths that can hold references (directly or inside sub-documents).
    pub fn reference_paths(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, d)| d.is_reference())
            .map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render the tree as an indented listing, one path per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        for (path, descriptor) in &self.fields {
            let label = match descriptor {
                FieldDescriptor::None => "none",
                FieldDescriptor::SingleRef => "ref",
                FieldDescriptor::ArrayRef => "ref[]",
                FieldDescriptor::SubDocument(_) => "subdocument[]",
            };
            out.push_str(&format!("{}{}: {}\n", indent, path, label));
            if let FieldDescriptor::SubDocument(nested) = descriptor {
                nested.render_into(out, depth + 1);
            }
        }
    }
}
