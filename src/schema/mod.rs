//! Collection schemas and the foreign-key descriptors derived from them
//!
//! The store reports a [`CollectionSchema`] per collection. The importer only
//! cares about which fields point at other documents, so each schema is
//! reduced once to a [`DescriptorTree`] and cached.

mod cache;
mod descriptor;
mod field;

pub use cache::{DescriptorCache, SchemaError};
pub use descriptor::{DescriptorTree, FieldDescriptor};
pub use field::{CollectionSchema, FieldSchema, ScalarKind};
