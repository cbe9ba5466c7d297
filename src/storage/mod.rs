//! Storage backends for scenarios
//!
//! The importer talks to the store only through the `DocumentStore` trait.
//! The bundled implementation is `SqliteStore`.

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{DocumentStore, OpenStore, StorageError, StorageResult};
