//! Scenario: populate a document store from declarative scenarios
//!
//! A scenario is a map of collection names to rows. Rows can carry a symbolic
//! label (`_ref`) and refer to other rows by label in any reference field,
//! or force ordering with `_after`. The engine creates every row once the
//! rows it refers to exist, substituting real document IDs for labels.
//!
//! # Core Concepts
//!
//! - **Descriptor tree**: which fields of a collection hold references
//! - **Reference table**: label to document ID, filled as rows are created
//! - **Task graph**: one task per row, started when its labels resolve
//!
//! # Example
//!
//! ```
//! use scenario::{CollectionSchema, DocumentStore, FieldSchema, OpenStore, Scenario, ScenarioEngine, SqliteStore};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let store = SqliteStore::open_in_memory().unwrap();
//! store
//!     .define_collection("widgets", CollectionSchema::new().with_field("name", FieldSchema::string()))
//!     .await
//!     .unwrap();
//! store
//!     .define_collection("users", CollectionSchema::new().with_field("favourite", FieldSchema::reference("widgets")))
//!     .await
//!     .unwrap();
//!
//! let engine = ScenarioEngine::new(Arc::new(store));
//! let scenario = Scenario::from_value(json!({
//!     "users": [{ "favourite": "flarp" }],
//!     "widgets": [{ "_ref": "flarp", "name": "Flarp" }],
//! }))
//! .unwrap();
//!
//! let progress = engine.import(&scenario).await.unwrap();
//! assert_eq!(progress.total_created(), 2);
//! # });
//! ```

pub mod document;
pub mod engine;
pub mod resolve;
pub mod scheduler;
pub mod schema;
pub mod storage;

pub use document::{flatten, unflatten, Document, DocumentId, FlatRow, Row, Scenario};
pub use engine::{
    ExportOptions, ImportFailure, ImportOptions, Keys, Nuke, Progress, ScenarioEngine, ScenarioError,
};
pub use resolve::ReferenceTable;
pub use scheduler::{StallReport, TaskGraph, TaskKey};
pub use schema::{CollectionSchema, DescriptorCache, DescriptorTree, FieldDescriptor, FieldSchema, ScalarKind};
pub use storage::{DocumentStore, OpenStore, SqliteStore, StorageError, StorageResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
