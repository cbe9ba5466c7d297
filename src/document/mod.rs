//! Documents, rows and scenarios
//!
//! Everything that flows between the scenario file and the store is plain
//! JSON (`serde_json::Value`). A row is a JSON object; a scenario maps
//! collection names to the rows to create in them.

mod flatten;
mod id;
mod scenario;

pub use flatten::{flatten, unflatten, FlatRow};
pub use id::DocumentId;
pub use scenario::Scenario;

use serde_json::{Map, Value};

/// A single input record or stored document.
pub type Row = Map<String, Value>;

/// A stored document. Same shape as a row, plus `_id` and `__v`.
pub type Document = Map<String, Value>;

/// Field holding the store-assigned identifier.
pub const ID_FIELD: &str = "_id";

/// Field holding the store's revision marker (0 when never revised).
pub const REVISION_FIELD: &str = "__v";
