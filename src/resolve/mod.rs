//! Symbolic reference resolution
//!
//! Rows name each other by label. Before a row can be created, every label
//! it mentions must be mapped to a real document ID in the [`ReferenceTable`].
//! [`dependencies`] lists those labels; [`inject`] swaps them for IDs.

mod dependencies;
mod inject;
mod refs;

pub use dependencies::dependencies;
pub use inject::{inject, InjectError};
pub use refs::{ReferenceError, ReferenceTable};
