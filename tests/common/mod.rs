//! Common test utilities for scenario imports
//!
//! Fixture collections modelled on a small shop (users, widgets, groups,
//! projects) and store wrappers that misbehave on purpose.

pub mod fixtures;
pub mod stores;

pub use fixtures::{define_fixtures, fixture_engine, fixture_store, scenario_from};
pub use stores::{FailingStore, SlowStore};
