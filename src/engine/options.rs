//! Per-call options
//!
//! Every import runs with one explicit `ImportOptions` value. Fields missing
//! from a deserialized options file take their defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which collections to empty before creating anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Nuke {
    /// `true` empties every collection the store knows, `false` none
    All(bool),
    /// Empty exactly these collections
    Collections(Vec<String>),
}

impl Nuke {
    pub fn collections(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Collections(names.into_iter().map(Into::into).collect())
    }

    pub fn is_enabled(&self) -> bool {
        match self {
            Self::All(all) => *all,
            Self::Collections(names) => !names.is_empty(),
        }
    }
}

impl Default for Nuke {
    fn default() -> Self {
        Self::All(false)
    }
}

/// Names of the bookkeeping fields on input rows. Both are stripped before
/// the row is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keys {
    /// Field holding the row's own label
    #[serde(rename = "ref")]
    pub reference: String,
    /// Field listing labels that must be created first
    pub after: String,
}

impl Default for Keys {
    fn default() -> Self {
        Self {
            reference: "_ref".to_string(),
            after: "_after".to_string(),
        }
    }
}

/// Options for one import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    pub nuke: Nuke,
    /// Forget labels from earlier imports before starting
    pub reset: bool,
    /// Longest the run may go without creating a row
    pub timeout_ms: u64,
    pub keys: Keys,
    /// Fail before creating anything if a label is never defined
    pub check_dependencies: bool,
    /// Re-read collection schemas instead of using cached descriptors
    pub reset_descriptors: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            nuke: Nuke::default(),
            reset: true,
            timeout_ms: 2000,
            keys: Keys::default(),
            check_dependencies: false,
            reset_descriptors: false,
        }
    }
}

impl ImportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nuke(mut self, nuke: Nuke) -> Self {
        self.nuke = nuke;
        self
    }

    pub fn with_reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_keys(mut self, keys: Keys) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_check_dependencies(mut self, check: bool) -> Self {
        self.check_dependencies = check;
        self
    }

    pub fn with_reset_descriptors(mut self, reset: bool) -> Self {
        self.reset_descriptors = reset;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Options for an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Only these collections; every known collection when `None`
    pub collections: Option<Vec<String>>,
    /// Label every row with its own `_id` so the export can be re-imported
    pub with_refs: bool,
    /// Field the label is written to when `with_refs` is set
    pub ref_key: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            collections: None,
            with_refs: false,
            ref_key: Keys::default().reference,
        }
    }
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collections(mut self, collections: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.collections = Some(collections.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_refs(mut self, with_refs: bool) -> Self {
        self.with_refs = with_refs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = ImportOptions::default();
        assert!(options.reset);
        assert_eq!(options.timeout(), Duration::from_secs(2));
        assert_eq!(options.keys.reference, "_ref");
        assert_eq!(options.keys.after, "_after");
        assert!(!options.nuke.is_enabled());
        assert!(!options.check_dependencies);
    }

    #[test]
    fn partial_file_merges_over_defaults() {
        let options: ImportOptions =
            serde_yaml::from_str("reset: false\nkeys:\n  ref: $id\n").unwrap();

        assert!(!options.reset);
        assert_eq!(options.keys.reference, "$id");
        assert_eq!(options.keys.after, "_after");
        assert_eq!(options.timeout_ms, 2000);
    }

    #[test]
    fn nuke_accepts_flag_or_list() {
        let all: ImportOptions = serde_yaml::from_str("nuke: true").unwrap();
        assert_eq!(all.nuke, Nuke::All(true));

        let some: ImportOptions = serde_yaml::from_str("nuke: [widgets, users]").unwrap();
        assert_eq!(some.nuke, Nuke::collections(["widgets", "users"]));
        assert!(some.nuke.is_enabled());

        assert!(!Nuke::Collections(vec![]).is_enabled());
    }
}
