//! Comparison result types
//!
//! One [`ObjectDiff`] per `(kind, qualified name)` appearing in either
//! snapshot, in stable `(kind, schema, name)` order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{DatabaseObject, ObjectKey};

/// Per-object comparison verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffStatus {
    Identical,
    Different,
    MissingInTarget,
    MissingInSource,
}

impl fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DiffStatus::Identical => "IDENTICAL",
            DiffStatus::Different => "DIFFERENT",
            DiffStatus::MissingInTarget => "MISSING_IN_TARGET",
            DiffStatus::MissingInSource => "MISSING_IN_SOURCE",
        };
        f.write_str(text)
    }
}

/// A single field-level delta between matched objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDiff {
    /// Dotted path into the object's attributes, e.g. `columns.Name.max_length`.
    pub field_path: String,
    pub source_value: Option<String>,
    pub target_value: Option<String>,
}

impl FieldDiff {
    pub fn new(
        field_path: impl Into<String>,
        source_value: Option<String>,
        target_value: Option<String>,
    ) -> Self {
        Self {
            field_path: field_path.into(),
            source_value,
            target_value,
        }
    }
}

/// Comparison record for one object key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDiff {
    pub key: ObjectKey,
    pub status: DiffStatus,
    pub source: Option<DatabaseObject>,
    pub target: Option<DatabaseObject>,
    /// Populated only when `status` is `Different`.
    pub field_diffs: Vec<FieldDiff>,
    /// Set by object-type/name filters; hidden entries stay available to the
    /// dependency resolver.
    pub hidden: bool,
}

/// Count of objects per status across a comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub identical: usize,
    pub different: usize,
    pub missing_in_target: usize,
    pub missing_in_source: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} identical, {} different, {} missing in target, {} missing in source",
            self.identical, self.different, self.missing_in_target, self.missing_in_source
        )
    }
}

/// Complete output of one comparison run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonResult {
    entries: IndexMap<ObjectKey, ObjectDiff>,
}

impl ComparisonResult {
    pub(crate) fn from_entries(entries: Vec<ObjectDiff>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| (entry.key.clone(), entry))
            .collect();
        Self { entries }
    }

    /// All entries, including hidden ones, in stable order.
    pub fn entries(&self) -> impl Iterator<Item = &ObjectDiff> {
        self.entries.values()
    }

    /// Entries that survive the object-type and name filters.
    pub fn visible_entries(&self) -> impl Iterator<Item = &ObjectDiff> {
        self.entries.values().filter(|entry| !entry.hidden)
    }

    pub fn get(&self, key: &ObjectKey) -> Option<&ObjectDiff> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys of visible entries that require synchronization work.
    pub fn changed_keys(&self) -> Vec<ObjectKey> {
        self.visible_entries()
            .filter(|entry| entry.status != DiffStatus::Identical)
            .map(|entry| entry.key.clone())
            .collect()
    }

    /// Status counts over visible entries.
    pub fn summarize(&self) -> Summary {
        let mut summary = Summary::default();
        for entry in self.visible_entries() {
            match entry.status {
                DiffStatus::Identical => summary.identical += 1,
                DiffStatus::Different => summary.different += 1,
                DiffStatus::MissingInTarget => summary.missing_in_target += 1,
                DiffStatus::MissingInSource => summary.missing_in_source += 1,
            }
        }
        summary
    }
}
