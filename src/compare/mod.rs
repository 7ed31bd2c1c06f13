//! Schema comparison: per-kind equality rules and the snapshot walker

pub mod comparator;
pub mod result;
pub mod rules;

pub use comparator::compare;
pub use result::{ComparisonResult, DiffStatus, FieldDiff, ObjectDiff, Summary};
