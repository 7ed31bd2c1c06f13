//! # schema_compare
//!
//! A schema comparison, dependency resolution, and script generation engine
//! for relational database snapshots.
//!
//! The library works entirely on serialized structural metadata: given two
//! [`MetadataSnapshot`](model::MetadataSnapshot)s it produces a categorized
//! difference report, orders the changed objects so that every dependency is
//! created before its dependents, and renders a phased deployment script
//! together with its rollback and a list of safety warnings. No database
//! connection is involved at any point.
//!
//! ```no_run
//! use schema_compare::model::MetadataSnapshot;
//! use schema_compare::options::{ComparisonOptions, DeploymentOptions};
//!
//! # fn main() -> schema_compare::error::Result<()> {
//! let source = schema_compare::io::load_snapshot("dev.json".as_ref())?;
//! let target = schema_compare::io::load_snapshot("prod.json".as_ref())?;
//!
//! let result = schema_compare::compare(&source, &target, &ComparisonOptions::default())?;
//! let output = schema_compare::generate_scripts(
//!     &result,
//!     &result.changed_keys(),
//!     &DeploymentOptions::default(),
//! )?;
//! println!("{}", output.script);
//! # Ok(())
//! # }
//! ```

pub mod compare;
pub mod error;
pub mod graph;
pub mod io;
pub mod logging;
pub mod model;
pub mod options;
pub mod script;

pub use compare::{ComparisonResult, DiffStatus};
pub use error::{Error, Result};
pub use graph::{DependencyResolver, ResolvedOrder};
pub use model::{DatabaseObject, MetadataSnapshot, ObjectKey, ObjectKind, QualifiedName};
pub use options::{ComparisonOptions, DeploymentOptions};
pub use script::{GeneratedScript, ScriptGenerator, Severity, Warning};

/// Compare two snapshots. Thin re-export of [`compare::compare`] so the
/// common path reads `schema_compare::compare(..)`.
pub fn compare(
    source: &MetadataSnapshot,
    target: &MetadataSnapshot,
    options: &ComparisonOptions,
) -> Result<ComparisonResult> {
    compare::compare(source, target, options)
}

/// Resolve the deployment order for a selection of changed objects,
/// expanding the selection with any required dependencies.
pub fn resolve_order(result: &ComparisonResult, selection: &[ObjectKey]) -> Result<ResolvedOrder> {
    DependencyResolver::new(result).resolve(selection)
}

/// Resolve order and generate deployment plus rollback scripts in one step.
pub fn generate_scripts(
    result: &ComparisonResult,
    selection: &[ObjectKey],
    options: &DeploymentOptions,
) -> Result<GeneratedScript> {
    let order = resolve_order(result, selection)?;
    ScriptGenerator::new(result, options).generate(&order)
}
