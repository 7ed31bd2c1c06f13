//! Dependency graph: edge derivation, closure expansion, and ordering

pub mod resolver;
pub mod scan;

pub use resolver::{DependencyResolver, PlanEntry, ResolvedOrder};
pub use scan::{DependencyScanner, TextScanner};
