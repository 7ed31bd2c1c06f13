//! Comparison and deployment options
//!
//! Immutable configuration value objects consulted by the comparator and the
//! script generator. Options can be loaded from a TOML file for CLI use.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::ObjectKind;

/// Tolerance switches for schema comparison.
///
/// Name matching is case-sensitive unless `ignore_name_case` is set; the
/// engine never assumes database collation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonOptions {
    /// Collapse runs of whitespace when comparing definition text.
    pub ignore_whitespace: bool,
    /// Match and compare object/column names case-insensitively.
    pub ignore_name_case: bool,
    /// Suppress name differences for system-generated constraint names
    /// (`PK__...`, `DF__...` style) inside table payloads.
    pub ignore_system_named_constraints: bool,
    /// Kinds hidden from the visible result set. Hiding never affects
    /// matching or dependency resolution.
    pub excluded_kinds: Vec<ObjectKind>,
    /// Regex over `schema.name`; matching objects are hidden.
    pub exclude_name_pattern: Option<String>,
}

/// Switches controlling deployment script assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentOptions {
    /// Database named in the script's `USE` statement.
    pub target_database: Option<String>,
    /// Wrap the whole script in a single transaction.
    pub transactional: bool,
    pub include_drop_phase: bool,
    pub include_table_phase: bool,
    pub include_constraint_phase: bool,
    pub include_programmability_phase: bool,
    pub include_misc_phase: bool,
    /// Emit the companion rollback script.
    pub include_rollback: bool,
    /// Timestamp rendered in the header comment. Left unset, the header
    /// carries no timestamp and output is byte-identical across runs.
    pub header_timestamp: Option<String>,
}

impl Default for DeploymentOptions {
    fn default() -> Self {
        Self {
            target_database: None,
            transactional: true,
            include_drop_phase: true,
            include_table_phase: true,
            include_constraint_phase: true,
            include_programmability_phase: true,
            include_misc_phase: true,
            include_rollback: true,
            header_timestamp: None,
        }
    }
}

/// On-disk options document combining both option sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsFile {
    pub comparison: ComparisonOptions,
    pub deployment: DeploymentOptions,
}

/// Load options from a TOML file
pub fn load_from_file(path: impl AsRef<Path>) -> Result<OptionsFile> {
    let text = fs::read_to_string(path.as_ref())
        .map_err(|e| Error::ConfigError(format!("Failed to read options file: {}", e)))?;
    let options: OptionsFile = toml::from_str(&text)?;
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn options_file_parses_with_partial_sections() {
        let doc = r#"
            [comparison]
            ignore_whitespace = true
            excluded_kinds = ["User", "Role"]

            [deployment]
            transactional = false
        "#;
        let options: OptionsFile = toml::from_str(doc).unwrap();
        assert!(options.comparison.ignore_whitespace);
        assert_eq!(
            options.comparison.excluded_kinds,
            vec![ObjectKind::User, ObjectKind::Role]
        );
        assert!(!options.deployment.transactional);
        assert!(options.deployment.include_rollback);
    }

    #[test]
    fn deployment_defaults_enable_all_phases() {
        let options = DeploymentOptions::default();
        assert!(options.transactional);
        assert!(options.include_drop_phase);
        assert!(options.include_misc_phase);
        assert!(options.header_timestamp.is_none());
    }
}
