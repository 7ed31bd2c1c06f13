//! Scripts-folder import
//!
//! Builds a snapshot from a directory of `.sql` files. Each file is scanned
//! for its leading CREATE statement; the object carries its full file text
//! as the definition, so definition-only comparison still works for objects
//! whose structure is never parsed.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::Result;
use crate::model::{
    DatabaseObject, MetadataSnapshot, ObjectKind, ObjectPayload, QualifiedName, TableDef,
};

static CREATE_STATEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)create\s+(?:or\s+alter\s+)?(table|view|procedure|proc|function|trigger|synonym)\s+([^\s(]+)")
        .unwrap()
});

/// Walk a directory tree and build a snapshot from every `.sql` file whose
/// first CREATE statement can be recognized. Files without one are skipped
/// with a warning.
pub fn load_scripts_folder(root: &Path) -> Result<MetadataSnapshot> {
    let mut snapshot = MetadataSnapshot::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_sql = entry
            .path()
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("sql"))
            .unwrap_or(false);
        if !is_sql {
            continue;
        }
        let text = fs::read_to_string(entry.path())?;
        match parse_script(&text) {
            Some(object) => {
                debug!(path = %entry.path().display(), object = %object.key(), "imported script");
                if let Some(prior) = snapshot.insert(object) {
                    warn!(object = %prior.key(), "duplicate object definition, keeping the later file");
                }
            }
            None => {
                warn!(path = %entry.path().display(), "no recognizable CREATE statement, skipping");
            }
        }
    }
    Ok(snapshot)
}

fn parse_script(text: &str) -> Option<DatabaseObject> {
    let caps = CREATE_STATEMENT.captures(text)?;
    let kind = match caps[1].to_lowercase().as_str() {
        "table" => ObjectKind::Table,
        "view" => ObjectKind::View,
        "procedure" | "proc" => ObjectKind::Procedure,
        "function" => ObjectKind::Function,
        "trigger" => ObjectKind::Trigger,
        "synonym" => ObjectKind::Synonym,
        _ => return None,
    };
    let name = QualifiedName::parse(&caps[2]);
    let payload = match kind {
        // No column metadata from raw scripts; the comparator falls back to
        // definition text for these.
        ObjectKind::Table => ObjectPayload::Table(TableDef::default()),
        _ => ObjectPayload::Definition,
    };
    Some(
        DatabaseObject::new(kind, name, payload).definition(text.trim()),
    )
}
