//! Snapshot persistence
//!
//! Snapshots are stored as versioned JSON envelopes so the on-disk format
//! can evolve without breaking older files. Files written before the
//! envelope existed (a plain object array) still load.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{DatabaseObject, MetadataSnapshot};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    metadata: MetadataSnapshot,
}

/// Write a snapshot as pretty-printed JSON, creating parent directories as
/// needed.
pub fn save_snapshot(snapshot: &MetadataSnapshot, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = SnapshotFile {
        version: SNAPSHOT_VERSION,
        metadata: snapshot.clone(),
    };
    let json = serde_json::to_string_pretty(&file)?;
    fs::write(path, json)?;
    info!(path = %path.display(), objects = snapshot.len(), "saved snapshot");
    Ok(())
}

/// Load a snapshot from disk, accepting either the versioned envelope or a
/// bare object array.
pub fn load_snapshot(path: &Path) -> Result<MetadataSnapshot> {
    let text = fs::read_to_string(path)?;
    let snapshot = parse_snapshot(&text)?;
    debug!(path = %path.display(), objects = snapshot.len(), "loaded snapshot");
    Ok(snapshot)
}

fn parse_snapshot(text: &str) -> Result<MetadataSnapshot> {
    match serde_json::from_str::<SnapshotFile>(text) {
        Ok(file) => {
            if file.version > SNAPSHOT_VERSION {
                return Err(Error::InvalidSnapshot(format!(
                    "unsupported snapshot version {} (newest supported is {})",
                    file.version, SNAPSHOT_VERSION
                )));
            }
            Ok(file.metadata)
        }
        Err(_) => {
            let objects: Vec<DatabaseObject> = serde_json::from_str(text)
                .map_err(|e| Error::InvalidSnapshot(format!("unreadable snapshot: {}", e)))?;
            Ok(objects.into_iter().collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, ObjectKind, QualifiedName, TableDef};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn sample() -> MetadataSnapshot {
        let mut def = TableDef::default();
        def.add_column(Column::new("ID", "int"));
        vec![DatabaseObject::table(QualifiedName::parse("dbo.Orders"), def)]
            .into_iter()
            .collect()
    }

    #[test]
    fn save_and_load_preserve_objects() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshots").join("orders.json");

        let snapshot = sample();
        save_snapshot(&snapshot, &path).unwrap();
        let loaded = load_snapshot(&path).unwrap();

        assert_eq!(loaded.fingerprint(), snapshot.fingerprint());
        assert!(loaded
            .get(ObjectKind::Table, &QualifiedName::parse("dbo.Orders"))
            .is_some());
    }

    #[test]
    fn bare_array_still_loads() {
        let snapshot = sample();
        let objects: Vec<&DatabaseObject> = snapshot.objects().collect();
        let text = serde_json::to_string(&objects).unwrap();

        let loaded = parse_snapshot(&text).unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn future_version_is_rejected() {
        let text = r#"{"version": 99, "metadata": []}"#;
        assert!(matches!(
            parse_snapshot(text),
            Err(Error::InvalidSnapshot(_))
        ));
    }
}
