//! Schema comparator
//!
//! Walks two metadata snapshots and produces one [`ObjectDiff`] per
//! `(kind, qualified name)` present in either side. Output order is stable
//! (`kind`, `schema`, `name`) regardless of extraction order, so repeated
//! runs over unchanged inputs produce byte-identical reports.

use indexmap::IndexMap;
use regex::Regex;
use std::collections::BTreeSet;
use tracing::debug;

use crate::compare::result::{ComparisonResult, DiffStatus, ObjectDiff};
use crate::compare::rules;
use crate::error::{Error, Result};
use crate::model::{DatabaseObject, MetadataSnapshot, ObjectKey};
use crate::options::ComparisonOptions;

/// Compare two snapshots under the given options.
///
/// Fails only for call-boundary input errors: a payload whose shape does not
/// match its kind, an invalid exclusion regex, or (under `ignore_name_case`)
/// two objects in one snapshot whose names collide case-insensitively.
/// Data the comparator does not understand degrades to textual comparison.
pub fn compare(
    source: &MetadataSnapshot,
    target: &MetadataSnapshot,
    options: &ComparisonOptions,
) -> Result<ComparisonResult> {
    validate_snapshot(source, "source")?;
    validate_snapshot(target, "target")?;
    let exclude_pattern = options
        .exclude_name_pattern
        .as_deref()
        .map(Regex::new)
        .transpose()
        .map_err(|e| Error::InvalidOptions(format!("bad exclude_name_pattern: {}", e)))?;

    let source_by_key = match_keys(source, options, "source")?;
    let target_by_key = match_keys(target, options, "target")?;

    let all_keys: BTreeSet<ObjectKey> = source_by_key
        .keys()
        .chain(target_by_key.keys())
        .cloned()
        .collect();

    let mut entries = Vec::with_capacity(all_keys.len());
    for match_key in all_keys {
        let src = source_by_key.get(&match_key).copied();
        let tgt = target_by_key.get(&match_key).copied();

        let (status, field_diffs) = match (src, tgt) {
            (Some(src), Some(tgt)) => {
                let diffs = rules::diff_objects(src, tgt, options);
                if diffs.is_empty() {
                    (DiffStatus::Identical, diffs)
                } else {
                    (DiffStatus::Different, diffs)
                }
            }
            (Some(_), None) => (DiffStatus::MissingInTarget, Vec::new()),
            (None, Some(_)) => (DiffStatus::MissingInSource, Vec::new()),
            (None, None) => unreachable!("key came from one of the snapshots"),
        };

        // Report under the source-side spelling when both sides exist.
        let display_object = src.or(tgt).expect("at least one side present");
        let key = display_object.key();
        debug!(object = %key, status = %status, "compared object");

        let hidden = options.excluded_kinds.contains(&key.kind)
            || exclude_pattern
                .as_ref()
                .map(|re| re.is_match(&key.name.to_string()))
                .unwrap_or(false);

        entries.push(ObjectDiff {
            key,
            status,
            source: src.cloned(),
            target: tgt.cloned(),
            field_diffs,
            hidden,
        });
    }

    Ok(ComparisonResult::from_entries(entries))
}

fn validate_snapshot(snapshot: &MetadataSnapshot, side: &str) -> Result<()> {
    for object in snapshot.objects() {
        if !object.payload_matches_kind() {
            return Err(Error::InvalidSnapshot(format!(
                "{} snapshot: payload shape does not match kind for {}",
                side,
                object.key()
            )));
        }
    }
    Ok(())
}

/// Build the match-key index for one side, normalizing names when the
/// collation option asks for case-insensitive matching.
fn match_keys<'a>(
    snapshot: &'a MetadataSnapshot,
    options: &ComparisonOptions,
    side: &str,
) -> Result<IndexMap<ObjectKey, &'a DatabaseObject>> {
    let mut index = IndexMap::with_capacity(snapshot.len());
    for object in snapshot.objects() {
        let mut key = object.key();
        if options.ignore_name_case {
            key.name = key.name.to_lowercase();
        }
        if index.insert(key.clone(), object).is_some() {
            return Err(Error::InvalidSnapshot(format!(
                "{} snapshot: case-insensitive matching collapses two objects onto {}",
                side, key
            )));
        }
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, ObjectKind, QualifiedName, TableDef};
    use pretty_assertions::assert_eq;

    fn table(name: &str, columns: Vec<Column>) -> DatabaseObject {
        let mut def = TableDef::default();
        for col in columns {
            def.add_column(col);
        }
        DatabaseObject::table(QualifiedName::parse(name), def)
    }

    #[test]
    fn union_of_key_spaces_is_complete() {
        let source: MetadataSnapshot =
            vec![table("dbo.A", vec![]), table("dbo.B", vec![])].into_iter().collect();
        let target: MetadataSnapshot =
            vec![table("dbo.B", vec![]), table("dbo.C", vec![])].into_iter().collect();

        let result = compare(&source, &target, &ComparisonOptions::default()).unwrap();
        assert_eq!(result.len(), 3);

        let statuses: Vec<DiffStatus> = result.entries().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![
                DiffStatus::MissingInTarget,
                DiffStatus::Identical,
                DiffStatus::MissingInSource
            ]
        );
    }

    #[test]
    fn filters_hide_but_never_remove() {
        let source: MetadataSnapshot = vec![
            table("dbo.Orders", vec![]),
            DatabaseObject::new(
                ObjectKind::User,
                QualifiedName::bare("app_user"),
                crate::model::ObjectPayload::Principal(Default::default()),
            ),
        ]
        .into_iter()
        .collect();
        let target = MetadataSnapshot::new();

        let options = ComparisonOptions {
            excluded_kinds: vec![ObjectKind::User],
            ..Default::default()
        };
        let result = compare(&source, &target, &options).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.visible_entries().count(), 1);

        let hidden_key = ObjectKey::new(ObjectKind::User, QualifiedName::bare("app_user"));
        assert!(result.get(&hidden_key).unwrap().hidden);
    }

    #[test]
    fn invalid_exclude_pattern_is_rejected() {
        let options = ComparisonOptions {
            exclude_name_pattern: Some("(".to_string()),
            ..Default::default()
        };
        let err = compare(&MetadataSnapshot::new(), &MetadataSnapshot::new(), &options);
        assert!(matches!(err, Err(Error::InvalidOptions(_))));
    }

    #[test]
    fn case_insensitive_collision_is_an_input_error() {
        let source: MetadataSnapshot =
            vec![table("dbo.Orders", vec![]), table("dbo.ORDERS", vec![])].into_iter().collect();
        let options = ComparisonOptions {
            ignore_name_case: true,
            ..Default::default()
        };
        let err = compare(&source, &MetadataSnapshot::new(), &options);
        assert!(matches!(err, Err(Error::InvalidSnapshot(_))));
    }
}
