//! Warning/risk analyzer
//!
//! Inspects pending changes for destructive operations before script
//! generation. Warnings are advisory except `Fatal`, which blocks
//! generation (unresolved dependency cycles).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::compare::{ComparisonResult, DiffStatus, ObjectDiff};
use crate::model::{Column, ObjectKey, ObjectKind, ObjectPayload, TableDef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Caution,
    Destructive,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Severity::Info => "INFO",
            Severity::Caution => "CAUTION",
            Severity::Destructive => "DESTRUCTIVE",
            Severity::Fatal => "FATAL",
        };
        f.write_str(text)
    }
}

/// One advisory finding about a pending change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub severity: Severity,
    pub object: ObjectKey,
    pub message: String,
}

impl Warning {
    fn new(severity: Severity, object: &ObjectKey, message: String) -> Self {
        Self {
            severity,
            object: object.clone(),
            message,
        }
    }
}

/// Broad type families used to flag conversions across families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFamily {
    ExactNumeric,
    ApproximateNumeric,
    Character,
    Binary,
    DateTime,
    Other,
}

pub fn type_family(data_type: &str) -> TypeFamily {
    match data_type.to_lowercase().as_str() {
        "bit" | "tinyint" | "smallint" | "int" | "bigint" | "decimal" | "numeric" | "money"
        | "smallmoney" => TypeFamily::ExactNumeric,
        "float" | "real" => TypeFamily::ApproximateNumeric,
        "char" | "varchar" | "nchar" | "nvarchar" | "text" | "ntext" => TypeFamily::Character,
        "binary" | "varbinary" | "image" => TypeFamily::Binary,
        "date" | "time" | "datetime" | "datetime2" | "smalldatetime" | "datetimeoffset" => {
            TypeFamily::DateTime
        }
        _ => TypeFamily::Other,
    }
}

/// Effective length for narrowing checks; `-1` (MAX) dominates.
fn effective_length(length: Option<i32>) -> i64 {
    match length {
        Some(-1) => i64::MAX,
        Some(len) => len as i64,
        None => 0,
    }
}

/// Analyze the selected differences for risky operations.
pub fn analyze(result: &ComparisonResult, selected: &[ObjectKey]) -> Vec<Warning> {
    let mut warnings = Vec::new();
    for key in selected {
        let entry = match result.get(key) {
            Some(entry) => entry,
            None => continue,
        };
        match entry.status {
            DiffStatus::MissingInSource => analyze_drop(entry, &mut warnings),
            DiffStatus::Different => analyze_change(entry, &mut warnings),
            _ => {}
        }
    }
    warnings
}

/// Fatal findings for an unresolved dependency cycle.
pub fn cycle_warnings(cycles: &[Vec<ObjectKey>]) -> Vec<Warning> {
    cycles
        .iter()
        .flat_map(|cycle| {
            let members: Vec<String> = cycle.iter().map(|k| k.to_string()).collect();
            let message = format!(
                "unresolved dependency cycle: {}; script generation is blocked",
                members.join(", ")
            );
            cycle
                .iter()
                .map(move |member| Warning::new(Severity::Fatal, member, message.clone()))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn analyze_drop(entry: &ObjectDiff, warnings: &mut Vec<Warning>) {
    let severity = match entry.key.kind {
        ObjectKind::Table => Severity::Destructive,
        ObjectKind::PrimaryKey
        | ObjectKind::UniqueConstraint
        | ObjectKind::ForeignKey
        | ObjectKind::CheckConstraint
        | ObjectKind::DefaultConstraint
        | ObjectKind::Index => Severity::Caution,
        _ => Severity::Info,
    };
    let noun = entry.key.kind.label();
    warnings.push(Warning::new(
        severity,
        &entry.key,
        format!("{} {} exists only in target and will be dropped", noun, entry.key.name),
    ));
}

fn analyze_change(entry: &ObjectDiff, warnings: &mut Vec<Warning>) {
    let (src, tgt) = match (entry.source.as_ref(), entry.target.as_ref()) {
        (Some(src), Some(tgt)) => (src, tgt),
        _ => return,
    };
    if let (ObjectPayload::Table(src_table), ObjectPayload::Table(tgt_table)) =
        (&src.payload, &tgt.payload)
    {
        analyze_table_change(entry, src_table, tgt_table, warnings);
    }
}

fn analyze_table_change(
    entry: &ObjectDiff,
    src: &TableDef,
    tgt: &TableDef,
    warnings: &mut Vec<Warning>,
) {
    for tgt_col in &tgt.columns {
        match src.column(&tgt_col.name) {
            Some(src_col) => analyze_column_change(entry, src_col, tgt_col, warnings),
            None => warnings.push(Warning::new(
                Severity::Destructive,
                &entry.key,
                format!(
                    "column {} will be dropped from {}; data in it is lost",
                    tgt_col.name, entry.key.name
                ),
            )),
        }
    }

    // Embedded constraints and indexes the target holds but the source does
    // not are scripted as drops; flag each one.
    if src.primary_key.is_none() {
        if let Some(pk) = &tgt.primary_key {
            warnings.push(Warning::new(
                Severity::Caution,
                &entry.key,
                format!("primary key {} on {} will be dropped", pk.name, entry.key.name),
            ));
        }
    }
    for tgt_idx in &tgt.indexes {
        if !src.indexes.iter().any(|i| i.name == tgt_idx.name) {
            warnings.push(Warning::new(
                Severity::Caution,
                &entry.key,
                format!("index {} on {} will be dropped", tgt_idx.name, entry.key.name),
            ));
        }
    }
    for tgt_fk in &tgt.foreign_keys {
        if !src.foreign_keys.iter().any(|f| f.name == tgt_fk.name) {
            warnings.push(Warning::new(
                Severity::Caution,
                &entry.key,
                format!("foreign key {} on {} will be dropped", tgt_fk.name, entry.key.name),
            ));
        }
    }

    // Clustered index or clustered PK change forces a physical rebuild.
    let clustered_changed = src
        .primary_key
        .as_ref()
        .zip(tgt.primary_key.as_ref())
        .map(|(a, b)| a.clustered != b.clustered || a.columns != b.columns)
        .unwrap_or(false);
    if clustered_changed {
        warnings.push(Warning::new(
            Severity::Caution,
            &entry.key,
            format!(
                "primary key change on {} rebuilds the clustered index; expect a heavy operation on large tables",
                entry.key.name
            ),
        ));
    }
    for src_idx in &src.indexes {
        if let Some(tgt_idx) = tgt.indexes.iter().find(|i| i.name == src_idx.name) {
            if src_idx != tgt_idx && (src_idx.clustered || tgt_idx.clustered) {
                warnings.push(Warning::new(
                    Severity::Caution,
                    &entry.key,
                    format!("clustered index {} on {} will be rebuilt", src_idx.name, entry.key.name),
                ));
            }
        }
    }
}

fn analyze_column_change(
    entry: &ObjectDiff,
    src: &Column,
    tgt: &Column,
    warnings: &mut Vec<Warning>,
) {
    let src_family = type_family(&src.data_type);
    let tgt_family = type_family(&tgt.data_type);
    if src_family != tgt_family {
        warnings.push(Warning::new(
            Severity::Destructive,
            &entry.key,
            format!(
                "column {} changes type family ({} -> {}); conversion may fail or lose data",
                src.name, tgt.data_type, src.data_type
            ),
        ));
    } else {
        let narrowed_length = effective_length(src.max_length) < effective_length(tgt.max_length);
        let narrowed_precision = match (src.precision, tgt.precision) {
            (Some(s), Some(t)) => s < t,
            _ => false,
        };
        if narrowed_length || narrowed_precision {
            warnings.push(Warning::new(
                Severity::Destructive,
                &entry.key,
                format!(
                    "column {} narrows from {} to {}; values may be truncated",
                    src.name,
                    tgt.type_display(),
                    src.type_display()
                ),
            ));
        }
    }

    if tgt.nullable && !src.nullable && src.default_expr.is_none() {
        warnings.push(Warning::new(
            Severity::Destructive,
            &entry.key,
            format!(
                "column {} becomes NOT NULL without a default; existing NULLs will fail the change",
                src.name
            ),
        ));
    }

    if src.identity != tgt.identity || src.computed != tgt.computed {
        warnings.push(Warning::new(
            Severity::Caution,
            &entry.key,
            format!(
                "column {} changes identity/computed shape and must be dropped and re-added",
                src.name
            ),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare;
    use crate::model::{DatabaseObject, MetadataSnapshot, QualifiedName};
    use crate::options::ComparisonOptions;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("varchar", TypeFamily::Character)]
    #[case("INT", TypeFamily::ExactNumeric)]
    #[case("float", TypeFamily::ApproximateNumeric)]
    #[case("datetime2", TypeFamily::DateTime)]
    #[case("geography", TypeFamily::Other)]
    fn families(#[case] data_type: &str, #[case] family: TypeFamily) {
        assert_eq!(type_family(data_type), family);
    }

    fn table_pair(src_cols: Vec<Column>, tgt_cols: Vec<Column>) -> ComparisonResult {
        let name = QualifiedName::parse("dbo.T");
        let source: MetadataSnapshot = vec![DatabaseObject::table(
            name.clone(),
            TableDef { columns: src_cols, ..Default::default() },
        )]
        .into_iter()
        .collect();
        let target: MetadataSnapshot = vec![DatabaseObject::table(
            name,
            TableDef { columns: tgt_cols, ..Default::default() },
        )]
        .into_iter()
        .collect();
        compare(&source, &target, &ComparisonOptions::default()).unwrap()
    }

    #[test]
    fn narrowing_and_drop_are_destructive() {
        let result = table_pair(
            vec![Column::new("Name", "varchar").max_length(50).nullable(true)],
            vec![
                Column::new("Name", "varchar").max_length(100).nullable(true),
                Column::new("Phone", "varchar").max_length(20).nullable(true),
            ],
        );
        let warnings = analyze(&result, &result.changed_keys());
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|w| w.severity == Severity::Destructive));
    }

    #[test]
    fn not_null_without_default_is_flagged() {
        let result = table_pair(
            vec![Column::new("Email", "varchar").max_length(100)],
            vec![Column::new("Email", "varchar").max_length(100).nullable(true)],
        );
        let warnings = analyze(&result, &result.changed_keys());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("NOT NULL"));
    }

    #[test]
    fn dropped_embedded_constraints_are_flagged() {
        use crate::model::{TableForeignKey, TableIndex, TableKey};

        let name = QualifiedName::parse("dbo.Orders");
        let columns = vec![Column::new("ID", "int"), Column::new("CustomerID", "int")];
        let source: MetadataSnapshot = vec![DatabaseObject::table(
            name.clone(),
            TableDef { columns: columns.clone(), ..Default::default() },
        )]
        .into_iter()
        .collect();
        let target: MetadataSnapshot = vec![DatabaseObject::table(
            name,
            TableDef {
                columns,
                primary_key: Some(TableKey {
                    name: "PK_Orders".into(),
                    columns: vec!["ID".into()],
                    clustered: true,
                }),
                indexes: vec![TableIndex {
                    name: "IX_Orders_CustomerID".into(),
                    columns: vec!["CustomerID".into()],
                    included_columns: vec![],
                    unique: false,
                    clustered: false,
                    filter: None,
                }],
                foreign_keys: vec![TableForeignKey {
                    name: "FK_Orders_Customers".into(),
                    columns: vec!["CustomerID".into()],
                    referenced_table: QualifiedName::parse("dbo.Customers"),
                    referenced_columns: vec!["ID".into()],
                    on_delete: None,
                    on_update: None,
                }],
            },
        )]
        .into_iter()
        .collect();

        let result = compare(&source, &target, &ComparisonOptions::default()).unwrap();
        let warnings = analyze(&result, &result.changed_keys());

        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().all(|w| w.severity == Severity::Caution));
        assert!(warnings.iter().any(|w| w.message.contains("PK_Orders")));
        assert!(warnings.iter().any(|w| w.message.contains("IX_Orders_CustomerID")));
        assert!(warnings.iter().any(|w| w.message.contains("FK_Orders_Customers")));
    }

    #[test]
    fn widening_produces_no_warning() {
        let result = table_pair(
            vec![Column::new("Name", "varchar").max_length(200).nullable(true)],
            vec![Column::new("Name", "varchar").max_length(50).nullable(true)],
        );
        assert!(analyze(&result, &result.changed_keys()).is_empty());
    }
}
