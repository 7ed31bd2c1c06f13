//! Per-kind identity and equality rules
//!
//! Structural kinds compare their payloads field by field, consulting the
//! comparison options for each tolerance. Programmable kinds (views,
//! procedures, functions, triggers) and unknown kinds compare by normalized
//! definition text; no semantic SQL equivalence is attempted.

use indexmap::IndexMap;

use crate::compare::result::FieldDiff;
use crate::model::{
    Column, DatabaseObject, ObjectPayload, TableDef, TableForeignKey, TableIndex, TableKey,
};
use crate::options::ComparisonOptions;

/// Normalize definition text for comparison: trailing whitespace is always
/// trimmed per line; runs of whitespace collapse under `ignore_whitespace`.
pub fn normalize_definition(text: &str, options: &ComparisonOptions) -> String {
    if options.ignore_whitespace {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    } else {
        text.lines()
            .map(|line| line.trim_end())
            .collect::<Vec<_>>()
            .join("\n")
            .trim_end()
            .to_string()
    }
}

/// SQL Server auto-generated constraint names carry a `__` infix
/// (`PK__Orders__3214EC27...`).
fn is_system_named(name: &str) -> bool {
    name.contains("__")
}

fn norm_name(name: &str, options: &ComparisonOptions) -> String {
    if options.ignore_name_case {
        name.to_lowercase()
    } else {
        name.to_string()
    }
}

/// Compute the field-level deltas between two matched objects of the same
/// kind. An empty result means the objects are identical under the options.
pub fn diff_objects(
    source: &DatabaseObject,
    target: &DatabaseObject,
    options: &ComparisonOptions,
) -> Vec<FieldDiff> {
    let mut diffs = Vec::new();
    match (&source.payload, &target.payload) {
        (ObjectPayload::Table(src), ObjectPayload::Table(tgt)) => {
            // Scripts-folder imports carry no column metadata; fall back to
            // the raw definitions like the comparator does for programmables.
            if src.columns.is_empty()
                && tgt.columns.is_empty()
                && source.definition.is_some()
                && target.definition.is_some()
            {
                diff_definitions(source, target, options, &mut diffs);
            } else {
                diff_tables(src, tgt, options, &mut diffs);
            }
        }
        (ObjectPayload::Index(src), ObjectPayload::Index(tgt)) => {
            cmp(&mut diffs, "table", &src.table, &tgt.table);
            cmp_list(&mut diffs, "columns", &src.columns, &tgt.columns);
            cmp_list(
                &mut diffs,
                "included_columns",
                &src.included_columns,
                &tgt.included_columns,
            );
            cmp(&mut diffs, "unique", &src.unique, &tgt.unique);
            cmp(&mut diffs, "clustered", &src.clustered, &tgt.clustered);
        }
        (ObjectPayload::Key(src), ObjectPayload::Key(tgt)) => {
            cmp(&mut diffs, "table", &src.table, &tgt.table);
            cmp_list(&mut diffs, "columns", &src.columns, &tgt.columns);
            cmp(&mut diffs, "clustered", &src.clustered, &tgt.clustered);
        }
        (ObjectPayload::ForeignKey(src), ObjectPayload::ForeignKey(tgt)) => {
            cmp(&mut diffs, "table", &src.table, &tgt.table);
            cmp_list(&mut diffs, "columns", &src.columns, &tgt.columns);
            cmp(
                &mut diffs,
                "referenced_table",
                &src.referenced_table,
                &tgt.referenced_table,
            );
            cmp_list(
                &mut diffs,
                "referenced_columns",
                &src.referenced_columns,
                &tgt.referenced_columns,
            );
            cmp_opt(&mut diffs, "on_delete", &src.on_delete, &tgt.on_delete);
            cmp_opt(&mut diffs, "on_update", &src.on_update, &tgt.on_update);
        }
        (ObjectPayload::Check(src), ObjectPayload::Check(tgt)) => {
            cmp(&mut diffs, "table", &src.table, &tgt.table);
            let src_expr = normalize_definition(&src.expression, options);
            let tgt_expr = normalize_definition(&tgt.expression, options);
            if src_expr != tgt_expr {
                diffs.push(FieldDiff::new(
                    "expression",
                    Some(src.expression.clone()),
                    Some(tgt.expression.clone()),
                ));
            }
        }
        (ObjectPayload::Default(src), ObjectPayload::Default(tgt)) => {
            cmp(&mut diffs, "table", &src.table, &tgt.table);
            cmp(&mut diffs, "column", &src.column, &tgt.column);
            let src_expr = normalize_definition(&src.expression, options);
            let tgt_expr = normalize_definition(&tgt.expression, options);
            if src_expr != tgt_expr {
                diffs.push(FieldDiff::new(
                    "expression",
                    Some(src.expression.clone()),
                    Some(tgt.expression.clone()),
                ));
            }
        }
        (ObjectPayload::Synonym(src), ObjectPayload::Synonym(tgt)) => {
            cmp(&mut diffs, "base_object", &src.base_object, &tgt.base_object);
        }
        (ObjectPayload::Sequence(src), ObjectPayload::Sequence(tgt)) => {
            cmp_opt(&mut diffs, "data_type", &src.data_type, &tgt.data_type);
            cmp_opt(&mut diffs, "start_value", &src.start_value, &tgt.start_value);
            cmp_opt(&mut diffs, "increment", &src.increment, &tgt.increment);
            cmp_opt(
                &mut diffs,
                "minimum_value",
                &src.minimum_value,
                &tgt.minimum_value,
            );
            cmp_opt(
                &mut diffs,
                "maximum_value",
                &src.maximum_value,
                &tgt.maximum_value,
            );
            cmp(&mut diffs, "cycling", &src.cycling, &tgt.cycling);
        }
        (ObjectPayload::ScalarType(src), ObjectPayload::ScalarType(tgt)) => {
            cmp_opt(&mut diffs, "base_type", &src.base_type, &tgt.base_type);
            cmp_opt(&mut diffs, "max_length", &src.max_length, &tgt.max_length);
            cmp_opt(&mut diffs, "precision", &src.precision, &tgt.precision);
            cmp_opt(&mut diffs, "scale", &src.scale, &tgt.scale);
            cmp(&mut diffs, "nullable", &src.nullable, &tgt.nullable);
        }
        (ObjectPayload::Principal(src), ObjectPayload::Principal(tgt)) => {
            cmp_opt(&mut diffs, "owner", &src.owner, &tgt.owner);
            cmp_opt(
                &mut diffs,
                "default_schema",
                &src.default_schema,
                &tgt.default_schema,
            );
        }
        (ObjectPayload::Property(src), ObjectPayload::Property(tgt)) => {
            cmp(&mut diffs, "value", &src.value, &tgt.value);
        }
        (ObjectPayload::Definition, ObjectPayload::Definition) => {
            diff_definitions(source, target, options, &mut diffs);
        }
        // Payload shapes are validated at the compare boundary; a residual
        // mismatch degrades to textual comparison rather than failing.
        _ => diff_definitions(source, target, options, &mut diffs),
    }
    diffs
}

fn diff_definitions(
    source: &DatabaseObject,
    target: &DatabaseObject,
    options: &ComparisonOptions,
    diffs: &mut Vec<FieldDiff>,
) {
    let src = source.definition.as_deref().unwrap_or("");
    let tgt = target.definition.as_deref().unwrap_or("");
    if normalize_definition(src, options) != normalize_definition(tgt, options) {
        diffs.push(FieldDiff::new(
            "definition",
            source.definition.clone(),
            target.definition.clone(),
        ));
    }
}

/// Column-level and embedded-constraint diffs for a table pair. Each column
/// attribute diffs independently so the script generator can emit targeted
/// `ALTER` clauses.
fn diff_tables(
    src: &TableDef,
    tgt: &TableDef,
    options: &ComparisonOptions,
    diffs: &mut Vec<FieldDiff>,
) {
    let tgt_cols: IndexMap<String, &Column> = tgt
        .columns
        .iter()
        .map(|col| (norm_name(&col.name, options), col))
        .collect();
    let src_names: Vec<String> = src
        .columns
        .iter()
        .map(|col| norm_name(&col.name, options))
        .collect();

    for (col, norm) in src.columns.iter().zip(&src_names) {
        match tgt_cols.get(norm) {
            Some(tgt_col) => diff_columns(col, tgt_col, options, diffs),
            None => diffs.push(FieldDiff::new(
                format!("columns.{}", col.name),
                Some(col.signature()),
                None,
            )),
        }
    }
    for col in &tgt.columns {
        if !src_names.contains(&norm_name(&col.name, options)) {
            diffs.push(FieldDiff::new(
                format!("columns.{}", col.name),
                None,
                Some(col.signature()),
            ));
        }
    }

    diff_primary_keys(&src.primary_key, &tgt.primary_key, options, diffs);
    diff_indexes(&src.indexes, &tgt.indexes, options, diffs);
    diff_foreign_keys(&src.foreign_keys, &tgt.foreign_keys, options, diffs);
}

fn diff_columns(
    src: &Column,
    tgt: &Column,
    options: &ComparisonOptions,
    diffs: &mut Vec<FieldDiff>,
) {
    let path = |field: &str| format!("columns.{}.{}", src.name, field);

    if src.data_type.to_lowercase() != tgt.data_type.to_lowercase() {
        diffs.push(FieldDiff::new(
            path("data_type"),
            Some(src.data_type.clone()),
            Some(tgt.data_type.clone()),
        ));
    }
    cmp_opt(diffs, &path("max_length"), &src.max_length, &tgt.max_length);
    cmp_opt(diffs, &path("precision"), &src.precision, &tgt.precision);
    cmp_opt(diffs, &path("scale"), &src.scale, &tgt.scale);
    cmp(diffs, &path("nullable"), &src.nullable, &tgt.nullable);

    let src_default = src
        .default_expr
        .as_ref()
        .map(|e| normalize_definition(e, options));
    let tgt_default = tgt
        .default_expr
        .as_ref()
        .map(|e| normalize_definition(e, options));
    if src_default != tgt_default {
        diffs.push(FieldDiff::new(
            path("default_expr"),
            src.default_expr.clone(),
            tgt.default_expr.clone(),
        ));
    }

    cmp_opt(diffs, &path("collation"), &src.collation, &tgt.collation);
    if src.identity != tgt.identity {
        diffs.push(FieldDiff::new(
            path("identity"),
            src.identity.as_ref().map(|i| format!("IDENTITY({},{})", i.seed, i.increment)),
            tgt.identity.as_ref().map(|i| format!("IDENTITY({},{})", i.seed, i.increment)),
        ));
    }
    if src.computed != tgt.computed {
        diffs.push(FieldDiff::new(
            path("computed"),
            src.computed.as_ref().map(|c| c.expression.clone()),
            tgt.computed.as_ref().map(|c| c.expression.clone()),
        ));
    }
}

fn diff_primary_keys(
    src: &Option<TableKey>,
    tgt: &Option<TableKey>,
    options: &ComparisonOptions,
    diffs: &mut Vec<FieldDiff>,
) {
    match (src, tgt) {
        (Some(src), Some(tgt)) => {
            let names_differ = norm_name(&src.name, options) != norm_name(&tgt.name, options);
            let both_system = is_system_named(&src.name) && is_system_named(&tgt.name);
            if names_differ && !(options.ignore_system_named_constraints && both_system) {
                diffs.push(FieldDiff::new(
                    "primary_key.name",
                    Some(src.name.clone()),
                    Some(tgt.name.clone()),
                ));
            }
            cmp_list(diffs, "primary_key.columns", &src.columns, &tgt.columns);
            cmp(diffs, "primary_key.clustered", &src.clustered, &tgt.clustered);
        }
        (Some(src), None) => diffs.push(FieldDiff::new(
            "primary_key",
            Some(format!("({})", src.columns.join(", "))),
            None,
        )),
        (None, Some(tgt)) => diffs.push(FieldDiff::new(
            "primary_key",
            None,
            Some(format!("({})", tgt.columns.join(", "))),
        )),
        (None, None) => {}
    }
}

fn diff_indexes(
    src: &[TableIndex],
    tgt: &[TableIndex],
    options: &ComparisonOptions,
    diffs: &mut Vec<FieldDiff>,
) {
    let tgt_by_name: IndexMap<String, &TableIndex> = tgt
        .iter()
        .map(|idx| (norm_name(&idx.name, options), idx))
        .collect();
    for idx in src {
        let path = format!("indexes.{}", idx.name);
        match tgt_by_name.get(&norm_name(&idx.name, options)) {
            Some(other) => {
                cmp_list(diffs, &format!("{}.columns", path), &idx.columns, &other.columns);
                cmp_list(
                    diffs,
                    &format!("{}.included_columns", path),
                    &idx.included_columns,
                    &other.included_columns,
                );
                cmp(diffs, &format!("{}.unique", path), &idx.unique, &other.unique);
                cmp(
                    diffs,
                    &format!("{}.clustered", path),
                    &idx.clustered,
                    &other.clustered,
                );
                cmp_opt(diffs, &format!("{}.filter", path), &idx.filter, &other.filter);
            }
            None => diffs.push(FieldDiff::new(
                path,
                Some(format!("({})", idx.columns.join(", "))),
                None,
            )),
        }
    }
    let src_names: Vec<String> = src.iter().map(|i| norm_name(&i.name, options)).collect();
    for idx in tgt {
        if !src_names.contains(&norm_name(&idx.name, options)) {
            diffs.push(FieldDiff::new(
                format!("indexes.{}", idx.name),
                None,
                Some(format!("({})", idx.columns.join(", "))),
            ));
        }
    }
}

fn diff_foreign_keys(
    src: &[TableForeignKey],
    tgt: &[TableForeignKey],
    options: &ComparisonOptions,
    diffs: &mut Vec<FieldDiff>,
) {
    let tgt_by_name: IndexMap<String, &TableForeignKey> = tgt
        .iter()
        .map(|fk| (norm_name(&fk.name, options), fk))
        .collect();
    for fk in src {
        let path = format!("foreign_keys.{}", fk.name);
        match tgt_by_name.get(&norm_name(&fk.name, options)) {
            Some(other) => {
                cmp_list(diffs, &format!("{}.columns", path), &fk.columns, &other.columns);
                cmp(
                    diffs,
                    &format!("{}.referenced_table", path),
                    &fk.referenced_table,
                    &other.referenced_table,
                );
                cmp_list(
                    diffs,
                    &format!("{}.referenced_columns", path),
                    &fk.referenced_columns,
                    &other.referenced_columns,
                );
                cmp_opt(diffs, &format!("{}.on_delete", path), &fk.on_delete, &other.on_delete);
                cmp_opt(diffs, &format!("{}.on_update", path), &fk.on_update, &other.on_update);
            }
            None => diffs.push(FieldDiff::new(
                path,
                Some(format!("-> {}", fk.referenced_table)),
                None,
            )),
        }
    }
    let src_names: Vec<String> = src.iter().map(|f| norm_name(&f.name, options)).collect();
    for fk in tgt {
        if !src_names.contains(&norm_name(&fk.name, options)) {
            diffs.push(FieldDiff::new(
                format!("foreign_keys.{}", fk.name),
                None,
                Some(format!("-> {}", fk.referenced_table)),
            ));
        }
    }
}

fn cmp<T: PartialEq + std::fmt::Display>(
    diffs: &mut Vec<FieldDiff>,
    path: &str,
    src: &T,
    tgt: &T,
) {
    if src != tgt {
        diffs.push(FieldDiff::new(path, Some(src.to_string()), Some(tgt.to_string())));
    }
}

fn cmp_opt<T: PartialEq + std::fmt::Display>(
    diffs: &mut Vec<FieldDiff>,
    path: &str,
    src: &Option<T>,
    tgt: &Option<T>,
) {
    if src != tgt {
        diffs.push(FieldDiff::new(
            path,
            src.as_ref().map(|v| v.to_string()),
            tgt.as_ref().map(|v| v.to_string()),
        ));
    }
}

fn cmp_list(diffs: &mut Vec<FieldDiff>, path: &str, src: &[String], tgt: &[String]) {
    if src != tgt {
        diffs.push(FieldDiff::new(
            path,
            Some(src.join(", ")),
            Some(tgt.join(", ")),
        ));
    }
}
