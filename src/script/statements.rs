//! T-SQL statement builders
//!
//! Every builder returns a complete, guarded statement block. Create/drop
//! statements carry `OBJECT_ID` existence checks so generated scripts stay
//! idempotent against partial prior application.

use crate::model::{
    Column, IndexDef, KeyDef, ObjectKind, QualifiedName, SequenceDef, TableDef, TableForeignKey,
    TableIndex, TableKey, TypeDef,
};

pub fn bracket(name: &str) -> String {
    format!("[{}]", name)
}

pub fn qualify(name: &QualifiedName) -> String {
    if name.schema.is_empty() {
        bracket(&name.name)
    } else {
        format!("[{}].[{}]", name.schema, name.name)
    }
}

/// `OBJECT_ID` type code used in existence guards.
pub fn object_type_code(kind: ObjectKind) -> Option<&'static str> {
    match kind {
        ObjectKind::Table => Some("U"),
        ObjectKind::View => Some("V"),
        ObjectKind::Procedure => Some("P"),
        ObjectKind::Function => Some("FN"),
        ObjectKind::Trigger => Some("TR"),
        ObjectKind::Synonym => Some("SN"),
        ObjectKind::Sequence => Some("SO"),
        _ => None,
    }
}

/// Complete column definition: type, collation, nullability, identity,
/// default. Computed columns render as `AS expr [PERSISTED]`.
pub fn column_definition(col: &Column) -> String {
    if let Some(computed) = &col.computed {
        let persisted = if computed.persisted { " PERSISTED" } else { "" };
        return format!("{} AS {}{}", bracket(&col.name), computed.expression, persisted);
    }

    let mut parts = vec![bracket(&col.name), col.type_display()];
    if let Some(collation) = &col.collation {
        parts.push(format!("COLLATE {}", collation));
    }
    parts.push(if col.nullable { "NULL" } else { "NOT NULL" }.to_string());
    if let Some(identity) = &col.identity {
        parts.push(format!("IDENTITY({},{})", identity.seed, identity.increment));
    }
    if let Some(default_expr) = &col.default_expr {
        parts.push(format!("DEFAULT {}", default_expr));
    }
    parts.join(" ")
}

pub fn create_table(name: &QualifiedName, def: &TableDef) -> String {
    let table = qualify(name);
    if def.columns.is_empty() {
        return format!("-- Cannot script CREATE TABLE {} (no column metadata)", table);
    }
    let column_defs: Vec<String> = def
        .columns
        .iter()
        .map(|col| format!("    {}", column_definition(col)))
        .collect();
    format!(
        "IF OBJECT_ID('{0}', 'U') IS NULL\nBEGIN\nCREATE TABLE {1} (\n{2}\n);\nEND\nGO",
        name, table, column_defs.join(",\n")
    )
}

pub fn drop_table(name: &QualifiedName) -> String {
    format!(
        "IF OBJECT_ID('{0}', 'U') IS NOT NULL DROP TABLE {1};\nGO",
        name,
        qualify(name)
    )
}

pub fn add_column(table: &QualifiedName, col: &Column) -> String {
    format!(
        "IF COL_LENGTH('{0}', '{1}') IS NULL\n    ALTER TABLE {2} ADD {3};",
        table,
        col.name,
        qualify(table),
        column_definition(col)
    )
}

pub fn drop_column(table: &QualifiedName, column: &str) -> String {
    format!(
        "IF COL_LENGTH('{0}', '{1}') IS NOT NULL\n    ALTER TABLE {2} DROP COLUMN {3};",
        table,
        column,
        qualify(table),
        bracket(column)
    )
}

pub fn alter_column(table: &QualifiedName, col: &Column) -> String {
    let nullability = if col.nullable { "NULL" } else { "NOT NULL" };
    let collate = col
        .collation
        .as_ref()
        .map(|c| format!(" COLLATE {}", c))
        .unwrap_or_default();
    format!(
        "ALTER TABLE {} ALTER COLUMN {} {}{} {};",
        qualify(table),
        bracket(&col.name),
        col.type_display(),
        collate,
        nullability
    )
}

pub fn add_primary_key(table: &QualifiedName, pk: &TableKey) -> String {
    let columns: Vec<String> = pk.columns.iter().map(|c| bracket(c)).collect();
    let clustered = if pk.clustered { "CLUSTERED" } else { "NONCLUSTERED" };
    format!(
        "IF OBJECT_ID('{0}.{1}') IS NULL\n    ALTER TABLE {2} ADD CONSTRAINT {3} PRIMARY KEY {4} ({5});",
        table.schema,
        pk.name,
        qualify(table),
        bracket(&pk.name),
        clustered,
        columns.join(", ")
    )
}

pub fn add_standalone_key(
    name: &QualifiedName,
    def: &KeyDef,
    kind: ObjectKind,
) -> String {
    let columns: Vec<String> = def.columns.iter().map(|c| bracket(c)).collect();
    let constraint = match kind {
        ObjectKind::PrimaryKey => "PRIMARY KEY",
        _ => "UNIQUE",
    };
    format!(
        "IF OBJECT_ID('{0}.{1}') IS NULL\n    ALTER TABLE {2} ADD CONSTRAINT {3} {4} ({5});",
        def.table.schema,
        name.name,
        qualify(&def.table),
        bracket(&name.name),
        constraint,
        columns.join(", ")
    )
}

pub fn drop_constraint(table: &QualifiedName, constraint: &str) -> String {
    format!(
        "IF OBJECT_ID('{0}.{1}') IS NOT NULL\n    ALTER TABLE {2} DROP CONSTRAINT {3};",
        table.schema, constraint, qualify(table), bracket(constraint)
    )
}

pub fn create_index(table: &QualifiedName, idx: &TableIndex) -> String {
    let columns: Vec<String> = idx.columns.iter().map(|c| bracket(c)).collect();
    let unique = if idx.unique { "UNIQUE " } else { "" };
    let clustered = if idx.clustered { "CLUSTERED" } else { "NONCLUSTERED" };
    let include = if idx.included_columns.is_empty() {
        String::new()
    } else {
        let included: Vec<String> = idx.included_columns.iter().map(|c| bracket(c)).collect();
        format!(" INCLUDE ({})", included.join(", "))
    };
    let filter = idx
        .filter
        .as_ref()
        .map(|f| format!(" WHERE {}", f))
        .unwrap_or_default();
    format!(
        "IF NOT EXISTS (SELECT 1 FROM sys.indexes WHERE name = '{0}' AND object_id = OBJECT_ID('{1}'))\n    CREATE {2}{3} INDEX {4} ON {5} ({6}){7}{8};",
        idx.name,
        table,
        unique,
        clustered,
        bracket(&idx.name),
        qualify(table),
        columns.join(", "),
        include,
        filter
    )
}

pub fn create_standalone_index(name: &QualifiedName, def: &IndexDef) -> String {
    create_index(
        &def.table,
        &TableIndex {
            name: name.name.clone(),
            columns: def.columns.clone(),
            included_columns: def.included_columns.clone(),
            unique: def.unique,
            clustered: def.clustered,
            filter: None,
        },
    )
}

pub fn drop_index(table: &QualifiedName, index: &str) -> String {
    format!(
        "IF EXISTS (SELECT 1 FROM sys.indexes WHERE name = '{0}' AND object_id = OBJECT_ID('{1}'))\n    DROP INDEX {2} ON {3};",
        index, table, bracket(index), qualify(table)
    )
}

pub fn add_foreign_key(table: &QualifiedName, fk: &TableForeignKey) -> String {
    let columns: Vec<String> = fk.columns.iter().map(|c| bracket(c)).collect();
    let referenced: Vec<String> = fk.referenced_columns.iter().map(|c| bracket(c)).collect();
    let on_delete = fk
        .on_delete
        .as_deref()
        .filter(|rule| *rule != "NO ACTION")
        .map(|rule| format!(" ON DELETE {}", rule))
        .unwrap_or_default();
    let on_update = fk
        .on_update
        .as_deref()
        .filter(|rule| *rule != "NO ACTION")
        .map(|rule| format!(" ON UPDATE {}", rule))
        .unwrap_or_default();
    format!(
        "IF OBJECT_ID('{0}.{1}') IS NULL\n    ALTER TABLE {2} ADD CONSTRAINT {3} FOREIGN KEY ({4}) REFERENCES {5} ({6}){7}{8};",
        table.schema,
        fk.name,
        qualify(table),
        bracket(&fk.name),
        columns.join(", "),
        qualify(&fk.referenced_table),
        referenced.join(", "),
        on_delete,
        on_update
    )
}

pub fn add_check_constraint(table: &QualifiedName, name: &str, expression: &str) -> String {
    format!(
        "IF OBJECT_ID('{0}.{1}') IS NULL\n    ALTER TABLE {2} ADD CONSTRAINT {3} CHECK {4};",
        table.schema, name, qualify(table), bracket(name), expression
    )
}

pub fn add_default_constraint(
    table: &QualifiedName,
    name: &str,
    column: &str,
    expression: &str,
) -> String {
    format!(
        "IF OBJECT_ID('{0}.{1}') IS NULL\n    ALTER TABLE {2} ADD CONSTRAINT {3} DEFAULT {4} FOR {5};",
        table.schema, name, qualify(table), bracket(name), expression, bracket(column)
    )
}

/// Programmable objects are re-created from the raw definition; for an
/// existing object the forward statement drops first so `CREATE` applies.
pub fn create_programmable(kind: ObjectKind, name: &QualifiedName, definition: &str) -> String {
    let mut block = String::new();
    if let Some(code) = object_type_code(kind) {
        block.push_str(&format!(
            "IF OBJECT_ID('{0}', '{1}') IS NOT NULL DROP {2} {3};\nGO\n",
            name,
            code,
            kind.label().to_uppercase(),
            qualify(name)
        ));
    }
    block.push_str(definition.trim_end());
    block.push_str("\nGO");
    block
}

pub fn drop_programmable(kind: ObjectKind, name: &QualifiedName) -> String {
    match object_type_code(kind) {
        Some(code) => format!(
            "IF OBJECT_ID('{0}', '{1}') IS NOT NULL DROP {2} {3};\nGO",
            name,
            code,
            kind.label().to_uppercase(),
            qualify(name)
        ),
        None => format!("-- Cannot script DROP for {} {}", kind, name),
    }
}

pub fn create_synonym(name: &QualifiedName, base_object: &QualifiedName) -> String {
    format!(
        "IF OBJECT_ID('{0}', 'SN') IS NULL CREATE SYNONYM {1} FOR {2};\nGO",
        name,
        qualify(name),
        qualify(base_object)
    )
}

pub fn drop_synonym(name: &QualifiedName) -> String {
    format!(
        "IF OBJECT_ID('{0}', 'SN') IS NOT NULL DROP SYNONYM {1};\nGO",
        name,
        qualify(name)
    )
}

pub fn create_sequence(name: &QualifiedName, def: &SequenceDef) -> String {
    let mut clauses = Vec::new();
    if let Some(data_type) = &def.data_type {
        clauses.push(format!(" AS {}", data_type));
    }
    if let Some(start) = def.start_value {
        clauses.push(format!(" START WITH {}", start));
    }
    if let Some(increment) = def.increment {
        clauses.push(format!(" INCREMENT BY {}", increment));
    }
    if let Some(min) = def.minimum_value {
        clauses.push(format!(" MINVALUE {}", min));
    }
    if let Some(max) = def.maximum_value {
        clauses.push(format!(" MAXVALUE {}", max));
    }
    if def.cycling {
        clauses.push(" CYCLE".to_string());
    }
    format!(
        "IF OBJECT_ID('{0}', 'SO') IS NULL CREATE SEQUENCE {1}{2};\nGO",
        name,
        qualify(name),
        clauses.join("")
    )
}

pub fn drop_sequence(name: &QualifiedName) -> String {
    format!(
        "IF OBJECT_ID('{0}', 'SO') IS NOT NULL DROP SEQUENCE {1};\nGO",
        name,
        qualify(name)
    )
}

pub fn create_type(name: &QualifiedName, def: &TypeDef) -> String {
    let base = match &def.base_type {
        Some(base) => base.clone(),
        None => return format!("-- Cannot script CREATE TYPE {} (no base type)", name),
    };
    let mut shaped = Column::new("t", &base);
    shaped.max_length = def.max_length;
    shaped.precision = def.precision;
    shaped.scale = def.scale;
    let nullability = if def.nullable { "NULL" } else { "NOT NULL" };
    format!(
        "IF TYPE_ID('{0}') IS NULL CREATE TYPE {1} FROM {2} {3};\nGO",
        name,
        qualify(name),
        shaped.type_display(),
        nullability
    )
}

pub fn drop_type(name: &QualifiedName) -> String {
    format!(
        "IF TYPE_ID('{0}') IS NOT NULL DROP TYPE {1};\nGO",
        name,
        qualify(name)
    )
}

pub fn create_schema(name: &QualifiedName, owner: Option<&str>) -> String {
    let authorization = owner
        .map(|o| format!(" AUTHORIZATION {}", bracket(o)))
        .unwrap_or_default();
    format!(
        "IF SCHEMA_ID('{0}') IS NULL EXEC('CREATE SCHEMA {1}{2}');\nGO",
        name.name,
        bracket(&name.name),
        authorization
    )
}

pub fn drop_schema(name: &QualifiedName) -> String {
    format!(
        "IF SCHEMA_ID('{0}') IS NOT NULL DROP SCHEMA {1};\nGO",
        name.name,
        bracket(&name.name)
    )
}
