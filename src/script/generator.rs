//! Deployment script generator
//!
//! Consumes a comparison result plus a resolved object order and emits a
//! phased deployment script together with its inverse rollback script. Both
//! sides of every operation are synthesized from the same object difference,
//! so the rollback is always the structural inverse that the snapshots can
//! express.

use std::fmt;
use tracing::info;

use crate::compare::{ComparisonResult, DiffStatus, ObjectDiff};
use crate::error::{Error, Result};
use crate::graph::ResolvedOrder;
use crate::model::{
    Column, DatabaseObject, ObjectKey, ObjectKind, ObjectPayload, QualifiedName, TableDef,
};
use crate::options::DeploymentOptions;
use crate::script::statements as sql;
use crate::script::warnings::{self, Severity, Warning};

/// Fixed stage in script assembly. Phases are emitted in declaration order;
/// operations keep their dependency order within a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Drop,
    Tables,
    Constraints,
    Programmability,
    Misc,
}

impl Phase {
    fn banner(self) -> &'static str {
        match self {
            Phase::Drop => "PHASE 1: DROP EXTRA OBJECTS",
            Phase::Tables => "PHASE 2: TABLES AND COLUMNS",
            Phase::Constraints => "PHASE 3: CONSTRAINTS AND INDEXES",
            Phase::Programmability => "PHASE 4: PROGRAMMABILITY OBJECTS",
            Phase::Misc => "PHASE 5: MISCELLANEOUS OBJECTS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Alter,
    Drop,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Action::Create => "CREATE",
            Action::Alter => "ALTER",
            Action::Drop => "DROP",
        };
        f.write_str(text)
    }
}

/// One deployment step with its paired rollback.
#[derive(Debug, Clone)]
pub struct Operation {
    pub key: ObjectKey,
    pub action: Action,
    pub phase: Phase,
    pub sql_text: String,
    pub rollback_sql_text: String,
}

/// Output of one generation run.
#[derive(Debug, Clone)]
pub struct GeneratedScript {
    pub script: String,
    pub rollback_script: String,
    pub warnings: Vec<Warning>,
    pub operations: Vec<Operation>,
}

/// Assembles deployment and rollback scripts from a resolved order.
pub struct ScriptGenerator<'a> {
    result: &'a ComparisonResult,
    options: &'a DeploymentOptions,
}

impl<'a> ScriptGenerator<'a> {
    pub fn new(result: &'a ComparisonResult, options: &'a DeploymentOptions) -> Self {
        Self { result, options }
    }

    /// Generate both scripts. Refuses when any fatal warning is present;
    /// dependency cycles never reach this point because the resolver fails
    /// first, returning the cycle membership.
    pub fn generate(&self, order: &ResolvedOrder) -> Result<GeneratedScript> {
        let selected: Vec<ObjectKey> =
            order.create_order.iter().map(|entry| entry.key.clone()).collect();
        let warnings = warnings::analyze(self.result, &selected);
        if let Some(fatal) = warnings.iter().find(|w| w.severity == Severity::Fatal) {
            return Err(Error::ScriptError(fatal.message.clone()));
        }

        let mut operations = Vec::new();
        // Drop-phase work derives from reverse dependency order.
        for entry in order.drop_order() {
            if let Some(diff) = self.result.get(&entry.key) {
                self.drop_operations(diff, &mut operations);
            }
        }
        for entry in &order.create_order {
            if let Some(diff) = self.result.get(&entry.key) {
                self.forward_operations(diff, &mut operations);
            }
        }
        // Stable bucket sort: phase order first, dependency order within.
        operations.sort_by_key(|op| op.phase);

        info!(
            operations = operations.len(),
            warnings = warnings.len(),
            "assembled deployment plan"
        );

        let script = self.render(&operations, false);
        let rollback_script = if self.options.include_rollback {
            self.render(&operations, true)
        } else {
            String::new()
        };

        Ok(GeneratedScript {
            script,
            rollback_script,
            warnings,
            operations,
        })
    }

    /// Operations for objects that exist only in target: drop forward,
    /// re-create from the target snapshot on rollback.
    fn drop_operations(&self, diff: &ObjectDiff, operations: &mut Vec<Operation>) {
        if diff.status != DiffStatus::MissingInSource {
            return;
        }
        let target = match diff.target.as_ref() {
            Some(target) => target,
            None => return,
        };
        operations.push(Operation {
            key: diff.key.clone(),
            action: Action::Drop,
            phase: Phase::Drop,
            sql_text: drop_sql(target),
            rollback_sql_text: create_sql(target),
        });
    }

    fn forward_operations(&self, diff: &ObjectDiff, operations: &mut Vec<Operation>) {
        match diff.status {
            DiffStatus::MissingInTarget => {
                if let Some(source) = diff.source.as_ref() {
                    self.create_operations(diff, source, operations);
                }
            }
            DiffStatus::Different => {
                if let (Some(source), Some(target)) = (diff.source.as_ref(), diff.target.as_ref())
                {
                    self.alter_operations(diff, source, target, operations);
                }
            }
            _ => {}
        }
    }

    fn create_operations(
        &self,
        diff: &ObjectDiff,
        source: &DatabaseObject,
        operations: &mut Vec<Operation>,
    ) {
        match &source.payload {
            ObjectPayload::Table(def) => {
                operations.push(Operation {
                    key: diff.key.clone(),
                    action: Action::Create,
                    phase: Phase::Tables,
                    sql_text: sql::create_table(&source.name, def),
                    rollback_sql_text: sql::drop_table(&source.name),
                });
                self.embedded_constraint_creates(&diff.key, &source.name, def, operations);
            }
            _ => operations.push(Operation {
                key: diff.key.clone(),
                action: Action::Create,
                phase: phase_for(diff.key.kind),
                sql_text: create_sql(source),
                rollback_sql_text: drop_sql(source),
            }),
        }
    }

    /// A created table brings its keys, indexes, and foreign keys along in
    /// the constraint phase.
    fn embedded_constraint_creates(
        &self,
        key: &ObjectKey,
        table: &QualifiedName,
        def: &TableDef,
        operations: &mut Vec<Operation>,
    ) {
        if let Some(pk) = &def.primary_key {
            operations.push(Operation {
                key: key.clone(),
                action: Action::Create,
                phase: Phase::Constraints,
                sql_text: sql::add_primary_key(table, pk),
                rollback_sql_text: sql::drop_constraint(table, &pk.name),
            });
        }
        for idx in &def.indexes {
            operations.push(Operation {
                key: key.clone(),
                action: Action::Create,
                phase: Phase::Constraints,
                sql_text: sql::create_index(table, idx),
                rollback_sql_text: sql::drop_index(table, &idx.name),
            });
        }
        for fk in &def.foreign_keys {
            operations.push(Operation {
                key: key.clone(),
                action: Action::Create,
                phase: Phase::Constraints,
                sql_text: sql::add_foreign_key(table, fk),
                rollback_sql_text: sql::drop_constraint(table, &fk.name),
            });
        }
    }

    fn alter_operations(
        &self,
        diff: &ObjectDiff,
        source: &DatabaseObject,
        target: &DatabaseObject,
        operations: &mut Vec<Operation>,
    ) {
        match (&source.payload, &target.payload) {
            (ObjectPayload::Table(src), ObjectPayload::Table(tgt)) => {
                self.table_alter_operations(diff, &source.name, src, tgt, operations);
            }
            _ if diff.key.kind.is_programmable() || diff.key.kind == ObjectKind::Other => {
                operations.push(Operation {
                    key: diff.key.clone(),
                    action: Action::Alter,
                    phase: phase_for(diff.key.kind),
                    sql_text: create_sql(source),
                    rollback_sql_text: create_sql(target),
                });
            }
            // Structural kinds re-create: drop target shape, create source
            // shape; rollback is the mirror image.
            _ => {
                operations.push(Operation {
                    key: diff.key.clone(),
                    action: Action::Alter,
                    phase: phase_for(diff.key.kind),
                    sql_text: format!("{}\n{}", drop_sql(target), create_sql(source)),
                    rollback_sql_text: format!("{}\n{}", drop_sql(source), create_sql(target)),
                });
            }
        }
    }

    /// Targeted per-column ALTER statements; never a full table rewrite
    /// unless an identity/computed change forces drop-and-re-add.
    fn table_alter_operations(
        &self,
        diff: &ObjectDiff,
        table: &QualifiedName,
        src: &TableDef,
        tgt: &TableDef,
        operations: &mut Vec<Operation>,
    ) {
        for col in &src.columns {
            match tgt.column(&col.name) {
                None => operations.push(Operation {
                    key: diff.key.clone(),
                    action: Action::Alter,
                    phase: Phase::Tables,
                    sql_text: sql::add_column(table, col),
                    rollback_sql_text: sql::drop_column(table, &col.name),
                }),
                Some(tgt_col) if tgt_col != col => {
                    operations.push(self.column_change_operation(diff, table, col, tgt_col));
                }
                Some(_) => {}
            }
        }
        for tgt_col in &tgt.columns {
            if src.column(&tgt_col.name).is_none() {
                operations.push(Operation {
                    key: diff.key.clone(),
                    action: Action::Alter,
                    phase: Phase::Tables,
                    sql_text: sql::drop_column(table, &tgt_col.name),
                    rollback_sql_text: sql::add_column(table, tgt_col),
                });
            }
        }

        if src.primary_key != tgt.primary_key {
            let mut forward = Vec::new();
            let mut rollback = Vec::new();
            if let Some(pk) = &tgt.primary_key {
                forward.push(sql::drop_constraint(table, &pk.name));
                rollback.push(sql::add_primary_key(table, pk));
            }
            if let Some(pk) = &src.primary_key {
                forward.push(sql::add_primary_key(table, pk));
                rollback.insert(0, sql::drop_constraint(table, &pk.name));
            }
            operations.push(Operation {
                key: diff.key.clone(),
                action: Action::Alter,
                phase: Phase::Constraints,
                sql_text: forward.join("\n"),
                rollback_sql_text: rollback.join("\n"),
            });
        }

        for idx in &src.indexes {
            match tgt.indexes.iter().find(|i| i.name == idx.name) {
                None => operations.push(Operation {
                    key: diff.key.clone(),
                    action: Action::Alter,
                    phase: Phase::Constraints,
                    sql_text: sql::create_index(table, idx),
                    rollback_sql_text: sql::drop_index(table, &idx.name),
                }),
                Some(tgt_idx) if tgt_idx != idx => operations.push(Operation {
                    key: diff.key.clone(),
                    action: Action::Alter,
                    phase: Phase::Constraints,
                    sql_text: format!(
                        "{}\n{}",
                        sql::drop_index(table, &idx.name),
                        sql::create_index(table, idx)
                    ),
                    rollback_sql_text: format!(
                        "{}\n{}",
                        sql::drop_index(table, &idx.name),
                        sql::create_index(table, tgt_idx)
                    ),
                }),
                Some(_) => {}
            }
        }
        for tgt_idx in &tgt.indexes {
            if !src.indexes.iter().any(|i| i.name == tgt_idx.name) {
                operations.push(Operation {
                    key: diff.key.clone(),
                    action: Action::Alter,
                    phase: Phase::Drop,
                    sql_text: sql::drop_index(table, &tgt_idx.name),
                    rollback_sql_text: sql::create_index(table, tgt_idx),
                });
            }
        }

        for fk in &src.foreign_keys {
            match tgt.foreign_keys.iter().find(|f| f.name == fk.name) {
                None => operations.push(Operation {
                    key: diff.key.clone(),
                    action: Action::Alter,
                    phase: Phase::Constraints,
                    sql_text: sql::add_foreign_key(table, fk),
                    rollback_sql_text: sql::drop_constraint(table, &fk.name),
                }),
                Some(tgt_fk) if tgt_fk != fk => operations.push(Operation {
                    key: diff.key.clone(),
                    action: Action::Alter,
                    phase: Phase::Constraints,
                    sql_text: format!(
                        "{}\n{}",
                        sql::drop_constraint(table, &fk.name),
                        sql::add_foreign_key(table, fk)
                    ),
                    rollback_sql_text: format!(
                        "{}\n{}",
                        sql::drop_constraint(table, &fk.name),
                        sql::add_foreign_key(table, tgt_fk)
                    ),
                }),
                Some(_) => {}
            }
        }
        // Foreign keys that only the target holds go first, in the drop
        // phase, so nothing references rows the later phases rework.
        for tgt_fk in &tgt.foreign_keys {
            if !src.foreign_keys.iter().any(|f| f.name == tgt_fk.name) {
                operations.push(Operation {
                    key: diff.key.clone(),
                    action: Action::Alter,
                    phase: Phase::Drop,
                    sql_text: sql::drop_constraint(table, &tgt_fk.name),
                    rollback_sql_text: sql::add_foreign_key(table, tgt_fk),
                });
            }
        }
    }

    /// ALTER COLUMN when possible; identity/computed shape changes need a
    /// drop-and-re-add pair (flagged by the analyzer).
    fn column_change_operation(
        &self,
        diff: &ObjectDiff,
        table: &QualifiedName,
        src: &Column,
        tgt: &Column,
    ) -> Operation {
        let rebuild = src.identity != tgt.identity || src.computed != tgt.computed;
        if rebuild {
            Operation {
                key: diff.key.clone(),
                action: Action::Alter,
                phase: Phase::Tables,
                sql_text: format!(
                    "{}\n{}",
                    sql::drop_column(table, &src.name),
                    sql::add_column(table, src)
                ),
                rollback_sql_text: format!(
                    "{}\n{}",
                    sql::drop_column(table, &tgt.name),
                    sql::add_column(table, tgt)
                ),
            }
        } else {
            Operation {
                key: diff.key.clone(),
                action: Action::Alter,
                phase: Phase::Tables,
                sql_text: sql::alter_column(table, src),
                rollback_sql_text: sql::alter_column(table, tgt),
            }
        }
    }

    fn phase_included(&self, phase: Phase) -> bool {
        match phase {
            Phase::Drop => self.options.include_drop_phase,
            Phase::Tables => self.options.include_table_phase,
            Phase::Constraints => self.options.include_constraint_phase,
            Phase::Programmability => self.options.include_programmability_phase,
            Phase::Misc => self.options.include_misc_phase,
        }
    }

    fn render(&self, operations: &[Operation], rollback: bool) -> String {
        let title = if rollback {
            "Schema Compare - Rollback Script"
        } else {
            "Schema Compare - Deployment Script"
        };
        let mut lines: Vec<String> = vec![
            "-- ==============================================================================".into(),
            format!("-- {}", title),
        ];
        if let Some(db) = &self.options.target_database {
            lines.push(format!("-- Target Database: {}", db));
        }
        if let Some(timestamp) = &self.options.header_timestamp {
            lines.push(format!("-- Generated: {}", timestamp));
        }
        if rollback {
            lines.push("-- NOTE: Review carefully before running in production.".into());
        }
        lines.push(
            "-- ==============================================================================".into(),
        );
        lines.push(String::new());
        if let Some(db) = &self.options.target_database {
            lines.push(format!("USE [{}];", db));
            lines.push("GO".into());
            lines.push(String::new());
        }
        lines.push("SET NOCOUNT ON;".into());
        lines.push("SET XACT_ABORT ON;".into());
        lines.push("SET ANSI_NULLS ON;".into());
        lines.push("SET QUOTED_IDENTIFIER ON;".into());
        lines.push(String::new());
        let verb = if rollback { "rollback" } else { "deployment" };
        lines.push(format!("PRINT 'Starting {}...';", verb));
        lines.push(String::new());
        if self.options.transactional {
            lines.push("BEGIN TRANSACTION;".into());
            lines.push(String::new());
        }

        if rollback {
            // Inverse statements run in reverse operation order.
            for op in operations.iter().rev() {
                if !self.phase_included(op.phase) || op.rollback_sql_text.is_empty() {
                    continue;
                }
                lines.push(format!("-- Revert {} of {}", op.action, op.key));
                lines.push(op.rollback_sql_text.clone());
                lines.push(String::new());
            }
        } else {
            let mut current_phase = None;
            for op in operations {
                if !self.phase_included(op.phase) {
                    continue;
                }
                if current_phase != Some(op.phase) {
                    current_phase = Some(op.phase);
                    lines.push(format!("-- ====== {} ======", op.phase.banner()));
                    lines.push(String::new());
                }
                lines.push(format!("-- {} {}", op.action, op.key));
                lines.push(op.sql_text.clone());
                lines.push(String::new());
            }
        }

        if self.options.transactional {
            lines.push("COMMIT TRANSACTION;".into());
        }
        lines.push(format!("PRINT '{} completed.';",
            if rollback { "Rollback" } else { "Deployment" }));
        lines.push("GO".into());
        lines.push(String::new());
        lines.join("\n")
    }
}

/// Forward CREATE for an object outside a table-create context.
fn create_sql(object: &DatabaseObject) -> String {
    match &object.payload {
        ObjectPayload::Table(def) => sql::create_table(&object.name, def),
        ObjectPayload::Index(def) => sql::create_standalone_index(&object.name, def),
        ObjectPayload::Key(def) => sql::add_standalone_key(&object.name, def, object.kind),
        ObjectPayload::ForeignKey(def) => sql::add_foreign_key(
            &def.table,
            &crate::model::TableForeignKey {
                name: object.name.name.clone(),
                columns: def.columns.clone(),
                referenced_table: def.referenced_table.clone(),
                referenced_columns: def.referenced_columns.clone(),
                on_delete: def.on_delete.clone(),
                on_update: def.on_update.clone(),
            },
        ),
        ObjectPayload::Check(def) => {
            sql::add_check_constraint(&def.table, &object.name.name, &def.expression)
        }
        ObjectPayload::Default(def) => {
            sql::add_default_constraint(&def.table, &object.name.name, &def.column, &def.expression)
        }
        ObjectPayload::Synonym(def) => sql::create_synonym(&object.name, &def.base_object),
        ObjectPayload::Sequence(def) => sql::create_sequence(&object.name, def),
        ObjectPayload::ScalarType(def) => sql::create_type(&object.name, def),
        ObjectPayload::Principal(def) => match object.kind {
            ObjectKind::Schema => sql::create_schema(&object.name, def.owner.as_deref()),
            ObjectKind::User => format!("CREATE USER {};", sql::bracket(&object.name.name)),
            _ => format!("CREATE ROLE {};", sql::bracket(&object.name.name)),
        },
        ObjectPayload::Property(def) => format!(
            "EXEC sp_addextendedproperty @name = N'{}', @value = N'{}';",
            object.name.name,
            def.value.replace('\'', "''")
        ),
        ObjectPayload::Definition => match &object.definition {
            Some(definition) => sql::create_programmable(object.kind, &object.name, definition),
            None => format!("-- Cannot script CREATE for {} (no definition)", object.key()),
        },
    }
}

/// Forward DROP for an object, guarded for idempotency.
fn drop_sql(object: &DatabaseObject) -> String {
    match &object.payload {
        ObjectPayload::Table(_) => sql::drop_table(&object.name),
        ObjectPayload::Index(def) => sql::drop_index(&def.table, &object.name.name),
        ObjectPayload::Key(def) => sql::drop_constraint(&def.table, &object.name.name),
        ObjectPayload::ForeignKey(def) => sql::drop_constraint(&def.table, &object.name.name),
        ObjectPayload::Check(def) => sql::drop_constraint(&def.table, &object.name.name),
        ObjectPayload::Default(def) => sql::drop_constraint(&def.table, &object.name.name),
        ObjectPayload::Synonym(_) => sql::drop_synonym(&object.name),
        ObjectPayload::Sequence(_) => sql::drop_sequence(&object.name),
        ObjectPayload::ScalarType(_) => sql::drop_type(&object.name),
        ObjectPayload::Principal(_) => match object.kind {
            ObjectKind::Schema => sql::drop_schema(&object.name),
            ObjectKind::User => format!("DROP USER {};", sql::bracket(&object.name.name)),
            _ => format!("DROP ROLE {};", sql::bracket(&object.name.name)),
        },
        ObjectPayload::Property(_) => format!(
            "EXEC sp_dropextendedproperty @name = N'{}';",
            object.name.name
        ),
        ObjectPayload::Definition => sql::drop_programmable(object.kind, &object.name),
    }
}

/// Phase assignment for non-table creates and alters. Schemas and types ride
/// in the table phase since tables depend on both; the kind-priority ordering
/// keeps them ahead of the tables themselves.
fn phase_for(kind: ObjectKind) -> Phase {
    match kind {
        ObjectKind::Schema | ObjectKind::UserDefinedType | ObjectKind::Table => Phase::Tables,
        ObjectKind::Index
        | ObjectKind::PrimaryKey
        | ObjectKind::UniqueConstraint
        | ObjectKind::ForeignKey
        | ObjectKind::CheckConstraint
        | ObjectKind::DefaultConstraint => Phase::Constraints,
        ObjectKind::View | ObjectKind::Function | ObjectKind::Procedure | ObjectKind::Trigger => {
            Phase::Programmability
        }
        ObjectKind::Sequence
        | ObjectKind::Synonym
        | ObjectKind::User
        | ObjectKind::Role
        | ObjectKind::ExtendedProperty
        | ObjectKind::Other => Phase::Misc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare;
    use crate::graph::DependencyResolver;
    use crate::model::MetadataSnapshot;
    use crate::options::ComparisonOptions;
    use pretty_assertions::assert_eq;

    fn generate_for(
        source: MetadataSnapshot,
        target: MetadataSnapshot,
        options: &DeploymentOptions,
    ) -> GeneratedScript {
        let result = compare(&source, &target, &ComparisonOptions::default()).unwrap();
        let order = DependencyResolver::new(&result)
            .resolve(&result.changed_keys())
            .unwrap();
        ScriptGenerator::new(&result, options).generate(&order).unwrap()
    }

    fn customers(len: i32, with_phone: bool) -> MetadataSnapshot {
        let mut def = TableDef::default();
        def.add_column(Column::new("ID", "int"));
        def.add_column(Column::new("Name", "varchar").max_length(len).nullable(true));
        if with_phone {
            def.add_column(Column::new("Phone", "varchar").max_length(20).nullable(true));
        }
        def.primary_key = Some(crate::model::TableKey {
            name: "PK_Customers".into(),
            columns: vec!["ID".into()],
            clustered: true,
        });
        vec![DatabaseObject::table(QualifiedName::parse("dbo.Customers"), def)]
            .into_iter()
            .collect()
    }

    #[test]
    fn narrowing_scenario_emits_paired_alter_and_drop() {
        let output = generate_for(
            customers(50, false),
            customers(100, true),
            &DeploymentOptions::default(),
        );

        assert!(output.script.contains("ALTER TABLE [dbo].[Customers] ALTER COLUMN [Name] VARCHAR(50)"));
        assert!(output.script.contains("DROP COLUMN [Phone]"));
        assert!(output
            .rollback_script
            .contains("ALTER TABLE [dbo].[Customers] ALTER COLUMN [Name] VARCHAR(100)"));
        assert!(output.rollback_script.contains("ADD [Phone] VARCHAR(20) NULL"));

        // Both operations are flagged destructive.
        assert_eq!(output.warnings.len(), 2);
        assert!(output
            .warnings
            .iter()
            .all(|w| w.severity == Severity::Destructive));
    }

    #[test]
    fn embedded_fk_drop_carries_a_warning() {
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
                foreign_keys: vec![crate::model::TableForeignKey {
                    name: "FK_Orders_Customers".into(),
                    columns: vec!["CustomerID".into()],
                    referenced_table: QualifiedName::parse("dbo.Customers"),
                    referenced_columns: vec!["ID".into()],
                    on_delete: None,
                    on_update: None,
                }],
                ..Default::default()
            },
        )]
        .into_iter()
        .collect();

        let output = generate_for(source, target, &DeploymentOptions::default());
        assert!(output.script.contains("DROP CONSTRAINT [FK_Orders_Customers]"));
        assert!(output
            .warnings
            .iter()
            .any(|w| w.severity == Severity::Caution
                && w.message.contains("FK_Orders_Customers")));
    }

    #[test]
    fn generation_is_deterministic() {
        let options = DeploymentOptions::default();
        let a = generate_for(customers(50, false), customers(100, true), &options);
        let b = generate_for(customers(50, false), customers(100, true), &options);
        assert_eq!(a.script, b.script);
        assert_eq!(a.rollback_script, b.rollback_script);
    }

    #[test]
    fn transaction_wrapping_is_optional() {
        let options = DeploymentOptions {
            transactional: false,
            ..Default::default()
        };
        let output = generate_for(customers(50, false), MetadataSnapshot::new(), &options);
        assert!(!output.script.contains("BEGIN TRANSACTION"));
        assert!(!output.script.contains("COMMIT TRANSACTION"));
    }

    #[test]
    fn new_table_creates_pk_in_constraint_phase() {
        let output = generate_for(
            customers(50, false),
            MetadataSnapshot::new(),
            &DeploymentOptions::default(),
        );
        let create_pos = output.script.find("CREATE TABLE [dbo].[Customers]").unwrap();
        let pk_pos = output.script.find("ADD CONSTRAINT [PK_Customers]").unwrap();
        assert!(create_pos < pk_pos);
        assert!(output.rollback_script.contains("DROP TABLE [dbo].[Customers]"));
    }
}
