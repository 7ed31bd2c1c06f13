//! End-to-end pipeline tests: compare, resolve, generate.

use pretty_assertions::assert_eq;

use schema_compare::compare::DiffStatus;
use schema_compare::model::{
    Column, DatabaseObject, MetadataSnapshot, ObjectKind, QualifiedName, TableDef, TableKey,
};
use schema_compare::options::{ComparisonOptions, DeploymentOptions};
use schema_compare::script::Severity;
use schema_compare::Error;

fn table(name: &str, columns: Vec<Column>) -> DatabaseObject {
    let mut def = TableDef::default();
    for col in columns {
        def.columns.push(col);
    }
    DatabaseObject::table(QualifiedName::parse(name), def)
}

fn view(name: &str, body: &str) -> DatabaseObject {
    DatabaseObject::with_definition(ObjectKind::View, QualifiedName::parse(name), body)
}

fn customers(name_len: i32, with_phone: bool) -> DatabaseObject {
    let mut def = TableDef::default();
    def.add_column(Column::new("ID", "int"));
    def.add_column(
        Column::new("Name", "varchar")
            .max_length(name_len)
            .nullable(true),
    );
    if with_phone {
        def.add_column(
            Column::new("Phone", "varchar").max_length(20).nullable(true),
        );
    }
    def.primary_key = Some(TableKey {
        name: "PK_Customers".into(),
        columns: vec!["ID".into()],
        clustered: true,
    });
    DatabaseObject::table(QualifiedName::parse("dbo.Customers"), def)
}

fn snapshot(objects: Vec<DatabaseObject>) -> MetadataSnapshot {
    objects.into_iter().collect()
}

/// Model-level application of the deployment plan: create inserts the
/// source object, drop removes it, alter replaces target with source.
fn apply_plan(
    result: &schema_compare::ComparisonResult,
    source: &MetadataSnapshot,
    target: &MetadataSnapshot,
    operations: &[schema_compare::script::Operation],
) -> MetadataSnapshot {
    let mut applied: Vec<DatabaseObject> = target.objects().cloned().collect();
    let mut touched = std::collections::BTreeSet::new();
    for op in operations {
        if !touched.insert(op.key.clone()) {
            continue;
        }
        let entry = result.get(&op.key).unwrap();
        match entry.status {
            DiffStatus::MissingInSource => {
                applied.retain(|o| o.key() != op.key);
            }
            DiffStatus::MissingInTarget | DiffStatus::Different => {
                applied.retain(|o| o.key() != op.key);
                let src = source.objects().find(|o| o.key() == op.key).unwrap();
                applied.push(src.clone());
            }
            DiffStatus::Identical => {}
        }
    }
    applied.into_iter().collect()
}

#[test]
fn report_covers_the_union_of_both_snapshots() {
    let source = snapshot(vec![
        customers(50, false),
        table("dbo.Orders", vec![Column::new("ID", "int")]),
    ]);
    let target = snapshot(vec![
        customers(50, false),
        table("dbo.Legacy", vec![Column::new("ID", "int")]),
    ]);

    let result = schema_compare::compare(&source, &target, &ComparisonOptions::default()).unwrap();
    assert_eq!(result.len(), 3);

    let summary = result.summarize();
    assert_eq!(summary.identical, 1);
    assert_eq!(summary.missing_in_target, 1);
    assert_eq!(summary.missing_in_source, 1);
}

#[test]
fn swapping_sides_mirrors_the_statuses() {
    let a = snapshot(vec![customers(50, false), customers_orders()]);
    let b = snapshot(vec![customers(100, false)]);

    let forward = schema_compare::compare(&a, &b, &ComparisonOptions::default()).unwrap();
    let reverse = schema_compare::compare(&b, &a, &ComparisonOptions::default()).unwrap();

    for entry in forward.entries() {
        let mirrored = reverse.get(&entry.key).unwrap();
        let expected = match entry.status {
            DiffStatus::MissingInTarget => DiffStatus::MissingInSource,
            DiffStatus::MissingInSource => DiffStatus::MissingInTarget,
            other => other,
        };
        assert_eq!(mirrored.status, expected, "status mirror for {}", entry.key);

        // Field diffs swap sides: same paths, source and target values
        // exchanged.
        if entry.status == DiffStatus::Different {
            assert_eq!(entry.field_diffs.len(), mirrored.field_diffs.len());
            for diff in &entry.field_diffs {
                let counterpart = mirrored
                    .field_diffs
                    .iter()
                    .find(|d| d.field_path == diff.field_path)
                    .unwrap_or_else(|| panic!("no mirrored diff for {}", diff.field_path));
                assert_eq!(counterpart.source_value, diff.target_value);
                assert_eq!(counterpart.target_value, diff.source_value);
            }
        }
    }
}

fn customers_orders() -> DatabaseObject {
    table("dbo.Orders", vec![Column::new("ID", "int")])
}

#[test]
fn customers_scenario_produces_targeted_alters_and_warnings() {
    let source = snapshot(vec![customers(50, false)]);
    let target = snapshot(vec![customers(100, true)]);

    let result = schema_compare::compare(&source, &target, &ComparisonOptions::default()).unwrap();
    let entry = result.entries().next().unwrap();
    assert_eq!(entry.status, DiffStatus::Different);
    assert!(entry.field_diffs.len() >= 2, "length change plus extra column");
    assert!(entry
        .field_diffs
        .iter()
        .any(|d| d.field_path == "columns.Name.max_length"));
    assert!(entry
        .field_diffs
        .iter()
        .any(|d| d.field_path == "columns.Phone"));

    let output = schema_compare::generate_scripts(
        &result,
        &result.changed_keys(),
        &DeploymentOptions::default(),
    )
    .unwrap();

    assert!(output
        .script
        .contains("ALTER COLUMN [Name] VARCHAR(50)"));
    assert!(output.script.contains("DROP COLUMN [Phone]"));
    assert!(output
        .rollback_script
        .contains("ALTER COLUMN [Name] VARCHAR(100)"));
    assert!(output.rollback_script.contains("ADD [Phone] VARCHAR(20) NULL"));

    let destructive: Vec<_> = output
        .warnings
        .iter()
        .filter(|w| w.severity == Severity::Destructive)
        .collect();
    assert_eq!(destructive.len(), 2);
}

#[test]
fn generation_is_deterministic_across_runs() {
    let build = || {
        let source = snapshot(vec![
            customers(50, false),
            view(
                "dbo.vw_Recent",
                "CREATE VIEW [dbo].[vw_Recent] AS SELECT * FROM [dbo].[Customers]",
            ),
            customers_orders(),
        ]);
        let target = snapshot(vec![customers(100, true)]);
        let result =
            schema_compare::compare(&source, &target, &ComparisonOptions::default()).unwrap();
        schema_compare::generate_scripts(
            &result,
            &result.changed_keys(),
            &DeploymentOptions::default(),
        )
        .unwrap()
    };

    let first = build();
    let second = build();
    assert_eq!(first.script, second.script);
    assert_eq!(first.rollback_script, second.rollback_script);
}

#[test]
fn selecting_a_view_pulls_in_its_missing_base_table() {
    let source = snapshot(vec![
        customers(50, false),
        view(
            "dbo.vw_X",
            "CREATE VIEW [dbo].[vw_X] AS SELECT ID FROM [dbo].[Customers]",
        ),
    ]);
    let target = snapshot(vec![]);

    let result = schema_compare::compare(&source, &target, &ComparisonOptions::default()).unwrap();
    let view_key = result
        .entries()
        .find(|e| e.key.kind == ObjectKind::View)
        .unwrap()
        .key
        .clone();

    let order = schema_compare::resolve_order(&result, &[view_key.clone()]).unwrap();
    assert_eq!(order.create_order.len(), 2);

    let table_entry = &order.create_order[0];
    assert_eq!(table_entry.key.kind, ObjectKind::Table);
    assert!(table_entry.auto_included);
    assert_eq!(order.create_order[1].key, view_key);
    assert!(!order.create_order[1].auto_included);
}

#[test]
fn mutual_view_references_fail_generation_but_not_comparison() {
    let source = snapshot(vec![
        view("dbo.A", "CREATE VIEW [dbo].[A] AS SELECT * FROM [dbo].[B]"),
        view("dbo.B", "CREATE VIEW [dbo].[B] AS SELECT * FROM [dbo].[A]"),
    ]);
    let target = snapshot(vec![]);

    let result = schema_compare::compare(&source, &target, &ComparisonOptions::default()).unwrap();
    assert_eq!(result.summarize().missing_in_target, 2);

    let err = schema_compare::generate_scripts(
        &result,
        &result.changed_keys(),
        &DeploymentOptions::default(),
    )
    .unwrap_err();
    match err {
        Error::DependencyCycle { cycles } => {
            assert_eq!(cycles.len(), 1);
            assert_eq!(cycles[0].len(), 2);
        }
        other => panic!("expected a dependency cycle error, got {:?}", other),
    }
}

#[test]
fn applying_the_plan_reconciles_target_with_source() {
    let source = snapshot(vec![
        customers(50, false),
        view(
            "dbo.vw_Recent",
            "CREATE VIEW [dbo].[vw_Recent] AS SELECT * FROM [dbo].[Customers]",
        ),
    ]);
    let target = snapshot(vec![
        customers(100, true),
        table("dbo.Obsolete", vec![Column::new("ID", "int")]),
    ]);

    let result = schema_compare::compare(&source, &target, &ComparisonOptions::default()).unwrap();
    let output = schema_compare::generate_scripts(
        &result,
        &result.changed_keys(),
        &DeploymentOptions::default(),
    )
    .unwrap();

    let applied = apply_plan(&result, &source, &target, &output.operations);
    let recheck =
        schema_compare::compare(&source, &applied, &ComparisonOptions::default()).unwrap();
    assert!(recheck
        .entries()
        .all(|e| e.status == DiffStatus::Identical));
    assert_eq!(applied.fingerprint(), source.fingerprint());
}

#[test]
fn rollback_plan_restores_the_original_target() {
    let source = snapshot(vec![customers(50, false)]);
    let target = snapshot(vec![
        customers(100, true),
        table("dbo.Obsolete", vec![Column::new("ID", "int")]),
    ]);

    let result = schema_compare::compare(&source, &target, &ComparisonOptions::default()).unwrap();
    let output = schema_compare::generate_scripts(
        &result,
        &result.changed_keys(),
        &DeploymentOptions::default(),
    )
    .unwrap();

    // Forward, then invert: create becomes drop, drop becomes re-create,
    // alter restores the target object.
    let applied = apply_plan(&result, &source, &target, &output.operations);
    let mut reverted: Vec<DatabaseObject> = applied.objects().cloned().collect();
    let mut touched = std::collections::BTreeSet::new();
    for op in output.operations.iter().rev() {
        if !touched.insert(op.key.clone()) {
            continue;
        }
        let entry = result.get(&op.key).unwrap();
        match entry.status {
            DiffStatus::MissingInTarget => reverted.retain(|o| o.key() != op.key),
            DiffStatus::MissingInSource | DiffStatus::Different => {
                reverted.retain(|o| o.key() != op.key);
                reverted.push(entry.target.clone().unwrap());
            }
            DiffStatus::Identical => {}
        }
    }
    let reverted: MetadataSnapshot = reverted.into_iter().collect();
    assert_eq!(reverted.fingerprint(), target.fingerprint());
}

#[test]
fn drops_precede_creates_and_follow_reverse_dependency_order() {
    let source = snapshot(vec![]);
    let target = snapshot(vec![
        customers(50, false),
        view(
            "dbo.vw_Recent",
            "CREATE VIEW [dbo].[vw_Recent] AS SELECT * FROM [dbo].[Customers]",
        ),
    ]);

    let result = schema_compare::compare(&source, &target, &ComparisonOptions::default()).unwrap();
    let output = schema_compare::generate_scripts(
        &result,
        &result.changed_keys(),
        &DeploymentOptions::default(),
    )
    .unwrap();

    // Dependent view drops before the table it reads from.
    let view_drop = output.script.find("DROP VIEW").unwrap();
    let table_drop = output.script.find("DROP TABLE [dbo].[Customers]").unwrap();
    assert!(view_drop < table_drop);
}

#[test]
fn excluded_kinds_are_hidden_but_still_resolved() {
    let source = snapshot(vec![
        customers(50, false),
        view(
            "dbo.vw_X",
            "CREATE VIEW [dbo].[vw_X] AS SELECT ID FROM [dbo].[Customers]",
        ),
    ]);
    let target = snapshot(vec![]);

    let options = ComparisonOptions {
        excluded_kinds: vec![ObjectKind::Table],
        ..Default::default()
    };
    let result = schema_compare::compare(&source, &target, &options).unwrap();

    assert_eq!(result.entries().count(), 2);
    assert_eq!(result.visible_entries().count(), 1);

    // The hidden table is still available as a dependency.
    let view_key = result.changed_keys()[0].clone();
    assert_eq!(view_key.kind, ObjectKind::View);
    let order = schema_compare::resolve_order(&result, &[view_key]).unwrap();
    assert_eq!(order.create_order.len(), 2);
}
