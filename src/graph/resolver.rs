//! Dependency graph builder and resolver
//!
//! Expands a user selection to its dependency closure, then produces a total
//! creation order via Kahn's algorithm. Ties are broken by
//! `(kind priority, qualified name)` so the order is deterministic. Remaining
//! nodes after the queue drains form genuine cycles, which are reported by
//! member list rather than silently broken.

use indexmap::{IndexMap, IndexSet};
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, VecDeque};
use tracing::debug;

use crate::compare::{ComparisonResult, DiffStatus};
use crate::error::{Error, Result};
use crate::graph::scan::{DependencyScanner, TextScanner};
use crate::model::{ObjectKey, ObjectKind, ObjectPayload, QualifiedName};

static DEFAULT_SCANNER: TextScanner = TextScanner;

/// One object in the resolved order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub key: ObjectKey,
    /// True when the object was pulled in by closure expansion rather than
    /// selected by the caller; wizards surface these as notices.
    pub auto_included: bool,
}

/// Dependency-safe ordering over the closure of a selection.
#[derive(Debug, Clone, Default)]
pub struct ResolvedOrder {
    /// Creation order: every dependency precedes its dependents.
    pub create_order: Vec<PlanEntry>,
    /// Advisory notes about heuristic decisions (auto-inclusion, unresolved
    /// references). Never fatal.
    pub notes: Vec<String>,
}

impl ResolvedOrder {
    /// Drop order is the exact reverse of creation order.
    pub fn drop_order(&self) -> impl Iterator<Item = &PlanEntry> {
        self.create_order.iter().rev()
    }
}

/// Derives depends-on edges and resolves a total order for script generation.
pub struct DependencyResolver<'a> {
    result: &'a ComparisonResult,
    scanner: &'a dyn DependencyScanner,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(result: &'a ComparisonResult) -> Self {
        Self {
            result,
            scanner: &DEFAULT_SCANNER,
        }
    }

    /// Swap the textual scanner, e.g. for a SQL-aware implementation.
    pub fn with_scanner(result: &'a ComparisonResult, scanner: &'a dyn DependencyScanner) -> Self {
        Self { result, scanner }
    }

    /// Expand `selection` to its dependency closure and order it.
    pub fn resolve(&self, selection: &[ObjectKey]) -> Result<ResolvedOrder> {
        for key in selection {
            if self.result.get(key).is_none() {
                return Err(Error::InvalidOptions(format!(
                    "selection references unknown object {}",
                    key
                )));
            }
        }

        let keys_by_name = self.keys_by_name();
        let candidates: Vec<QualifiedName> = {
            let unique: BTreeSet<QualifiedName> = self
                .result
                .entries()
                .map(|entry| entry.key.name.clone())
                .collect();
            unique.into_iter().collect()
        };

        let mut notes = Vec::new();
        let mut closure: IndexMap<ObjectKey, bool> = selection
            .iter()
            .map(|key| (key.clone(), false))
            .collect();

        // Breadth-first expansion until fixed point: a dependency joins the
        // closure only if it needs synchronization itself.
        let mut queue: VecDeque<ObjectKey> = closure.keys().cloned().collect();
        let mut edges: IndexMap<ObjectKey, BTreeSet<ObjectKey>> = IndexMap::new();
        while let Some(key) = queue.pop_front() {
            let deps = self.dependencies_of(&key, &keys_by_name, &candidates, &mut notes);
            for dep in &deps {
                if closure.contains_key(dep) {
                    continue;
                }
                let status = self.result.get(dep).map(|entry| entry.status);
                if matches!(
                    status,
                    Some(DiffStatus::Different) | Some(DiffStatus::MissingInTarget)
                ) {
                    debug!(object = %dep, required_by = %key, "auto-including dependency");
                    notes.push(format!("auto-included {} (required by {})", dep, key));
                    closure.insert(dep.clone(), true);
                    queue.push_back(dep.clone());
                }
            }
            edges.insert(key, deps);
        }

        self.order_closure(closure, edges, notes)
    }

    /// Kahn's algorithm over the closure, tie-broken by `(kind, name)`.
    fn order_closure(
        &self,
        closure: IndexMap<ObjectKey, bool>,
        edges: IndexMap<ObjectKey, BTreeSet<ObjectKey>>,
        notes: Vec<String>,
    ) -> Result<ResolvedOrder> {
        let mut indegree: IndexMap<&ObjectKey, usize> =
            closure.keys().map(|key| (key, 0)).collect();
        let mut dependents: IndexMap<&ObjectKey, Vec<&ObjectKey>> = IndexMap::new();
        for (dependent, deps) in &edges {
            for dep in deps {
                if closure.contains_key(dep) {
                    *indegree.get_mut(dependent).expect("closure member") += 1;
                    dependents.entry(dep).or_default().push(dependent);
                }
            }
        }

        let mut ready: BinaryHeap<Reverse<&ObjectKey>> = indegree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(key, _)| Reverse(*key))
            .collect();

        let mut create_order = Vec::with_capacity(closure.len());
        while let Some(Reverse(key)) = ready.pop() {
            create_order.push(PlanEntry {
                key: key.clone(),
                auto_included: closure[key],
            });
            if let Some(next) = dependents.get(key) {
                for dependent in next {
                    let degree = indegree.get_mut(dependent).expect("closure member");
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse(*dependent));
                    }
                }
            }
        }

        if create_order.len() < closure.len() {
            let ordered: IndexSet<&ObjectKey> =
                create_order.iter().map(|entry| &entry.key).collect();
            let residual: Vec<&ObjectKey> = closure
                .keys()
                .filter(|key| !ordered.contains(*key))
                .collect();
            let cycles = strongly_connected(&residual, &edges);
            return Err(Error::DependencyCycle { cycles });
        }

        Ok(ResolvedOrder { create_order, notes })
    }

    /// Group all result entries (hidden included) by lowercased name, so
    /// filtered-out objects remain reachable as dependencies.
    fn keys_by_name(&self) -> IndexMap<String, Vec<ObjectKey>> {
        let mut index: IndexMap<String, Vec<ObjectKey>> = IndexMap::new();
        for entry in self.result.entries() {
            index
                .entry(entry.key.name.to_lowercase().to_string())
                .or_default()
                .push(entry.key.clone());
        }
        index
    }

    /// Derive the depends-on set for one object: structural edges from the
    /// payload plus a conservative scan of the definition text.
    fn dependencies_of(
        &self,
        key: &ObjectKey,
        keys_by_name: &IndexMap<String, Vec<ObjectKey>>,
        candidates: &[QualifiedName],
        notes: &mut Vec<String>,
    ) -> BTreeSet<ObjectKey> {
        let entry = match self.result.get(key) {
            Some(entry) => entry,
            None => return BTreeSet::new(),
        };
        let object = match entry.source.as_ref().or(entry.target.as_ref()) {
            Some(object) => object,
            None => return BTreeSet::new(),
        };

        let mut names: BTreeSet<QualifiedName> = BTreeSet::new();

        if let Some(table) = object.owning_table() {
            names.insert(table.clone());
        }
        match &object.payload {
            ObjectPayload::Table(def) => {
                for fk in &def.foreign_keys {
                    names.insert(fk.referenced_table.clone());
                }
            }
            ObjectPayload::ForeignKey(def) => {
                names.insert(def.referenced_table.clone());
            }
            ObjectPayload::Synonym(def) => {
                names.insert(def.base_object.clone());
            }
            _ => {}
        }
        if !object.name.schema.is_empty() {
            names.insert(QualifiedName::bare(&object.name.schema));
        }
        for hint in &object.depends_on {
            names.insert(hint.clone());
        }
        if object.kind.is_programmable() || object.kind == ObjectKind::Other {
            if let Some(definition) = &object.definition {
                names.extend(self.scanner.scan(definition, candidates));
            }
        }

        let mut deps = BTreeSet::new();
        for name in names {
            if name == object.name {
                continue;
            }
            match keys_by_name.get(&name.to_lowercase().to_string()) {
                Some(keys) => {
                    deps.extend(keys.iter().filter(|k| *k != key).cloned());
                }
                None => {
                    // Hint names can point outside both snapshots (cross-
                    // database references); surfaced, never fatal.
                    if object.depends_on.contains(&name) {
                        notes.push(format!("unresolved reference {} in {}", name, key));
                    }
                }
            }
        }
        deps
    }
}

/// Strongly connected components among the residual nodes, each reported as
/// one cycle. Plain iterative Tarjan restricted to the residual subgraph.
fn strongly_connected(
    residual: &[&ObjectKey],
    edges: &IndexMap<ObjectKey, BTreeSet<ObjectKey>>,
) -> Vec<Vec<ObjectKey>> {
    let node_ids: IndexMap<&ObjectKey, usize> = residual
        .iter()
        .enumerate()
        .map(|(i, key)| (*key, i))
        .collect();
    let adjacency: Vec<Vec<usize>> = residual
        .iter()
        .map(|key| {
            edges
                .get(*key)
                .map(|deps| {
                    deps.iter()
                        .filter_map(|dep| node_ids.get(dep).copied())
                        .collect()
                })
                .unwrap_or_default()
        })
        .collect();

    let n = residual.len();
    let mut index_counter = 0usize;
    let mut indices = vec![usize::MAX; n];
    let mut lowlink = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack = Vec::new();
    let mut components = Vec::new();

    for start in 0..n {
        if indices[start] != usize::MAX {
            continue;
        }
        // Explicit work stack: (node, next neighbor position).
        let mut work = vec![(start, 0usize)];
        while let Some(frame) = work.last_mut() {
            let node = frame.0;
            if frame.1 == 0 {
                indices[node] = index_counter;
                lowlink[node] = index_counter;
                index_counter += 1;
                stack.push(node);
                on_stack[node] = true;
            }
            let next = frame.1;
            if let Some(&neighbor) = adjacency[node].get(next) {
                frame.1 += 1;
                if indices[neighbor] == usize::MAX {
                    work.push((neighbor, 0));
                } else if on_stack[neighbor] {
                    lowlink[node] = lowlink[node].min(indices[neighbor]);
                }
            } else {
                work.pop();
                if let Some(&(parent, _)) = work.last() {
                    lowlink[parent] = lowlink[parent].min(lowlink[node]);
                }
                if lowlink[node] == indices[node] {
                    let mut component = Vec::new();
                    while let Some(member) = stack.pop() {
                        on_stack[member] = false;
                        component.push(residual[member].clone());
                        if member == node {
                            break;
                        }
                    }
                    if component.len() > 1 || adjacency[node].contains(&node) {
                        component.sort();
                        components.push(component);
                    }
                }
            }
        }
    }

    components.sort();
    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare;
    use crate::model::{DatabaseObject, MetadataSnapshot, ObjectKind, TableDef};
    use crate::options::ComparisonOptions;
    use pretty_assertions::assert_eq;

    fn view(name: &str, body: &str) -> DatabaseObject {
        DatabaseObject::with_definition(
            ObjectKind::View,
            QualifiedName::parse(name),
            &format!("CREATE VIEW {} AS {}", name, body),
        )
    }

    fn empty_table(name: &str) -> DatabaseObject {
        DatabaseObject::table(QualifiedName::parse(name), TableDef::default())
    }

    #[test]
    fn closure_auto_includes_changed_dependencies() {
        let mut table = empty_table("dbo.Y");
        table.payload = crate::model::ObjectPayload::Table(TableDef {
            columns: vec![crate::model::Column::new("ID", "int")],
            ..Default::default()
        });
        let source: MetadataSnapshot =
            vec![table, view("dbo.vw_X", "SELECT ID FROM dbo.Y")].into_iter().collect();
        let target: MetadataSnapshot = vec![
            empty_table("dbo.Y"),
            view("dbo.vw_X", "SELECT 1 AS ID"),
        ]
        .into_iter()
        .collect();

        let result = compare(&source, &target, &ComparisonOptions::default()).unwrap();
        let view_key = ObjectKey::new(ObjectKind::View, QualifiedName::parse("dbo.vw_X"));
        let table_key = ObjectKey::new(ObjectKind::Table, QualifiedName::parse("dbo.Y"));

        let order = DependencyResolver::new(&result).resolve(&[view_key.clone()]).unwrap();
        let keys: Vec<&ObjectKey> = order.create_order.iter().map(|e| &e.key).collect();
        assert_eq!(keys, vec![&table_key, &view_key]);
        assert!(order.create_order[0].auto_included);
        assert!(!order.create_order[1].auto_included);
    }

    #[test]
    fn mutual_views_report_a_cycle() {
        let source: MetadataSnapshot = vec![
            view("dbo.A", "SELECT * FROM dbo.B"),
            view("dbo.B", "SELECT * FROM dbo.A"),
        ]
        .into_iter()
        .collect();
        let target = MetadataSnapshot::new();

        let result = compare(&source, &target, &ComparisonOptions::default()).unwrap();
        let keys: Vec<ObjectKey> = result.changed_keys();
        let err = DependencyResolver::new(&result).resolve(&keys).unwrap_err();
        match err {
            Error::DependencyCycle { cycles } => {
                assert_eq!(cycles.len(), 1);
                let members: Vec<String> =
                    cycles[0].iter().map(|k| k.name.to_string()).collect();
                assert_eq!(members, vec!["dbo.A", "dbo.B"]);
            }
            other => panic!("expected cycle error, got {:?}", other),
        }
    }

    #[test]
    fn kind_priority_breaks_ties_deterministically() {
        let source: MetadataSnapshot = vec![
            view("dbo.vw_One", "SELECT 1 AS n"),
            empty_table("dbo.Zebra"),
            empty_table("dbo.Apple"),
        ]
        .into_iter()
        .collect();
        let target = MetadataSnapshot::new();

        let result = compare(&source, &target, &ComparisonOptions::default()).unwrap();
        let order = DependencyResolver::new(&result)
            .resolve(&result.changed_keys())
            .unwrap();
        let names: Vec<String> = order
            .create_order
            .iter()
            .map(|e| e.key.name.to_string())
            .collect();
        assert_eq!(names, vec!["dbo.Apple", "dbo.Zebra", "dbo.vw_One"]);
    }
}
