//! Metadata snapshot: an immutable, ordered capture of one database's schema
//!
//! Snapshots are built once by an extraction collaborator (live connection,
//! snapshot file, or scripts folder) and only read afterwards. Lookup by
//! `(kind, qualified name)` is O(1).

use indexmap::IndexMap;
use serde::de::{Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::types::{DatabaseObject, ObjectKey, ObjectKind, QualifiedName};

/// Ordered collection of database objects for one comparison side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataSnapshot {
    objects: IndexMap<ObjectKey, DatabaseObject>,
}

impl MetadataSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object, keyed by `(kind, qualified name)`. Returns the
    /// previous object if the key was already present (the invariant is that
    /// extraction never produces duplicates; a replace signals extractor
    /// misbehavior and is surfaced by callers that care).
    pub fn insert(&mut self, object: DatabaseObject) -> Option<DatabaseObject> {
        self.objects.insert(object.key(), object)
    }

    pub fn get(&self, kind: ObjectKind, name: &QualifiedName) -> Option<&DatabaseObject> {
        self.objects.get(&ObjectKey::new(kind, name.clone()))
    }

    pub fn get_key(&self, key: &ObjectKey) -> Option<&DatabaseObject> {
        self.objects.get(key)
    }

    pub fn objects(&self) -> impl Iterator<Item = &DatabaseObject> {
        self.objects.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ObjectKey> {
        self.objects.keys()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Content fingerprint over the canonical (sorted) object list, suitable
    /// for report headers and change detection between captures.
    pub fn fingerprint(&self) -> String {
        let mut sorted: Vec<&DatabaseObject> = self.objects.values().collect();
        sorted.sort_by(|a, b| a.key().cmp(&b.key()));
        let canonical = serde_json::to_vec(&sorted).unwrap_or_default();
        format!("{:x}", md5::compute(canonical))
    }
}

impl FromIterator<DatabaseObject> for MetadataSnapshot {
    fn from_iter<I: IntoIterator<Item = DatabaseObject>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for object in iter {
            snapshot.insert(object);
        }
        snapshot
    }
}

// Serialized form is a plain object sequence; the key map is rebuilt on load.
impl Serialize for MetadataSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.objects.len()))?;
        for object in self.objects.values() {
            seq.serialize_element(object)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for MetadataSnapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SnapshotVisitor;

        impl<'de> Visitor<'de> for SnapshotVisitor {
            type Value = MetadataSnapshot;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a sequence of database objects")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut snapshot = MetadataSnapshot::new();
                while let Some(object) = seq.next_element::<DatabaseObject>()? {
                    snapshot.insert(object);
                }
                Ok(snapshot)
            }
        }

        deserializer.deserialize_seq(SnapshotVisitor)
    }
}
