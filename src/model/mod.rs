//! Metadata model: typed representation of one database's schema

pub mod snapshot;
pub mod types;

pub use snapshot::MetadataSnapshot;
pub use types::{
    CheckDef, Column, ComputedSpec, DatabaseObject, DefaultDef, ForeignKeyDef, IdentitySpec,
    IndexDef, KeyDef, ObjectKey, ObjectKind, ObjectPayload, PrincipalDef, PropertyDef,
    QualifiedName, SequenceDef, SynonymDef, TableDef, TableForeignKey, TableIndex, TableKey,
    TypeDef,
};
