//! Type definitions for database schema objects
//!
//! Every object captured by metadata extraction becomes a [`DatabaseObject`]:
//! a kind tag, a schema-qualified name, a kind-specific payload, and an
//! optional raw SQL definition for textual comparison.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Closed set of supported object kinds.
///
/// The declaration order is the creation priority used for dependency
/// tie-breaking: schemas and types first, tables before their constraints,
/// constraints before programmable objects. Drop order is the exact reverse.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ObjectKind {
    Schema,
    UserDefinedType,
    Sequence,
    Table,
    Index,
    PrimaryKey,
    UniqueConstraint,
    ForeignKey,
    CheckConstraint,
    DefaultConstraint,
    View,
    Function,
    Procedure,
    Trigger,
    Synonym,
    User,
    Role,
    ExtendedProperty,
    /// Fallback for unrecognized kinds, compared by definition text only.
    Other,
}

impl ObjectKind {
    /// Kinds whose equality is textual (normalized definition compare).
    pub fn is_programmable(self) -> bool {
        matches!(
            self,
            ObjectKind::View | ObjectKind::Function | ObjectKind::Procedure | ObjectKind::Trigger
        )
    }

    /// Human-readable label used in reports and generated script comments.
    pub fn label(self) -> &'static str {
        match self {
            ObjectKind::Schema => "schema",
            ObjectKind::UserDefinedType => "type",
            ObjectKind::Sequence => "sequence",
            ObjectKind::Table => "table",
            ObjectKind::Index => "index",
            ObjectKind::PrimaryKey => "primary key",
            ObjectKind::UniqueConstraint => "unique constraint",
            ObjectKind::ForeignKey => "foreign key",
            ObjectKind::CheckConstraint => "check constraint",
            ObjectKind::DefaultConstraint => "default constraint",
            ObjectKind::View => "view",
            ObjectKind::Function => "function",
            ObjectKind::Procedure => "procedure",
            ObjectKind::Trigger => "trigger",
            ObjectKind::Synonym => "synonym",
            ObjectKind::User => "user",
            ObjectKind::Role => "role",
            ObjectKind::ExtendedProperty => "extended property",
            ObjectKind::Other => "object",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Schema-qualified object name, the natural matching key within a kind.
///
/// Database principals (schemas, users, roles) carry no owning schema and use
/// an empty `schema` component.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct QualifiedName {
    pub schema: String,
    pub name: String,
}

impl QualifiedName {
    pub fn new(schema: &str, name: &str) -> Self {
        Self {
            schema: schema.to_string(),
            name: name.to_string(),
        }
    }

    /// Parse `schema.name`, defaulting the schema to `dbo` when unqualified.
    pub fn parse(full: &str) -> Self {
        let trimmed = full.trim().trim_matches(|c| c == '[' || c == ']');
        match trimmed.split_once('.') {
            Some((schema, name)) => Self::new(
                schema.trim_matches(|c| c == '[' || c == ']'),
                name.trim_matches(|c| c == '[' || c == ']'),
            ),
            None => Self::new("dbo", trimmed),
        }
    }

    /// Name for a schema-less principal (schema, user, role).
    pub fn bare(name: &str) -> Self {
        Self::new("", name)
    }

    /// Lowercased copy, used for case-insensitive matching.
    pub fn to_lowercase(&self) -> Self {
        Self {
            schema: self.schema.to_lowercase(),
            name: self.name.to_lowercase(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.schema.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}.{}", self.schema, self.name)
        }
    }
}

/// Unique identifier of one object within a snapshot.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ObjectKey {
    pub kind: ObjectKind,
    pub name: QualifiedName,
}

impl ObjectKey {
    pub fn new(kind: ObjectKind, name: QualifiedName) -> Self {
        Self { kind, name }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

/// IDENTITY specification on a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySpec {
    pub seed: i64,
    pub increment: i64,
}

impl Default for IdentitySpec {
    fn default() -> Self {
        Self { seed: 1, increment: 1 }
    }
}

/// Computed-column specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedSpec {
    pub expression: String,
    #[serde(default)]
    pub persisted: bool,
}

/// Represents a table column.
///
/// Attributes an extractor could not populate stay at their defaults; a
/// partially populated column is valid input, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    /// Character/binary length; `-1` means `MAX`.
    #[serde(default)]
    pub max_length: Option<i32>,
    #[serde(default)]
    pub precision: Option<u8>,
    #[serde(default)]
    pub scale: Option<u8>,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub default_expr: Option<String>,
    #[serde(default)]
    pub collation: Option<String>,
    #[serde(default)]
    pub identity: Option<IdentitySpec>,
    #[serde(default)]
    pub computed: Option<ComputedSpec>,
}

impl Column {
    /// Create a new column with the given name and type
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: data_type.to_string(),
            max_length: None,
            precision: None,
            scale: None,
            nullable: false,
            default_expr: None,
            collation: None,
            identity: None,
            computed: None,
        }
    }

    /// Set whether the column is nullable
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set the maximum character/binary length (`-1` for MAX)
    pub fn max_length(mut self, max_length: i32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Set decimal precision and scale
    pub fn precision_scale(mut self, precision: u8, scale: u8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Set a default expression for the column
    pub fn default_expr(mut self, expr: &str) -> Self {
        self.default_expr = Some(expr.to_string());
        self
    }

    /// Mark the column as IDENTITY with default seed/increment
    pub fn identity(mut self) -> Self {
        self.identity = Some(IdentitySpec::default());
        self
    }

    /// Render the SQL type with length or precision/scale, e.g.
    /// `VARCHAR(50)`, `VARCHAR(MAX)`, `DECIMAL(10,2)`.
    pub fn type_display(&self) -> String {
        let lower = self.data_type.to_lowercase();
        let mut display = self.data_type.to_uppercase();
        match lower.as_str() {
            "varchar" | "nvarchar" | "char" | "nchar" | "binary" | "varbinary" => {
                match self.max_length {
                    Some(-1) => display.push_str("(MAX)"),
                    Some(len) if len > 0 => display.push_str(&format!("({})", len)),
                    _ => {}
                }
            }
            "decimal" | "numeric" => {
                if let Some(precision) = self.precision {
                    match self.scale {
                        Some(scale) => display.push_str(&format!("({},{})", precision, scale)),
                        None => display.push_str(&format!("({})", precision)),
                    }
                }
            }
            _ => {}
        }
        display
    }

    /// Compact signature used in field diffs for added/removed columns.
    pub fn signature(&self) -> String {
        let nullability = if self.nullable { "NULL" } else { "NOT NULL" };
        format!("{} {}", self.type_display(), nullability)
    }
}

/// Primary key or unique key embedded in a table payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableKey {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub clustered: bool,
}

/// Index embedded in a table payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableIndex {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub included_columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub clustered: bool,
    #[serde(default)]
    pub filter: Option<String>,
}

/// Foreign key embedded in a table payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub referenced_table: QualifiedName,
    pub referenced_columns: Vec<String>,
    #[serde(default)]
    pub on_delete: Option<String>,
    #[serde(default)]
    pub on_update: Option<String>,
}

/// Represents a database table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub primary_key: Option<TableKey>,
    #[serde(default)]
    pub indexes: Vec<TableIndex>,
    #[serde(default)]
    pub foreign_keys: Vec<TableForeignKey>,
}

impl TableDef {
    /// Add a column to the table
    pub fn add_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Standalone index object (an index supplied outside its table's payload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    pub table: QualifiedName,
    pub columns: Vec<String>,
    #[serde(default)]
    pub included_columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub clustered: bool,
}

/// Standalone primary key or unique constraint object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDef {
    pub table: QualifiedName,
    pub columns: Vec<String>,
    #[serde(default)]
    pub clustered: bool,
}

/// Standalone foreign key object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDef {
    pub table: QualifiedName,
    pub columns: Vec<String>,
    pub referenced_table: QualifiedName,
    pub referenced_columns: Vec<String>,
    #[serde(default)]
    pub on_delete: Option<String>,
    #[serde(default)]
    pub on_update: Option<String>,
}

/// Check constraint object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDef {
    pub table: QualifiedName,
    pub expression: String,
}

/// Default constraint object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultDef {
    pub table: QualifiedName,
    pub column: String,
    pub expression: String,
}

/// Synonym object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymDef {
    pub base_object: QualifiedName,
}

/// Sequence object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceDef {
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub start_value: Option<i64>,
    #[serde(default)]
    pub increment: Option<i64>,
    #[serde(default)]
    pub minimum_value: Option<i64>,
    #[serde(default)]
    pub maximum_value: Option<i64>,
    #[serde(default)]
    pub cycling: bool,
}

/// User-defined type object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDef {
    #[serde(default)]
    pub base_type: Option<String>,
    #[serde(default)]
    pub max_length: Option<i32>,
    #[serde(default)]
    pub precision: Option<u8>,
    #[serde(default)]
    pub scale: Option<u8>,
    #[serde(default)]
    pub nullable: bool,
}

/// Database principal (schema owner, user default schema, role owner).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalDef {
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub default_schema: Option<String>,
}

/// Extended property value attached to an object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDef {
    #[serde(default)]
    pub value: String,
}

/// Kind-specific structured payload of a [`DatabaseObject`].
///
/// Programmable kinds and `Other` carry no structure; their entire content is
/// the `definition` text on the owning object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ObjectPayload {
    Table(TableDef),
    Index(IndexDef),
    Key(KeyDef),
    ForeignKey(ForeignKeyDef),
    Check(CheckDef),
    Default(DefaultDef),
    Synonym(SynonymDef),
    Sequence(SequenceDef),
    ScalarType(TypeDef),
    Principal(PrincipalDef),
    Property(PropertyDef),
    Definition,
}

/// One database object captured in a metadata snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseObject {
    pub kind: ObjectKind,
    pub name: QualifiedName,
    pub payload: ObjectPayload,
    /// Raw SQL definition, present for programmable objects and scripts-folder
    /// imports; used for textual equality.
    #[serde(default)]
    pub definition: Option<String>,
    /// Extractor-supplied dependency hints; the resolver derives more edges
    /// structurally and by definition scanning.
    #[serde(default)]
    pub depends_on: BTreeSet<QualifiedName>,
}

impl DatabaseObject {
    pub fn new(kind: ObjectKind, name: QualifiedName, payload: ObjectPayload) -> Self {
        Self {
            kind,
            name,
            payload,
            definition: None,
            depends_on: BTreeSet::new(),
        }
    }

    /// Construct a table object.
    pub fn table(name: QualifiedName, def: TableDef) -> Self {
        Self::new(ObjectKind::Table, name, ObjectPayload::Table(def))
    }

    /// Construct a definition-only object (view, procedure, function,
    /// trigger, or unknown kind).
    pub fn with_definition(kind: ObjectKind, name: QualifiedName, definition: &str) -> Self {
        let mut obj = Self::new(kind, name, ObjectPayload::Definition);
        obj.definition = Some(definition.to_string());
        obj
    }

    /// Attach the raw SQL definition.
    pub fn definition(mut self, definition: &str) -> Self {
        self.definition = Some(definition.to_string());
        self
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.kind, self.name.clone())
    }

    /// Whether the payload shape is legal for the object's kind. Checked at
    /// the compare call boundary so downstream code can match exhaustively.
    pub fn payload_matches_kind(&self) -> bool {
        match (&self.kind, &self.payload) {
            (ObjectKind::Table, ObjectPayload::Table(_)) => true,
            (ObjectKind::Index, ObjectPayload::Index(_)) => true,
            (ObjectKind::PrimaryKey | ObjectKind::UniqueConstraint, ObjectPayload::Key(_)) => true,
            (ObjectKind::ForeignKey, ObjectPayload::ForeignKey(_)) => true,
            (ObjectKind::CheckConstraint, ObjectPayload::Check(_)) => true,
            (ObjectKind::DefaultConstraint, ObjectPayload::Default(_)) => true,
            (ObjectKind::Synonym, ObjectPayload::Synonym(_)) => true,
            (ObjectKind::Sequence, ObjectPayload::Sequence(_)) => true,
            (ObjectKind::UserDefinedType, ObjectPayload::ScalarType(_)) => true,
            (
                ObjectKind::Schema | ObjectKind::User | ObjectKind::Role,
                ObjectPayload::Principal(_),
            ) => true,
            (ObjectKind::ExtendedProperty, ObjectPayload::Property(_)) => true,
            (
                ObjectKind::View
                | ObjectKind::Function
                | ObjectKind::Procedure
                | ObjectKind::Trigger
                | ObjectKind::Other,
                ObjectPayload::Definition,
            ) => true,
            _ => false,
        }
    }

    /// The table an object is structurally attached to, if any.
    pub fn owning_table(&self) -> Option<&QualifiedName> {
        match &self.payload {
            ObjectPayload::Index(def) => Some(&def.table),
            ObjectPayload::Key(def) => Some(&def.table),
            ObjectPayload::ForeignKey(def) => Some(&def.table),
            ObjectPayload::Check(def) => Some(&def.table),
            ObjectPayload::Default(def) => Some(&def.table),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn qualified_name_parse_defaults_schema() {
        assert_eq!(QualifiedName::parse("Customers"), QualifiedName::new("dbo", "Customers"));
        assert_eq!(
            QualifiedName::parse("sales.Orders"),
            QualifiedName::new("sales", "Orders")
        );
        assert_eq!(
            QualifiedName::parse("[sales].[Orders]"),
            QualifiedName::new("sales", "Orders")
        );
    }

    #[test]
    fn kind_order_matches_creation_priority() {
        assert!(ObjectKind::Schema < ObjectKind::Table);
        assert!(ObjectKind::Table < ObjectKind::PrimaryKey);
        assert!(ObjectKind::ForeignKey < ObjectKind::View);
        assert!(ObjectKind::View < ObjectKind::Procedure);
        assert!(ObjectKind::Trigger < ObjectKind::Synonym);
    }

    #[test]
    fn payload_shape_is_checked_per_kind() {
        let table = DatabaseObject::table(QualifiedName::parse("dbo.T"), TableDef::default());
        assert!(table.payload_matches_kind());

        let bad = DatabaseObject::new(
            ObjectKind::Table,
            QualifiedName::parse("dbo.T"),
            ObjectPayload::Definition,
        );
        assert!(!bad.payload_matches_kind());
    }
}
