use crate::metadata::ScalarKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Mapping from semantic scalar kinds to schema type names.
#[derive(Debug, Clone)]
pub struct TypeMap {
    map: HashMap<ScalarKind, String>,
}

impl TypeMap {
    /// The PostgreSQL mapping.
    pub fn postgres() -> Self {
        let mut map = HashMap::new();
        map.insert(ScalarKind::Int, "integer".to_string());
        map.insert(ScalarKind::Uint, "serial".to_string());
        map.insert(ScalarKind::Int8, "smallint".to_string());
        map.insert(ScalarKind::Int16, "smallint".to_string());
        map.insert(ScalarKind::Int32, "integer".to_string());
        map.insert(ScalarKind::Int64, "bigint".to_string());
        map.insert(ScalarKind::Float32, "real".to_string());
        map.insert(ScalarKind::Float64, "double precision".to_string());
        map.insert(ScalarKind::Bool, "boolean".to_string());
        map.insert(ScalarKind::Text, "text".to_string());
        map.insert(ScalarKind::Timestamp, "timestamptz".to_string());
        TypeMap { map }
    }

    pub fn resolve(&self, kind: ScalarKind) -> Option<&str> {
        self.map.get(&kind).map(String::as_str)
    }

    /// Override the schema type for one scalar kind.
    pub fn set(&mut self, kind: ScalarKind, schema_type: impl Into<String>) {
        self.map.insert(kind, schema_type.into());
    }
}

impl Default for TypeMap {
    fn default() -> Self {
        TypeMap::postgres()
    }
}

/// An enum type as seen by schema derivation: its wire type name and the
/// list of valid values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDef {
    pub wire_type: String,
    pub values: Vec<String>,
}

/// Answers enum-type lookups for named field types. Consulted only for
/// column type resolution.
pub trait EnumResolver {
    fn resolve(&self, type_name: &str) -> Option<EnumDef>;
}

/// Map-backed enum resolver, deserializable from an enums catalog file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnumCatalog {
    #[serde(default)]
    pub enums: HashMap<String, EnumDef>,
}

impl EnumCatalog {
    pub fn insert(&mut self, type_name: impl Into<String>, def: EnumDef) {
        self.enums.insert(type_name.into(), def);
    }
}

impl EnumResolver for EnumCatalog {
    fn resolve(&self, type_name: &str) -> Option<EnumDef> {
        self.enums.get(type_name).cloned()
    }
}

/// Resolver for models without enum types.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEnums;

impl EnumResolver for NoEnums {
    fn resolve(&self, _type_name: &str) -> Option<EnumDef> {
        None
    }
}

/// A derived column definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub column_name: String,
    pub sql_type: String,
    pub nullable: bool,
    pub default_value: Option<String>,
}

/// A derived foreign-key reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// Structured description of one derived table, for programmatic consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub table_name: String,
    pub primary_key: Vec<String>,
    pub fields: Vec<ColumnDef>,
    pub foreign_keys: Vec<ForeignKeyRef>,
}

/// One emitted schema-definition statement, with the structured keys the
/// ordering heuristic sorts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub sql: String,
    pub has_foreign_key: bool,
    pub composite_primary_key: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    EnumType,
    Table,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Full schema-derivation output: the ordered statement sequence plus the
/// structured table map keyed by entity name.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    pub statements: Vec<Statement>,
    pub tables: BTreeMap<String, Table>,
}

impl SchemaSet {
    /// The ordered statement strings, ready for sequential execution.
    pub fn sql(&self) -> Vec<String> {
        self.statements.iter().map(|s| s.sql.clone()).collect()
    }
}
