use serde::{Deserialize, Serialize};

/// Top-level model definition parsed from a models.yaml file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSet {
    #[serde(default)]
    pub entities: Vec<RawEntity>,
}

/// One entity as declared in the model definition, before graph resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEntity {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<RawField>,
    #[serde(default)]
    pub skip: bool,
}

/// One declared field: a name, a declared type, an optional column-name
/// override, and a `;`-separated list of rule tokens (`key` or `key:value`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawField {
    pub name: String,
    #[serde(default)]
    pub column: Option<String>,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub rules: String,
}

/// Declared field type: either a semantic scalar kind or a named type
/// reference (an enum type or another declared entity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldKind {
    Scalar(ScalarKind),
    Named(String),
}

/// Semantic scalar kinds understood by the schema type mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Int,
    Uint,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
    Text,
    Timestamp,
}
