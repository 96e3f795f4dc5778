//! relgen derives two artifacts from a declarative data-model definition:
//! an ordered set of schema-definition statements (tables, keys,
//! constraints, and synthesized join tables) and per-entity eager-load
//! ("preload") plans.
//!
//! The pipeline is [`build_graph`] -> [`SchemaBuilder`] + [`preload_map`];
//! [`generate`] runs all three with fresh run-scoped state.

pub mod error;
pub mod graph;
pub mod metadata;
pub mod naming;
pub mod preload;
pub mod schema;

pub use error::{RelgenError, Result};
pub use graph::{build_graph, Entity, EntityGraph, Field, FieldRules, Relation};
pub use metadata::{parse_models, parse_models_str, ModelSet, RawEntity, RawField};
pub use preload::{preload_map, DEFAULT_PRELOAD_DEPTH};
pub use schema::{
    EnumCatalog, EnumDef, EnumResolver, NoEnums, SchemaBuilder, SchemaSet, Statement, Table,
    TypeMap,
};

use std::collections::BTreeMap;

/// Options controlling one generation run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Maximum preload traversal depth (hop count from the root entity).
    pub preload_depth: usize,
    /// Semantic scalar to schema type mapping.
    pub type_map: TypeMap,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            preload_depth: DEFAULT_PRELOAD_DEPTH,
            type_map: TypeMap::postgres(),
        }
    }
}

/// Everything derived from one generation run.
#[derive(Debug)]
pub struct Generation {
    /// The resolved entity graph, for downstream code emitters.
    pub graph: EntityGraph,
    /// Ordered schema statements plus the structured table map.
    pub schema: SchemaSet,
    /// Entity name to deduplicated preload paths.
    pub preloads: BTreeMap<String, Vec<String>>,
}

/// Run graph building, schema derivation, and preload resolution over raw
/// entity metadata. Each call works from fresh run-scoped state, so
/// repeated invocations over identical input yield identical output.
pub fn generate(
    entities: &[RawEntity],
    options: &GenerateOptions,
    enums: &dyn EnumResolver,
) -> Result<Generation> {
    let graph = graph::build_graph(entities)?;
    let schema = SchemaBuilder::new(&options.type_map, enums).generate(&graph)?;
    let preloads = preload::preload_map(&graph, options.preload_depth);
    Ok(Generation {
        graph,
        schema,
        preloads,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SCENARIO: &str = r#"
entities:
  - name: User
    fields:
      - { name: ID, type: int, rules: "primaryKey;autoIncrement" }
      - { name: RoleID, type: int64, rules: "foreignKey:Role.ID" }
  - name: Role
    fields:
      - { name: ID, type: int64 }
  - name: Tag
    fields:
      - { name: ID, type: int64 }
      - { name: Issues, type: Issue, rules: "many2many:Issue" }
      - { name: RoleID, type: int64, rules: "foreignKey:Role.ID" }
  - name: Issue
    fields:
      - { name: ID, type: int64 }
"#;

    #[test]
    fn test_generate_end_to_end() {
        let models = parse_models_str(SCENARIO).unwrap();
        let generation =
            generate(&models.entities, &GenerateOptions::default(), &NoEnums).unwrap();

        assert_eq!(generation.graph.len(), 5);
        assert_eq!(generation.preloads["User"], vec!["Role".to_string()]);
        assert_eq!(
            generation.preloads["Tag"],
            vec!["Issues".to_string(), "Role".to_string()]
        );
        assert_eq!(generation.schema.statements.len(), 5);
    }

    #[test]
    fn test_generate_is_idempotent() {
        let models = parse_models_str(SCENARIO).unwrap();
        let options = GenerateOptions::default();

        let first = generate(&models.entities, &options, &NoEnums).unwrap();
        let second = generate(&models.entities, &options, &NoEnums).unwrap();
        assert_eq!(first.schema.sql(), second.schema.sql());
        assert_eq!(first.preloads, second.preloads);
    }

    #[test]
    fn test_preload_plan_serializes_to_json() {
        let models = parse_models_str(SCENARIO).unwrap();
        let generation =
            generate(&models.entities, &GenerateOptions::default(), &NoEnums).unwrap();

        let json = serde_json::to_string(&generation.preloads).unwrap();
        assert_eq!(
            json,
            r#"{"Issue":[],"Role":[],"Tag":["Issues","Role"],"User":["Role"]}"#
        );
    }
}
