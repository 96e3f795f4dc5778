//! Graph Builder: turns raw per-entity field/rule lists into a resolved
//! entity graph with concrete relation edges, synthesizing join entities
//! for many-to-many relations.

pub mod rules;

pub use rules::{FieldRules, ForeignKeyRule, ReferentialAction};

use crate::error::{RelgenError, Result};
use crate::metadata::{FieldKind, RawEntity, RawField, ScalarKind};
use crate::naming;
use std::collections::{HashMap, HashSet};

/// A resolved data-model entity. `synthesized` marks join entities produced
/// for many-to-many relations; their `name` equals their `table_name`.
#[derive(Debug, Clone)]
pub struct Entity {
    pub name: String,
    pub table_name: String,
    pub fields: Vec<Field>,
    pub skip: bool,
    pub synthesized: bool,
}

/// A resolved field with its typed rule configuration and relation edge.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub column_name: String,
    pub kind: FieldKind,
    pub rules: FieldRules,
    pub relation: Relation,
}

/// A typed link from a field to another entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Relation {
    None,
    ForeignKey {
        target_entity: String,
        target_field: String,
        on_delete: Option<ReferentialAction>,
        on_update: Option<ReferentialAction>,
    },
    ManyToMany {
        target_entity: String,
        join_table: String,
    },
    EmbeddedRef {
        target_entity: String,
    },
}

impl Relation {
    /// The entity this relation points at, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            Relation::None => None,
            Relation::ForeignKey { target_entity, .. }
            | Relation::ManyToMany { target_entity, .. }
            | Relation::EmbeddedRef { target_entity } => Some(target_entity),
        }
    }
}

/// Name-indexed entity graph preserving input declaration order.
/// Synthesized join entities are appended after all declared entities.
#[derive(Debug, Clone, Default)]
pub struct EntityGraph {
    entities: Vec<Entity>,
    index: HashMap<String, usize>,
}

impl EntityGraph {
    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.index.get(name).map(|&i| &self.entities[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Insert an entity, keeping the first definition if the name recurs.
    fn insert(&mut self, entity: Entity) {
        if self.index.contains_key(&entity.name) {
            log::debug!("entity '{}' already resolved, keeping first definition", entity.name);
            return;
        }
        self.index.insert(entity.name.clone(), self.entities.len());
        self.entities.push(entity);
    }
}

/// Build the resolved entity graph from raw metadata.
///
/// Relation targets may be declared later in the input; resolution is
/// order-independent. Fields carrying the skip marker are dropped here and
/// never reach schema or preload processing.
pub fn build_graph(raw: &[RawEntity]) -> Result<EntityGraph> {
    let declared: HashSet<&str> = raw.iter().map(|e| e.name.as_str()).collect();

    let mut graph = EntityGraph::default();
    for raw_entity in raw {
        let entity = build_entity(raw_entity, &declared)?;
        graph.insert(entity);
    }

    // Join entities are synthesized after every declared entity is resolved
    // so owner/target table names are final.
    let joins: Vec<Entity> = graph
        .entities()
        .flat_map(|entity| {
            entity.fields.iter().filter_map(|field| match &field.relation {
                Relation::ManyToMany {
                    target_entity,
                    join_table,
                } => Some(synthesize_join(entity, target_entity, join_table)),
                _ => None,
            })
        })
        .collect();
    for join in joins {
        graph.insert(join);
    }

    Ok(graph)
}

fn build_entity(raw: &RawEntity, declared: &HashSet<&str>) -> Result<Entity> {
    let table_name = naming::table_name(&raw.name);
    let mut fields = Vec::with_capacity(raw.fields.len());

    for raw_field in &raw.fields {
        let rules = rules::parse_rules(&raw.name, &raw_field.name, &raw_field.rules)?;
        if rules.skip {
            continue;
        }

        let column_name = raw_field
            .column
            .clone()
            .unwrap_or_else(|| naming::column_name(&raw_field.name));
        let relation = resolve_relation(raw, raw_field, &table_name, &rules, declared)?;

        fields.push(Field {
            name: raw_field.name.clone(),
            column_name,
            kind: raw_field.kind.clone(),
            rules,
            relation,
        });
    }

    Ok(Entity {
        name: raw.name.clone(),
        table_name,
        fields,
        skip: raw.skip,
        synthesized: false,
    })
}

fn resolve_relation(
    raw_entity: &RawEntity,
    raw_field: &RawField,
    owner_table: &str,
    rules: &FieldRules,
    declared: &HashSet<&str>,
) -> Result<Relation> {
    if let Some(fk) = &rules.foreign_key {
        return Ok(Relation::ForeignKey {
            target_entity: fk.target_entity.clone(),
            target_field: fk.target_field.clone(),
            on_delete: rules.on_delete,
            on_update: rules.on_update,
        });
    }

    if let Some(target) = &rules.many_to_many {
        let join_table = format!("{owner_table}_{}", naming::column_name(&raw_field.name));
        return Ok(Relation::ManyToMany {
            target_entity: target.clone(),
            join_table,
        });
    }

    if let FieldKind::Named(name) = &raw_field.kind {
        if rules.embedded || declared.contains(name.as_str()) {
            return Ok(Relation::EmbeddedRef {
                target_entity: name.clone(),
            });
        }
    } else if rules.embedded {
        return Err(RelgenError::Configuration {
            entity: raw_entity.name.clone(),
            field: raw_field.name.clone(),
            message: "'ref' requires a named entity type".to_string(),
        });
    }

    Ok(Relation::None)
}

/// Synthesize the join entity for a many-to-many relation: two required
/// bigint foreign-key columns named after the singularized owner and target
/// table names, and a composite primary key over both.
fn synthesize_join(owner: &Entity, target_entity: &str, join_table: &str) -> Entity {
    let target_table = naming::table_name(target_entity);
    let owner_column = format!("{}_id", naming::singularize(&owner.table_name));
    let target_column = format!("{}_id", naming::singularize(&target_table));

    let key_rules = FieldRules {
        primary_key: true,
        ..FieldRules::default()
    };

    let fields = vec![
        Field {
            name: owner_column.clone(),
            column_name: owner_column,
            kind: FieldKind::Scalar(ScalarKind::Int64),
            rules: key_rules.clone(),
            relation: Relation::ForeignKey {
                target_entity: owner.name.clone(),
                target_field: "ID".to_string(),
                on_delete: None,
                on_update: None,
            },
        },
        Field {
            name: target_column.clone(),
            column_name: target_column,
            kind: FieldKind::Scalar(ScalarKind::Int64),
            rules: key_rules,
            relation: Relation::ForeignKey {
                target_entity: target_entity.to_string(),
                target_field: "ID".to_string(),
                on_delete: None,
                on_update: None,
            },
        },
    ];

    Entity {
        name: join_table.to_string(),
        table_name: join_table.to_string(),
        fields,
        skip: false,
        synthesized: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::parse_models_str;

    fn graph_from(yaml: &str) -> EntityGraph {
        let models = parse_models_str(yaml).unwrap();
        build_graph(&models.entities).unwrap()
    }

    #[test]
    fn test_foreign_key_edge_resolves_to_later_entity() {
        let graph = graph_from(
            r#"
entities:
  - name: User
    fields:
      - { name: ID, type: int, rules: "primaryKey" }
      - { name: RoleID, type: int64, rules: "foreignKey:Role.ID" }
  - name: Role
    fields:
      - { name: ID, type: int64 }
"#,
        );

        let user = graph.get("User").unwrap();
        let role_id = &user.fields[1];
        assert_eq!(
            role_id.relation,
            Relation::ForeignKey {
                target_entity: "Role".to_string(),
                target_field: "ID".to_string(),
                on_delete: None,
                on_update: None,
            }
        );
        assert!(graph.contains("Role"));
    }

    #[test]
    fn test_many_to_many_synthesizes_join_entity() {
        let graph = graph_from(
            r#"
entities:
  - name: Tag
    fields:
      - { name: ID, type: int64 }
      - { name: Issues, type: Issue, rules: "many2many:Issue" }
  - name: Issue
    fields:
      - { name: ID, type: int64 }
"#,
        );

        let join = graph.get("tags_issues").unwrap();
        assert!(join.synthesized);
        assert_eq!(join.table_name, "tags_issues");
        assert_eq!(join.fields.len(), 2);
        assert_eq!(join.fields[0].column_name, "tag_id");
        assert_eq!(join.fields[1].column_name, "issue_id");
        assert!(join.fields.iter().all(|f| f.rules.primary_key));
        assert_eq!(join.fields[0].relation.target(), Some("Tag"));
        assert_eq!(join.fields[1].relation.target(), Some("Issue"));
    }

    #[test]
    fn test_bare_entity_reference_becomes_embedded_ref() {
        let graph = graph_from(
            r#"
entities:
  - name: Question
    fields:
      - { name: ID, type: int }
      - { name: Comments, type: Comment }
  - name: Comment
    fields:
      - { name: ID, type: int }
"#,
        );

        let question = graph.get("Question").unwrap();
        assert_eq!(
            question.fields[1].relation,
            Relation::EmbeddedRef {
                target_entity: "Comment".to_string()
            }
        );
    }

    #[test]
    fn test_named_kind_without_entity_stays_unrelated() {
        // "Sex" is an enum type reference: no relation edge, resolved later
        // by the schema enum resolver.
        let graph = graph_from(
            r#"
entities:
  - name: Role
    fields:
      - { name: ID, type: int64 }
      - { name: Gender, type: Sex }
"#,
        );
        assert_eq!(graph.get("Role").unwrap().fields[1].relation, Relation::None);
    }

    #[test]
    fn test_skip_marker_drops_field() {
        let graph = graph_from(
            r#"
entities:
  - name: User
    fields:
      - { name: ID, type: int }
      - { name: Cached, type: text, rules: "-" }
"#,
        );
        let user = graph.get("User").unwrap();
        assert_eq!(user.fields.len(), 1);
        assert_eq!(user.fields[0].name, "ID");
    }

    #[test]
    fn test_entity_skip_flag_is_preserved() {
        let graph = graph_from(
            r#"
entities:
  - name: AuditLog
    skip: true
    fields:
      - { name: ID, type: int }
"#,
        );
        assert!(graph.get("AuditLog").unwrap().skip);
    }

    #[test]
    fn test_malformed_foreign_key_aborts_build() {
        let models = parse_models_str(
            r#"
entities:
  - name: User
    fields:
      - { name: RoleID, type: int64, rules: "foreignKey:Role" }
"#,
        )
        .unwrap();
        assert!(build_graph(&models.entities).is_err());
    }

    #[test]
    fn test_shared_join_target_resolved_once() {
        let graph = graph_from(
            r#"
entities:
  - name: Post
    fields:
      - { name: ID, type: int64 }
      - { name: Tags, type: Tag, rules: "many2many:Tag" }
  - name: Page
    fields:
      - { name: ID, type: int64 }
      - { name: Tags, type: Tag, rules: "many2many:Tag" }
  - name: Tag
    fields:
      - { name: ID, type: int64 }
"#,
        );

        // One Tag entity, one join entity per owning relation.
        assert_eq!(graph.len(), 5);
        assert!(graph.contains("posts_tags"));
        assert!(graph.contains("pages_tags"));
    }
}
