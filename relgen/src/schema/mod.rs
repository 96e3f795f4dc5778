//! Schema Derivation: traverses the entity graph to emit column and
//! constraint definitions and dependency-ordered schema statements,
//! including synthesized join tables.

pub mod types;

pub use types::{
    ColumnDef, EnumCatalog, EnumDef, EnumResolver, ForeignKeyRef, NoEnums, SchemaSet, Statement,
    StatementKind, Table, TypeMap,
};

use crate::error::{RelgenError, Result};
use crate::graph::{Entity, EntityGraph, Field, Relation};
use crate::metadata::FieldKind;
use crate::naming;
use std::collections::{BTreeMap, HashSet};

/// Derives schema statements and the structured table map from an entity
/// graph. The builder owns the run-scoped set of already-emitted table
/// names; `generate` consumes it so state can never leak across runs.
pub struct SchemaBuilder<'a> {
    type_map: &'a TypeMap,
    enums: &'a dyn EnumResolver,
    processed: HashSet<String>,
    enum_decls: BTreeMap<String, Vec<String>>,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(type_map: &'a TypeMap, enums: &'a dyn EnumResolver) -> Self {
        SchemaBuilder {
            type_map,
            enums,
            processed: HashSet::new(),
            enum_decls: BTreeMap::new(),
        }
    }

    /// Emit the full schema for the graph: deduplicated enum type
    /// declarations first, then table statements ordered by the dependency
    /// heuristic (no foreign keys first, composite primary keys last).
    pub fn generate(mut self, graph: &EntityGraph) -> Result<SchemaSet> {
        let mut table_statements = Vec::new();
        let mut tables = BTreeMap::new();

        for entity in graph.entities() {
            self.emit_entity(entity, graph, &mut table_statements, &mut tables)?;
        }

        // Stable: input order is preserved within each bucket.
        table_statements.sort_by_key(|s| (s.has_foreign_key, s.composite_primary_key));

        let mut statements: Vec<Statement> = self
            .enum_decls
            .iter()
            .map(|(wire_type, values)| Statement {
                kind: StatementKind::EnumType,
                sql: format!("CREATE TYPE {wire_type} AS ENUM ({});", quote_values(values)),
                has_foreign_key: false,
                composite_primary_key: false,
            })
            .collect();
        statements.extend(table_statements);

        Ok(SchemaSet { statements, tables })
    }

    fn emit_entity(
        &mut self,
        entity: &Entity,
        graph: &EntityGraph,
        out: &mut Vec<Statement>,
        tables: &mut BTreeMap<String, Table>,
    ) -> Result<()> {
        if entity.skip {
            return Ok(());
        }
        if !self.processed.insert(entity.table_name.clone()) {
            log::debug!("table '{}' already emitted, skipping", entity.table_name);
            return Ok(());
        }

        let mut column_defs: Vec<String> = Vec::new();
        let mut columns: Vec<ColumnDef> = Vec::new();
        let mut primary_keys: Vec<String> = Vec::new();
        let mut unique_columns: Vec<String> = Vec::new();
        let mut named_constraints: Vec<String> = Vec::new();
        let mut fk_clauses: Vec<String> = Vec::new();
        let mut foreign_keys: Vec<ForeignKeyRef> = Vec::new();

        for field in &entity.fields {
            match &field.relation {
                Relation::ManyToMany {
                    target_entity,
                    join_table,
                } => {
                    if let Some(target) = graph.get(target_entity) {
                        self.emit_entity(target, graph, out, tables)?;
                    }
                    if let Some(join) = graph.get(join_table) {
                        self.emit_entity(join, graph, out, tables)?;
                    }
                    continue;
                }
                Relation::EmbeddedRef { target_entity } => {
                    if let Some(target) = graph.get(target_entity) {
                        self.emit_entity(target, graph, out, tables)?;
                    }
                    continue;
                }
                _ => {}
            }

            let mut sql_type = self.column_type(entity, field)?;
            if field.rules.auto_increment && field.rules.type_override.is_none() {
                sql_type = if sql_type == "bigint" {
                    "bigserial".to_string()
                } else {
                    "serial".to_string()
                };
            }

            let mut def = format!("{} {}", field.column_name, sql_type);
            def.push_str(if field.rules.nullable { " NULL" } else { " NOT NULL" });
            if let Some(value) = &field.rules.default_value {
                def.push_str(&format!(" DEFAULT {value}"));
            }
            if let Some(expr) = &field.rules.check {
                def.push_str(&format!(" CHECK {expr}"));
            }
            if let Some(expr) = &field.rules.constraint {
                def.push_str(&format!(" CONSTRAINT {expr}"));
            }
            column_defs.push(def);
            columns.push(ColumnDef {
                name: field.name.clone(),
                column_name: field.column_name.clone(),
                sql_type,
                nullable: field.rules.nullable,
                default_value: field.rules.default_value.clone(),
            });

            if field.rules.primary_key || field.rules.auto_increment {
                primary_keys.push(field.column_name.clone());
            }
            if field.rules.unique {
                unique_columns.push(field.column_name.clone());
            }
            if field.rules.unique_index {
                let name = field.rules.unique_index_name.clone().unwrap_or_else(|| {
                    format!("unique_{}_{}", entity.table_name, field.column_name)
                });
                named_constraints.push(format!(
                    "CONSTRAINT {name} UNIQUE ({})",
                    field.column_name
                ));
            }

            if let Relation::ForeignKey {
                target_entity,
                target_field,
                on_delete,
                on_update,
            } = &field.relation
            {
                let referenced_table = graph
                    .get(target_entity)
                    .map(|e| e.table_name.clone())
                    .unwrap_or_else(|| naming::table_name(target_entity));
                let referenced_column = naming::column_name(target_field);

                let mut clause = format!(
                    "FOREIGN KEY ({}) REFERENCES {referenced_table}({referenced_column})",
                    field.column_name
                );
                if let Some(action) = on_delete {
                    clause.push_str(&format!(" ON DELETE {}", action.as_sql()));
                }
                if let Some(action) = on_update {
                    clause.push_str(&format!(" ON UPDATE {}", action.as_sql()));
                }
                fk_clauses.push(clause);
                foreign_keys.push(ForeignKeyRef {
                    column: field.column_name.clone(),
                    referenced_table,
                    referenced_column,
                });
            }
        }

        // No explicit primary key: a column literally named `id` becomes
        // the implicit one.
        if primary_keys.is_empty() && columns.iter().any(|c| c.column_name == "id") {
            primary_keys.push("id".to_string());
        }

        let mut parts = column_defs;
        if !primary_keys.is_empty() {
            parts.push(format!("PRIMARY KEY({})", primary_keys.join(", ")));
        }
        if !unique_columns.is_empty() {
            parts.push(format!("UNIQUE({})", unique_columns.join(", ")));
        }
        parts.extend(named_constraints);
        let has_foreign_key = !fk_clauses.is_empty();
        parts.extend(fk_clauses);

        out.push(Statement {
            kind: StatementKind::Table,
            sql: format!(
                "CREATE TABLE IF NOT EXISTS {} ({});",
                entity.table_name,
                parts.join(", ")
            ),
            has_foreign_key,
            composite_primary_key: primary_keys.len() > 1,
        });
        tables.insert(
            entity.name.clone(),
            Table {
                table_name: entity.table_name.clone(),
                primary_key: primary_keys,
                fields: columns,
                foreign_keys,
            },
        );

        Ok(())
    }

    /// Column type precedence: explicit override > enum wire type >
    /// semantic scalar mapping. An unresolved type is fatal.
    fn column_type(&mut self, entity: &Entity, field: &Field) -> Result<String> {
        if let Some(override_type) = &field.rules.type_override {
            return Ok(override_type.clone());
        }

        match &field.kind {
            FieldKind::Scalar(kind) => self
                .type_map
                .resolve(*kind)
                .map(str::to_string)
                .ok_or_else(|| RelgenError::Configuration {
                    entity: entity.name.clone(),
                    field: field.name.clone(),
                    message: format!("no schema type mapping for scalar kind '{kind:?}'"),
                }),
            FieldKind::Named(name) => match self.enums.resolve(name) {
                Some(def) => {
                    match self.enum_decls.get(&def.wire_type) {
                        Some(existing) if *existing != def.values => {
                            log::warn!(
                                "conflicting value lists for enum type '{}'",
                                def.wire_type
                            );
                        }
                        _ => {
                            self.enum_decls.insert(def.wire_type.clone(), def.values);
                        }
                    }
                    Ok(def.wire_type)
                }
                None => Err(RelgenError::Configuration {
                    entity: entity.name.clone(),
                    field: field.name.clone(),
                    message: format!("type '{name}' has no semantic or enum mapping"),
                }),
            },
        }
    }
}

fn quote_values(values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("'{v}'"))
        .collect::<Vec<_>>()
        .join(", ")
}
