//! Preload Resolver: cycle-safe depth-first traversal of the entity graph
//! producing deduplicated eager-load path sets per root entity.

use crate::graph::{Entity, EntityGraph, Field, Relation};
use std::collections::{BTreeMap, HashSet};

/// Default maximum hop count from a root entity.
pub const DEFAULT_PRELOAD_DEPTH: usize = 3;

/// Resolve the preload plan for every declared entity in the graph.
///
/// Each non-synthesized, non-skipped entity maps to an ordered, deduplicated
/// list of dot-separated relation paths; entities with no relations map to
/// an empty list. Resolution never errors: unresolved relation targets
/// contribute their own segment with no further expansion, and cycles
/// silently terminate the affected branch.
pub fn preload_map(graph: &EntityGraph, max_depth: usize) -> BTreeMap<String, Vec<String>> {
    let mut map = BTreeMap::new();

    for entity in graph.entities() {
        if entity.synthesized || entity.skip {
            continue;
        }
        let mut visited = HashSet::new();
        visited.insert(entity.name.clone());
        let candidates = collect_paths(entity, graph, &mut visited, max_depth);
        map.insert(entity.name.clone(), dedupe_paths(candidates));
    }

    map
}

/// Depth-first path collection. `visited` holds the entity names on the
/// current branch, root included; a relation targeting a visited entity
/// emits its segment but is never expanded. `remaining` is the hop budget:
/// direct segments are always emitted, recursion needs budget left over.
fn collect_paths(
    entity: &Entity,
    graph: &EntityGraph,
    visited: &mut HashSet<String>,
    remaining: usize,
) -> Vec<String> {
    let mut paths = Vec::new();

    for field in &entity.fields {
        let Some(target) = field.relation.target() else {
            continue;
        };
        let segment = path_segment(field);
        paths.push(segment.clone());

        if remaining <= 1 {
            continue;
        }
        let Some(target_entity) = graph.get(target) else {
            continue;
        };
        if !visited.insert(target_entity.name.clone()) {
            continue;
        }
        for child in collect_paths(target_entity, graph, visited, remaining - 1) {
            paths.push(format!("{segment}.{child}"));
        }
        visited.remove(target);
    }

    paths
}

/// The path segment contributed by one relation field. Foreign keys are
/// declared on `…ID`-suffixed scalar columns; the segment is the field name
/// with that suffix stripped (`RoleID` -> `Role`). Other relations use the
/// field name as-is.
fn path_segment(field: &Field) -> String {
    if matches!(field.relation, Relation::ForeignKey { .. }) {
        let stripped = field
            .name
            .strip_suffix("ID")
            .or_else(|| field.name.strip_suffix("Id"));
        if let Some(stripped) = stripped {
            if !stripped.is_empty() {
                return stripped.to_string();
            }
        }
    }
    field.name.clone()
}

/// Apply the subsumption law: a path that is a strict dot-segment prefix of
/// another retained path is redundant, and the longer, more specific path
/// always wins. Candidates are scanned longest-first so an ancestor can
/// never displace a retained descendant; the final list is sorted
/// lexicographically for reproducibility.
pub fn dedupe_paths(mut candidates: Vec<String>) -> Vec<String> {
    candidates.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut retained: Vec<String> = Vec::new();
    'candidates: for candidate in candidates {
        for kept in &retained {
            if *kept == candidate
                || is_segment_extension(kept, &candidate)
                || is_segment_extension(&candidate, kept)
            {
                continue 'candidates;
            }
        }
        retained.push(candidate);
    }

    retained.sort();
    retained
}

/// Whether `long` extends `short` by one or more dot segments.
fn is_segment_extension(long: &str, short: &str) -> bool {
    long.len() > short.len()
        && long.as_bytes()[short.len()] == b'.'
        && long.starts_with(short)
}
