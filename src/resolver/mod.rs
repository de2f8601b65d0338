//! Relation-path resolver: finds how to navigate from one entity type to
//! another through the schema graph.
//!
//! The search is an exhaustive depth-first walk. Every acyclic route that
//! reaches the target becomes a candidate; the shortest candidate wins, and
//! among equally short candidates the first one discovered (in schema
//! neighbor order) wins.

pub mod path;
pub mod table;

pub use path::NavigationPath;
pub use table::RelationTable;

use tracing::debug;

use crate::error::{FrostaError, Result};
use crate::schema::{EntityType, SchemaGraph};

/// Resolve a navigation path in the shared SensorThings schema.
pub fn resolve(origin: EntityType, target: EntityType) -> Result<NavigationPath> {
    resolve_in(SchemaGraph::sensor_things(), origin, target)
}

/// Resolve a navigation path in an explicit schema graph.
///
/// Fails with [`FrostaError::Unresolved`] when no route exists, including
/// when `origin == target`.
pub fn resolve_in(
    schema: &SchemaGraph,
    origin: EntityType,
    target: EntityType,
) -> Result<NavigationPath> {
    let candidates = candidate_paths(schema, origin, target);

    debug!(
        %origin,
        %target,
        candidates = candidates.len(),
        "relation path search finished"
    );

    // min_by_key keeps the first of several equal minimums.
    candidates
        .into_iter()
        .min_by_key(NavigationPath::len)
        .ok_or(FrostaError::Unresolved { origin, target })
}

/// Every acyclic path from `origin` to `target`, in discovery order.
pub fn candidate_paths(
    schema: &SchemaGraph,
    origin: EntityType,
    target: EntityType,
) -> Vec<NavigationPath> {
    let mut visited = vec![origin];
    let mut segments = Vec::new();
    let mut solutions = Vec::new();
    search(
        schema,
        origin,
        target,
        &mut visited,
        &mut segments,
        &mut solutions,
    );
    solutions
}

fn search(
    schema: &SchemaGraph,
    current: EntityType,
    target: EntityType,
    visited: &mut Vec<EntityType>,
    segments: &mut Vec<&'static str>,
    solutions: &mut Vec<NavigationPath>,
) {
    if current == target {
        if let Some(path) = NavigationPath::new(segments.clone()) {
            solutions.push(path);
        }
    }

    for relation in schema.relations(current) {
        if visited.contains(&relation.target) {
            continue;
        }
        visited.push(relation.target);
        segments.push(relation.segment);
        search(schema, relation.target, target, visited, segments, solutions);
        segments.pop();
        visited.pop();
    }
}
