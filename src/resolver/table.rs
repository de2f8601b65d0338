//! Precomputed relation table.
//!
//! Resolves every pair of traversable entity types once and answers later
//! lookups from memory. Lookups return exactly what [`super::resolve_in`]
//! would.

use std::collections::BTreeMap;
use tracing::debug;

use super::{resolve_in, NavigationPath};
use crate::error::{FrostaError, Result};
use crate::schema::{EntityType, SchemaGraph};

pub struct RelationTable {
    paths: BTreeMap<(EntityType, EntityType), NavigationPath>,
}

impl RelationTable {
    pub fn build(schema: &SchemaGraph) -> Self {
        let types: Vec<EntityType> = schema.traversable_types().collect();
        let mut paths = BTreeMap::new();

        for &origin in &types {
            for &target in &types {
                if let Ok(path) = resolve_in(schema, origin, target) {
                    paths.insert((origin, target), path);
                }
            }
        }

        debug!(entries = paths.len(), "relation table built");
        Self { paths }
    }

    pub fn get(&self, origin: EntityType, target: EntityType) -> Result<&NavigationPath> {
        self.paths
            .get(&(origin, target))
            .ok_or(FrostaError::Unresolved { origin, target })
    }

    /// All resolvable pairs, ordered by origin then target.
    pub fn iter(&self) -> impl Iterator<Item = (EntityType, EntityType, &NavigationPath)> + '_ {
        self.paths.iter().map(|(&(o, t), p)| (o, t, p))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_matches_live_resolution() {
        let schema = SchemaGraph::new();
        let table = RelationTable::build(&schema);

        for origin in EntityType::ALL {
            for target in EntityType::ALL {
                let live = resolve_in(&schema, origin, target).ok();
                let cached = table.get(origin, target).ok().cloned();
                assert_eq!(live, cached, "{} -> {}", origin, target);
            }
        }
    }

    #[test]
    fn test_every_distinct_traversable_pair_is_connected() {
        let schema = SchemaGraph::new();
        let table = RelationTable::build(&schema);
        let n = schema.traversable_types().count();
        assert_eq!(table.len(), n * (n - 1));
        assert!(table.iter().all(|(o, t, _)| o != t));
    }
}
