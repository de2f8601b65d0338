//! The static SensorThings schema as a petgraph directed graph.
//!
//! Nodes are entity types; each edge is one navigation property and carries
//! the property name (`Things`, `Datastream`, ...) as its weight. Edge
//! insertion order is the schema order and is what neighbor iteration
//! follows.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

use super::types::EntityType;
use crate::error::{FrostaError, Result};

/// Navigation properties per entity type, in schema order.
const RELATIONS: &[(EntityType, &[(&str, EntityType)])] = &[
    (
        EntityType::Location,
        &[
            ("Things", EntityType::Thing),
            ("HistoricalLocations", EntityType::HistoricalLocation),
        ],
    ),
    (
        EntityType::Thing,
        &[
            ("Locations", EntityType::Location),
            ("HistoricalLocations", EntityType::HistoricalLocation),
            ("Datastreams", EntityType::Datastream),
            ("MultiDatastreams", EntityType::MultiDatastream),
        ],
    ),
    (
        EntityType::HistoricalLocation,
        &[
            ("Thing", EntityType::Thing),
            ("Locations", EntityType::Location),
        ],
    ),
    (
        EntityType::Datastream,
        &[
            ("Thing", EntityType::Thing),
            ("Sensor", EntityType::Sensor),
            ("ObservedProperty", EntityType::ObservedProperty),
            ("Observations", EntityType::Observation),
        ],
    ),
    (
        EntityType::MultiDatastream,
        &[
            ("Thing", EntityType::Thing),
            ("Sensor", EntityType::Sensor),
            ("ObservedProperties", EntityType::ObservedProperty),
            ("Observations", EntityType::Observation),
        ],
    ),
    (
        EntityType::Sensor,
        &[
            ("Datastreams", EntityType::Datastream),
            ("MultiDatastreams", EntityType::MultiDatastream),
        ],
    ),
    (
        EntityType::ObservedProperty,
        &[
            ("Datastreams", EntityType::Datastream),
            ("MultiDatastreams", EntityType::MultiDatastream),
        ],
    ),
    (
        EntityType::Observation,
        &[
            ("Datastream", EntityType::Datastream),
            ("MultiDatastream", EntityType::MultiDatastream),
            ("FeatureOfInterest", EntityType::FeatureOfInterest),
        ],
    ),
    (
        EntityType::FeatureOfInterest,
        &[("Observations", EntityType::Observation)],
    ),
];

/// One traversable navigation property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    /// Navigation property name, used as a path segment.
    pub segment: &'static str,
    pub target: EntityType,
}

/// Read-only view of the entity schema.
pub struct SchemaGraph {
    graph: DiGraph<EntityType, &'static str>,
    index: HashMap<EntityType, NodeIndex>,
}

impl SchemaGraph {
    /// Build the SensorThings schema.
    pub fn new() -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();

        for ty in EntityType::ALL {
            index.insert(ty, graph.add_node(ty));
        }
        for (origin, relations) in RELATIONS {
            for (segment, target) in relations.iter() {
                graph.add_edge(index[origin], index[target], *segment);
            }
        }

        debug!(
            types = graph.node_count(),
            relations = graph.edge_count(),
            "schema graph built"
        );

        Self { graph, index }
    }

    /// The process-wide schema, built on first use.
    pub fn sensor_things() -> &'static SchemaGraph {
        static SCHEMA: OnceLock<SchemaGraph> = OnceLock::new();
        SCHEMA.get_or_init(SchemaGraph::new)
    }

    /// Navigation properties of `ty` in schema order, without the
    /// multi-valued variant. The variant itself has no traversable relations.
    pub fn relations(&self, ty: EntityType) -> Vec<Relation> {
        if ty.is_multi_valued() {
            return Vec::new();
        }
        let Some(&node) = self.index.get(&ty) else {
            return Vec::new();
        };

        // petgraph yields outgoing edges newest first; restore insertion order.
        let mut edges: Vec<_> = self.graph.edges(node).collect();
        edges.sort_by_key(|e| e.id());

        edges
            .into_iter()
            .map(|e| Relation {
                segment: *e.weight(),
                target: self.graph[e.target()],
            })
            .filter(|r| !r.target.is_multi_valued())
            .collect()
    }

    /// Directly reachable entity types, in schema order.
    pub fn neighbors(&self, ty: EntityType) -> Vec<EntityType> {
        self.relations(ty).into_iter().map(|r| r.target).collect()
    }

    /// Navigation property leading from `from` directly to `to`, if any.
    pub fn segment(&self, from: EntityType, to: EntityType) -> Option<&'static str> {
        self.relations(from)
            .into_iter()
            .find(|r| r.target == to)
            .map(|r| r.segment)
    }

    pub fn plural_of(&self, ty: EntityType) -> &'static str {
        ty.plural()
    }

    /// Normalize a singular or plural spelling to its entity type.
    pub fn singular_of(&self, name: &str) -> Result<EntityType> {
        EntityType::from_name(name).ok_or_else(|| FrostaError::InvalidSchema(name.to_string()))
    }

    /// All entity types that take part in path search.
    pub fn traversable_types(&self) -> impl Iterator<Item = EntityType> + '_ {
        self.graph
            .node_indices()
            .map(|idx| self.graph[idx])
            .filter(|ty| !ty.is_multi_valued())
    }
}

impl Default for SchemaGraph {
    fn default() -> Self {
        Self::new()
    }
}
