//! Schema module: entity types and their navigation relations.
//!
//! The schema is static for the lifetime of the process. Use
//! [`SchemaGraph::sensor_things`] for the shared instance.

pub mod graph;
pub mod types;

pub use graph::{Relation, SchemaGraph};
pub use types::EntityType;
