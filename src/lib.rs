//! # frosta
//!
//! Query compilation for OGC SensorThings services (FROST).
//!
//! Callers describe what they want declaratively ("observations of this
//! datastream, in this window, above this threshold") and frosta turns it
//! into a complete OData request: a `$filter` expression, the sub-resource
//! expansion, ordering and paging.
//!
//! ## Layers
//!
//! - **schema**: the static entity-type graph and its navigation properties
//! - **resolver**: shortest navigation path between two entity types
//! - **query**: constraints in, [`QuerySpec`] out; result collapsing
//! - **service**: optional HTTP execution of a compiled [`QuerySpec`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use frosta::{compile, Constraints, EntityRef, EntityType};
//!
//! let datastream = EntityRef::new(EntityType::Datastream, "DS-1");
//! let spec = compile(
//!     EntityType::Observation,
//!     &Constraints::new()
//!         .related_to(&datastream)
//!         .start("2024-01-01")
//!         .upper_limit(30.0),
//! )?;
//!
//! // 'DS-1' eq Datastream/id and phenomenonTime ge 2024-01-01T00:00:00Z and result lt 30
//! println!("{}", spec.filter().unwrap_or_default());
//! # Ok::<(), frosta::FrostaError>(())
//! ```

pub mod config;
pub mod error;
pub mod query;
pub mod resolver;
pub mod schema;
pub mod service;

// Re-exports for convenience
pub use config::Config;
pub use error::{FrostaError, Result};

pub use query::{
    collapse, compile, Collapsed, Constraint, Constraints, EntityCollection, EntityId, EntityRef,
    FilterClause, Identified, OrderBy, QueryCompiler, QuerySpec, RelationConstraint, TimeValue,
};
pub use resolver::{resolve, resolve_in, NavigationPath, RelationTable};
pub use schema::{EntityType, SchemaGraph};
pub use service::{Entity, FrostClient, HttpExecutor, QueryExecutor};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observations_of_one_datastream() {
        let spec = compile(
            EntityType::Observation,
            &Constraints::new().related(EntityRef::new(EntityType::Datastream, "DS-1")),
        )
        .unwrap();

        assert_eq!(spec.filter().unwrap(), "'DS-1' eq Datastream/id");
        assert!(spec.expand.unwrap().contains("Datastream"));
        assert_eq!(spec.order_by.to_string(), "phenomenonTime asc");
        assert_eq!(spec.entity_set(), "Observations");
    }

    #[test]
    fn test_full_window_query() {
        let spec = compile(
            EntityType::Observation,
            &Constraints::new()
                .related(EntityRef::new(EntityType::Datastream, 7))
                .start("2024-03-01T12:00:00+02:00")
                .end("2024-03-02")
                .lower_limit(-5.5)
                .top(100),
        )
        .unwrap();

        assert_eq!(
            spec.filter().unwrap(),
            "7 eq Datastream/id and phenomenonTime ge 2024-03-01T10:00:00Z \
             and phenomenonTime lt 2024-03-02T00:00:00Z and result ge -5.5"
        );
        let pairs = spec.query_pairs();
        assert!(pairs.contains(&("$top", "100".to_string())));
        assert!(pairs.contains(&("$count", "true".to_string())));
        assert!(!pairs.iter().any(|(k, _)| *k == "$skip"));
    }

    #[test]
    fn test_datastreams_at_a_location_by_name() {
        let spec = compile(
            EntityType::Datastream,
            &Constraints::new()
                .name("*Temperature*")
                .related(EntityRef::new(EntityType::Location, 12)),
        )
        .unwrap();

        assert_eq!(
            spec.filter().unwrap(),
            "substringof('temperature', tolower(name)) and 12 eq Thing/Locations/id"
        );
        assert_eq!(spec.order_by.to_string(), "name asc");
    }

    #[test]
    fn test_compile_errors_are_flagged() {
        let err = compile(
            EntityType::Sensor,
            &Constraints::new().related(EntityRef::new(EntityType::Sensor, 1)),
        )
        .unwrap_err();
        assert!(err.is_compile_error());
    }
}
