//! Query module: compiles declarative constraints into SensorThings requests.
//!
//! ## Core API
//!
//! ```ignore
//! let spec = compile(
//!     EntityType::Observation,
//!     &Constraints::new()
//!         .related(EntityRef::new(EntityType::Datastream, "DS-1"))
//!         .start("2024-01-01T00:00:00Z")
//!         .end("2024-02-01T00:00:00Z"),
//! )?;
//! // spec.filter() == "'DS-1' eq Datastream/id and phenomenonTime ge ... and phenomenonTime lt ..."
//! ```

pub mod collapse;
pub mod compile;
pub mod filter;
pub mod spec;
pub mod types;

pub use collapse::{collapse, Collapsed, EntityCollection};
pub use compile::{compile, default_order, expansion_for, QueryCompiler};
pub use filter::{string_filter, Bound, FilterClause, TextMatch};
pub use spec::QuerySpec;
pub use types::{
    Constraint, Constraints, EntityId, EntityRef, Identified, OrderBy, RelationConstraint,
    SortDirection, TextField, TimeValue,
};
