//! Query compiler: constraints in, [`QuerySpec`] out.
//!
//! Each constraint compiles on its own; the results are AND-ed in the order
//! the constraints were given. Relation constraints go through the
//! relation-path resolver, and an unreachable relation aborts the whole
//! compilation instead of being dropped.

use tracing::debug;

use super::filter::{Bound, FilterClause};
use super::spec::QuerySpec;
use super::types::{Constraint, Constraints, EntityId, OrderBy, RelationConstraint};
use crate::error::{FrostaError, Result};
use crate::resolver::{resolve_in, NavigationPath, RelationTable};
use crate::schema::{EntityType, SchemaGraph};

const DATASTREAM_EXPAND: &str = "Thing($select=@iot.id),\
Thing/Locations($select=@iot.id,name,location),\
ObservedProperty($select=@iot.id,name)";

const OBSERVATION_EXPAND: &str = "Datastream($select=@iot.id)";

/// Sub-resources fetched eagerly with each entity type.
pub fn expansion_for(entity_type: EntityType) -> Option<&'static str> {
    match entity_type {
        EntityType::Datastream => Some(DATASTREAM_EXPAND),
        EntityType::Observation => Some(OBSERVATION_EXPAND),
        _ => None,
    }
}

/// Ordering used when the caller gives none.
pub fn default_order(entity_type: EntityType) -> OrderBy {
    match entity_type {
        EntityType::Observation => OrderBy::ascending("phenomenonTime"),
        _ => OrderBy::ascending("name"),
    }
}

/// Compiles constraints against a schema, optionally through a precomputed
/// relation table.
pub struct QueryCompiler<'s> {
    schema: &'s SchemaGraph,
    table: Option<&'s RelationTable>,
}

impl<'s> QueryCompiler<'s> {
    pub fn new(schema: &'s SchemaGraph) -> Self {
        Self {
            schema,
            table: None,
        }
    }

    /// Serve relation lookups from `table` instead of searching each time.
    pub fn with_table(mut self, table: &'s RelationTable) -> Self {
        self.table = Some(table);
        self
    }

    pub fn compile(&self, entity_type: EntityType, constraints: &Constraints) -> Result<QuerySpec> {
        if entity_type.is_multi_valued() {
            return Err(FrostaError::InvalidSchema(entity_type.to_string()));
        }

        let mut filters = Vec::new();
        for constraint in constraints.items() {
            self.compile_constraint(entity_type, constraint, &mut filters)?;
        }

        let spec = QuerySpec {
            entity_type,
            filters,
            expand: expansion_for(entity_type),
            order_by: constraints
                .order()
                .cloned()
                .unwrap_or_else(|| default_order(entity_type)),
            skip: constraints.skip_count(),
            top: constraints.top_count(),
        };

        debug!(
            entity = %entity_type,
            clauses = spec.filters.len(),
            "query compiled"
        );
        Ok(spec)
    }

    fn compile_constraint(
        &self,
        entity_type: EntityType,
        constraint: &Constraint,
        out: &mut Vec<FilterClause>,
    ) -> Result<()> {
        match constraint {
            Constraint::Text { field, pattern } => {
                if !pattern.is_empty() {
                    out.push(FilterClause::text(field.as_str(), pattern));
                }
            }
            Constraint::Start(at) => out.push(FilterClause::phenomenon_time(Bound::Lower, at)?),
            Constraint::End(at) => out.push(FilterClause::phenomenon_time(Bound::Upper, at)?),
            Constraint::LowerLimit(v) => out.push(FilterClause::result(Bound::Lower, *v)?),
            Constraint::UpperLimit(v) => out.push(FilterClause::result(Bound::Upper, *v)?),
            Constraint::Related(relation) => {
                out.extend(self.relation_clauses(entity_type, relation)?);
            }
            Constraint::Filter(expression) => {
                if !expression.trim().is_empty() {
                    out.push(FilterClause::Raw(expression.clone()));
                }
            }
        }
        Ok(())
    }

    /// One clause per referenced entity type, in order of first appearance.
    fn relation_clauses(
        &self,
        origin: EntityType,
        relation: &RelationConstraint,
    ) -> Result<Vec<FilterClause>> {
        let refs = relation.refs();
        if refs.is_empty() {
            return Err(FrostaError::FilterConstruction(format!(
                "relation constraint on {} names no entities",
                origin
            )));
        }

        let mut groups: Vec<(EntityType, Vec<EntityId>)> = Vec::new();
        for r in refs {
            match groups.iter_mut().find(|(ty, _)| *ty == r.entity_type) {
                Some((_, ids)) => ids.push(r.id.clone()),
                None => groups.push((r.entity_type, vec![r.id.clone()])),
            }
        }

        groups
            .into_iter()
            .map(|(target, ids)| {
                let path = self.path(origin, target).map_err(|e| {
                    FrostaError::FilterConstruction(format!(
                        "cannot relate {} to {}: {}",
                        origin, target, e
                    ))
                })?;
                FilterClause::related(path, ids)
            })
            .collect()
    }

    fn path(&self, origin: EntityType, target: EntityType) -> Result<NavigationPath> {
        match self.table {
            Some(table) => table.get(origin, target).cloned(),
            None => resolve_in(self.schema, origin, target),
        }
    }
}

/// Compile against the shared SensorThings schema.
pub fn compile(entity_type: EntityType, constraints: &Constraints) -> Result<QuerySpec> {
    QueryCompiler::new(SchemaGraph::sensor_things()).compile(entity_type, constraints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::types::EntityRef;

    #[test]
    fn test_observation_defaults() {
        let spec = compile(EntityType::Observation, &Constraints::new()).unwrap();
        assert!(spec.filters.is_empty());
        assert_eq!(spec.filter(), None);
        assert_eq!(spec.expand, Some("Datastream($select=@iot.id)"));
        assert_eq!(spec.order_by.to_string(), "phenomenonTime asc");
        assert_eq!(spec.skip, None);
        assert_eq!(spec.top, None);
    }

    #[test]
    fn test_datastream_expansion() {
        let spec = compile(EntityType::Datastream, &Constraints::new()).unwrap();
        assert_eq!(
            spec.expand,
            Some(
                "Thing($select=@iot.id),Thing/Locations($select=@iot.id,name,location),\
                 ObservedProperty($select=@iot.id,name)"
            )
        );
        assert_eq!(spec.order_by.to_string(), "name asc");
    }

    #[test]
    fn test_other_types_expand_nothing() {
        for ty in [
            EntityType::Location,
            EntityType::Thing,
            EntityType::Sensor,
            EntityType::ObservedProperty,
        ] {
            let spec = compile(ty, &Constraints::new()).unwrap();
            assert_eq!(spec.expand, None, "{}", ty);
            assert_eq!(spec.order_by, OrderBy::ascending("name"));
        }
    }

    #[test]
    fn test_empty_text_is_skipped() {
        let spec = compile(
            EntityType::Thing,
            &Constraints::new().id("").name("").description("*lab*"),
        )
        .unwrap();
        assert_eq!(
            spec.filter().unwrap(),
            "substringof('lab', tolower(description))"
        );
    }

    #[test]
    fn test_clauses_keep_supplied_order() {
        let spec = compile(
            EntityType::Observation,
            &Constraints::new()
                .upper_limit(30.0)
                .related(EntityRef::new(EntityType::Datastream, 3))
                .start("2024-01-01T00:00:00Z"),
        )
        .unwrap();
        assert_eq!(
            spec.filter().unwrap(),
            "result lt 30 and 3 eq Datastream/id and phenomenonTime ge 2024-01-01T00:00:00Z"
        );
    }

    #[test]
    fn test_collection_groups_by_type() {
        let relation = vec![
            EntityRef::new(EntityType::Datastream, "a"),
            EntityRef::new(EntityType::Thing, "t"),
            EntityRef::new(EntityType::Datastream, "b"),
        ];
        let spec = compile(EntityType::Observation, &Constraints::new().related(relation)).unwrap();
        assert_eq!(
            spec.filter().unwrap(),
            "('a' eq Datastream/id or 'b' eq Datastream/id) and 't' eq Datastream/Thing/id"
        );
    }

    #[test]
    fn test_unresolved_relation_fails_compilation() {
        let err = compile(
            EntityType::Thing,
            &Constraints::new()
                .name("x")
                .related(EntityRef::new(EntityType::Thing, 1)),
        )
        .unwrap_err();
        assert!(matches!(err, FrostaError::FilterConstruction(_)));
    }

    #[test]
    fn test_empty_collection_fails_compilation() {
        let err = compile(
            EntityType::Sensor,
            &Constraints::new().related(Vec::<EntityRef>::new()),
        )
        .unwrap_err();
        assert!(matches!(err, FrostaError::FilterConstruction(_)));
    }

    #[test]
    fn test_bad_time_fails_compilation() {
        let err = compile(EntityType::Observation, &Constraints::new().end("yesterday")).unwrap_err();
        assert!(matches!(err, FrostaError::FilterConstruction(_)));
    }

    #[test]
    fn test_overrides_pass_through() {
        let spec = compile(
            EntityType::Observation,
            &Constraints::new()
                .filter("result gt 0")
                .order_by("phenomenonTime desc")
                .skip(100)
                .top(50),
        )
        .unwrap();
        assert_eq!(spec.filter().unwrap(), "result gt 0");
        assert_eq!(spec.order_by.to_string(), "phenomenonTime desc");
        assert_eq!(spec.skip, Some(100));
        assert_eq!(spec.top, Some(50));
    }

    #[test]
    fn test_table_backed_compiler_matches_live() {
        let schema = SchemaGraph::new();
        let table = RelationTable::build(&schema);
        let constraints =
            Constraints::new().related(EntityRef::new(EntityType::Location, "loc-1"));

        let live = QueryCompiler::new(&schema)
            .compile(EntityType::Sensor, &constraints)
            .unwrap();
        let cached = QueryCompiler::new(&schema)
            .with_table(&table)
            .compile(EntityType::Sensor, &constraints)
            .unwrap();
        assert_eq!(live, cached);
        assert_eq!(
            live.filter().unwrap(),
            "'loc-1' eq Datastreams/Thing/Locations/id"
        );
    }

    #[test]
    fn test_multi_datastream_queries_are_rejected() {
        assert!(matches!(
            compile(EntityType::MultiDatastream, &Constraints::new()),
            Err(FrostaError::InvalidSchema(_))
        ));
    }
}
