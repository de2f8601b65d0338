//! Typed query entry points.
//!
//! Every entry point compiles its constraints, hands the [`QuerySpec`] to the
//! executor and collapses the result. Plural forms return the collapsed
//! outcome; singular forms return the first entity, if any.

use tracing::debug;

use super::entity::Entity;
use super::executor::{HttpExecutor, QueryExecutor};
use crate::config::Config;
use crate::error::Result;
use crate::query::{collapse, Collapsed, Constraints, QueryCompiler, QuerySpec};
use crate::schema::{EntityType, SchemaGraph};

pub struct FrostClient<E = HttpExecutor> {
    executor: E,
    schema: &'static SchemaGraph,
}

impl FrostClient<HttpExecutor> {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(HttpExecutor::from_config(config)?))
    }
}

impl<E: QueryExecutor> FrostClient<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            schema: SchemaGraph::sensor_things(),
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Compile without executing.
    pub fn compile(&self, entity_type: EntityType, constraints: &Constraints) -> Result<QuerySpec> {
        QueryCompiler::new(self.schema).compile(entity_type, constraints)
    }

    pub fn query(&self, entity_type: EntityType, constraints: &Constraints) -> Result<Collapsed<Entity>> {
        let spec = self.compile(entity_type, constraints)?;
        let collection = self.executor.execute(&spec)?;
        debug!(
            entity = %entity_type,
            count = collection.len(),
            total = ?collection.total_count,
            "query returned"
        );
        Ok(collapse(collection))
    }

    pub fn query_one(&self, entity_type: EntityType, constraints: &Constraints) -> Result<Option<Entity>> {
        Ok(self.query(entity_type, constraints)?.first())
    }

    pub fn locations(&self, constraints: &Constraints) -> Result<Collapsed<Entity>> {
        self.query(EntityType::Location, constraints)
    }

    pub fn location(&self, constraints: &Constraints) -> Result<Option<Entity>> {
        self.query_one(EntityType::Location, constraints)
    }

    pub fn things(&self, constraints: &Constraints) -> Result<Collapsed<Entity>> {
        self.query(EntityType::Thing, constraints)
    }

    pub fn thing(&self, constraints: &Constraints) -> Result<Option<Entity>> {
        self.query_one(EntityType::Thing, constraints)
    }

    pub fn datastreams(&self, constraints: &Constraints) -> Result<Collapsed<Entity>> {
        self.query(EntityType::Datastream, constraints)
    }

    pub fn datastream(&self, constraints: &Constraints) -> Result<Option<Entity>> {
        self.query_one(EntityType::Datastream, constraints)
    }

    pub fn sensors(&self, constraints: &Constraints) -> Result<Collapsed<Entity>> {
        self.query(EntityType::Sensor, constraints)
    }

    pub fn sensor(&self, constraints: &Constraints) -> Result<Option<Entity>> {
        self.query_one(EntityType::Sensor, constraints)
    }

    pub fn observed_properties(&self, constraints: &Constraints) -> Result<Collapsed<Entity>> {
        self.query(EntityType::ObservedProperty, constraints)
    }

    pub fn observed_property(&self, constraints: &Constraints) -> Result<Option<Entity>> {
        self.query_one(EntityType::ObservedProperty, constraints)
    }

    pub fn observations(&self, constraints: &Constraints) -> Result<Collapsed<Entity>> {
        self.query(EntityType::Observation, constraints)
    }

    pub fn observation(&self, constraints: &Constraints) -> Result<Option<Entity>> {
        self.query_one(EntityType::Observation, constraints)
    }
}
