//! Entities as returned by the service.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{FrostaError, Result};
use crate::query::{EntityId, Identified, TimeValue};
use crate::schema::EntityType;

/// One entity of any type. Well-known fields are lifted out; everything else
/// (including expanded sub-resources) stays in `properties`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub entity_type: EntityType,
    pub id: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub properties: Map<String, Value>,
}

impl Entity {
    /// Build from one element of a response's `value` array.
    pub fn from_json(entity_type: EntityType, value: Value) -> Result<Self> {
        let Value::Object(mut properties) = value else {
            return Err(FrostaError::Decode(format!(
                "{} entry is not a JSON object",
                entity_type
            )));
        };

        let id = properties
            .remove("@iot.id")
            .ok_or_else(|| FrostaError::Decode(format!("{} entry has no @iot.id", entity_type)))
            .and_then(|raw| {
                serde_json::from_value::<EntityId>(raw)
                    .map_err(|e| FrostaError::Decode(format!("bad @iot.id: {}", e)))
            })?;

        let name = take_string(&mut properties, "name");
        let description = take_string(&mut properties, "description");

        Ok(Self {
            entity_type,
            id,
            name,
            description,
            properties,
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Identifier of an expanded to-one relation, e.g. `Datastream` on an
    /// observation fetched with the default expansion.
    pub fn related_id(&self, relation: &str) -> Option<EntityId> {
        self.properties
            .get(relation)
            .and_then(|related| related.get("@iot.id"))
            .and_then(|raw| serde_json::from_value(raw.clone()).ok())
    }

    /// Start of `phenomenonTime`; intervals (`a/b`) yield their start.
    pub fn phenomenon_time(&self) -> Option<DateTime<Utc>> {
        let text = self.properties.get("phenomenonTime")?.as_str()?;
        let start = text.split('/').next()?;
        TimeValue::from(start).to_utc().ok()
    }

    pub fn result(&self) -> Option<&Value> {
        self.properties.get("result")
    }
}

fn take_string(properties: &mut Map<String, Value>, key: &str) -> Option<String> {
    match properties.remove(key) {
        Some(Value::String(s)) => Some(s),
        Some(other) => {
            // Not a plain string; keep it where it was.
            properties.insert(key.to_string(), other);
            None
        }
        None => None,
    }
}

impl Identified for Entity {
    fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    fn entity_id(&self) -> EntityId {
        self.id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_from_json_lifts_known_fields() {
        let entity = Entity::from_json(
            EntityType::Datastream,
            json!({
                "@iot.id": "DS-1",
                "@iot.selfLink": "http://host/Datastreams('DS-1')",
                "name": "Air temperature",
                "description": "2 m above ground",
                "Thing": {"@iot.id": 4}
            }),
        )
        .unwrap();
        assert_eq!(entity.id, EntityId::Text("DS-1".to_string()));
        assert_eq!(entity.name.as_deref(), Some("Air temperature"));
        assert_eq!(entity.description.as_deref(), Some("2 m above ground"));
        assert_eq!(entity.related_id("Thing"), Some(EntityId::Int(4)));
        assert!(entity.get("@iot.selfLink").is_some());
        assert!(entity.get("name").is_none());
    }

    #[test]
    fn test_observation_accessors() {
        let entity = Entity::from_json(
            EntityType::Observation,
            json!({
                "@iot.id": 17,
                "phenomenonTime": "2024-01-01T00:00:00Z/2024-01-01T00:10:00Z",
                "result": 21.5,
                "Datastream": {"@iot.id": "DS-1"}
            }),
        )
        .unwrap();
        assert_eq!(
            entity.phenomenon_time(),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(entity.result(), Some(&json!(21.5)));
        assert_eq!(entity.related_id("Datastream"), Some(EntityId::from("DS-1")));
        assert_eq!(entity.entity_ref().entity_type, EntityType::Observation);
    }

    #[test]
    fn test_missing_id_is_decode_error() {
        let err = Entity::from_json(EntityType::Thing, json!({"name": "x"})).unwrap_err();
        assert!(matches!(err, FrostaError::Decode(_)));
        let err = Entity::from_json(EntityType::Thing, json!([1, 2])).unwrap_err();
        assert!(matches!(err, FrostaError::Decode(_)));
    }
}
