//! Entity type identifiers.
//!
//! Separated from the graph so the error and query layers can name types
//! without pulling in petgraph.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::FrostaError;

/// A node kind in the SensorThings entity schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EntityType {
    Location,
    Thing,
    HistoricalLocation,
    Datastream,
    /// Multi-valued variant of `Datastream`. Never traversed.
    MultiDatastream,
    Sensor,
    ObservedProperty,
    Observation,
    FeatureOfInterest,
}

impl EntityType {
    pub const ALL: [EntityType; 9] = [
        EntityType::Location,
        EntityType::Thing,
        EntityType::HistoricalLocation,
        EntityType::Datastream,
        EntityType::MultiDatastream,
        EntityType::Sensor,
        EntityType::ObservedProperty,
        EntityType::Observation,
        EntityType::FeatureOfInterest,
    ];

    /// Canonical singular name, as used for to-one navigation properties.
    pub fn singular(self) -> &'static str {
        match self {
            EntityType::Location => "Location",
            EntityType::Thing => "Thing",
            EntityType::HistoricalLocation => "HistoricalLocation",
            EntityType::Datastream => "Datastream",
            EntityType::MultiDatastream => "MultiDatastream",
            EntityType::Sensor => "Sensor",
            EntityType::ObservedProperty => "ObservedProperty",
            EntityType::Observation => "Observation",
            EntityType::FeatureOfInterest => "FeatureOfInterest",
        }
    }

    /// Plural name, which is also the entity set path on the service.
    pub fn plural(self) -> &'static str {
        match self {
            EntityType::Location => "Locations",
            EntityType::Thing => "Things",
            EntityType::HistoricalLocation => "HistoricalLocations",
            EntityType::Datastream => "Datastreams",
            EntityType::MultiDatastream => "MultiDatastreams",
            EntityType::Sensor => "Sensors",
            EntityType::ObservedProperty => "ObservedProperties",
            EntityType::Observation => "Observations",
            EntityType::FeatureOfInterest => "FeaturesOfInterest",
        }
    }

    /// The multi-valued variant is excluded from path search.
    pub fn is_multi_valued(self) -> bool {
        self == EntityType::MultiDatastream
    }

    /// Look up a type by singular or plural spelling, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<EntityType> {
        let name = name.trim();
        EntityType::ALL.into_iter().find(|ty| {
            ty.singular().eq_ignore_ascii_case(name) || ty.plural().eq_ignore_ascii_case(name)
        })
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.singular())
    }
}

impl FromStr for EntityType {
    type Err = FrostaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::from_name(s).ok_or_else(|| FrostaError::InvalidSchema(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singular_and_plural_spellings_parse() {
        assert_eq!(EntityType::from_name("Thing"), Some(EntityType::Thing));
        assert_eq!(EntityType::from_name("Things"), Some(EntityType::Thing));
        assert_eq!(
            EntityType::from_name("observedproperties"),
            Some(EntityType::ObservedProperty)
        );
        assert_eq!(
            EntityType::from_name("FeaturesOfInterest"),
            Some(EntityType::FeatureOfInterest)
        );
    }

    #[test]
    fn test_unknown_name_is_invalid_schema() {
        let err = "Gadget".parse::<EntityType>().unwrap_err();
        assert!(matches!(err, FrostaError::InvalidSchema(ref n) if n == "Gadget"));
    }

    #[test]
    fn test_display_is_singular() {
        assert_eq!(EntityType::Observation.to_string(), "Observation");
        assert_eq!(EntityType::Observation.plural(), "Observations");
    }
}
