//! Error types for frosta.

use thiserror::Error;

use crate::schema::EntityType;

/// Everything that can go wrong while resolving, compiling or executing a query.
#[derive(Debug, Error)]
pub enum FrostaError {
    /// An entity type name the schema does not know.
    #[error("invalid schema: unknown entity type '{0}'")]
    InvalidSchema(String),

    /// No navigation path connects the two entity types in the static schema.
    #[error("no navigation path from {origin} to {target}")]
    Unresolved {
        origin: EntityType,
        target: EntityType,
    },

    /// A constraint could not be rendered into a filter clause.
    #[error("cannot build filter: {0}")]
    FilterConstruction(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport failure reported by the HTTP client.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("decode error: {0}")]
    Decode(String),
}

impl FrostaError {
    /// True for the two resolution/compilation failures raised by the core.
    pub fn is_compile_error(&self) -> bool {
        matches!(
            self,
            FrostaError::Unresolved { .. } | FrostaError::FilterConstruction(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FrostaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_message_names_both_types() {
        let err = FrostaError::Unresolved {
            origin: EntityType::Thing,
            target: EntityType::MultiDatastream,
        };
        assert_eq!(
            err.to_string(),
            "no navigation path from Thing to MultiDatastream"
        );
        assert!(err.is_compile_error());
    }

    #[test]
    fn test_service_error_is_not_a_compile_error() {
        let err = FrostaError::Service {
            status: 503,
            body: "busy".to_string(),
        };
        assert!(!err.is_compile_error());
        assert_eq!(err.to_string(), "service returned 503: busy");
    }
}
