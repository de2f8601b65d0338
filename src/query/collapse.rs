//! Result-cardinality collapsing.
//!
//! Every query entry point reports its outcome the same way: nothing, exactly
//! one entity, or the whole collection.

use serde::Serialize;

/// A materialized result page set plus the server-reported total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityCollection<T> {
    pub entities: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

impl<T> EntityCollection<T> {
    pub fn new(entities: Vec<T>) -> Self {
        Self {
            entities,
            total_count: None,
        }
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.total_count = Some(total);
        self
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entities.iter()
    }
}

impl<T> IntoIterator for EntityCollection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.into_iter()
    }
}

/// Outcome of [`collapse`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", content = "data", rename_all = "snake_case")]
pub enum Collapsed<T> {
    NoResult,
    Single(T),
    Many(EntityCollection<T>),
}

impl<T> Collapsed<T> {
    pub fn is_no_result(&self) -> bool {
        matches!(self, Collapsed::NoResult)
    }

    /// The single entity, or the first of many.
    pub fn first(self) -> Option<T> {
        match self {
            Collapsed::NoResult => None,
            Collapsed::Single(entity) => Some(entity),
            Collapsed::Many(collection) => collection.entities.into_iter().next(),
        }
    }

    /// Back to a flat list, whatever the cardinality.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Collapsed::NoResult => Vec::new(),
            Collapsed::Single(entity) => vec![entity],
            Collapsed::Many(collection) => collection.entities,
        }
    }
}

/// Zero entities → `NoResult`, one → `Single`, more → `Many` unchanged.
pub fn collapse<T>(mut collection: EntityCollection<T>) -> Collapsed<T> {
    match collection.entities.len() {
        0 => Collapsed::NoResult,
        1 => match collection.entities.pop() {
            Some(entity) => Collapsed::Single(entity),
            None => Collapsed::NoResult,
        },
        _ => Collapsed::Many(collection),
    }
}
