//! The assembled request description handed to an executor.

use serde::Serialize;

use super::filter::{self, FilterClause};
use super::types::OrderBy;
use crate::schema::EntityType;

/// A fully compiled query for one entity set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySpec {
    pub entity_type: EntityType,
    pub filters: Vec<FilterClause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expand: Option<&'static str>,
    pub order_by: OrderBy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<u64>,
}

impl QuerySpec {
    /// Entity set path relative to the service root, e.g. `Observations`.
    pub fn entity_set(&self) -> &'static str {
        self.entity_type.plural()
    }

    /// The combined `$filter` expression.
    pub fn filter(&self) -> Option<String> {
        filter::join(&self.filters)
    }

    /// Query parameters, unencoded. `$count=true` is always requested so the
    /// executor can report the total.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(6);
        if let Some(filter) = self.filter() {
            pairs.push(("$filter", filter));
        }
        if let Some(expand) = self.expand {
            pairs.push(("$expand", expand.to_string()));
        }
        pairs.push(("$orderby", self.order_by.to_string()));
        if let Some(skip) = self.skip {
            pairs.push(("$skip", skip.to_string()));
        }
        if let Some(top) = self.top {
            pairs.push(("$top", top.to_string()));
        }
        pairs.push(("$count", "true".to_string()));
        pairs
    }

    /// Human-readable request line, e.g. `Things?$orderby=name asc&$count=true`.
    pub fn to_request_line(&self) -> String {
        let query = self
            .query_pairs()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.entity_set(), query)
    }
}
