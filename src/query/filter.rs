//! Filter clauses in the OData `$filter` grammar used by SensorThings.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

use super::types::{quote, EntityId, TimeValue};
use crate::error::{FrostaError, Result};
use crate::resolver::NavigationPath;

/// How a text pattern is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    Exact,
    Prefix,
    Suffix,
    Substring,
}

/// Which side of a half-open interval a bound sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Inclusive (`ge`).
    Lower,
    /// Exclusive (`lt`).
    Upper,
}

impl Bound {
    fn operator(self) -> &'static str {
        match self {
            Bound::Lower => "ge",
            Bound::Upper => "lt",
        }
    }
}

/// One atomic predicate. Clauses of a query are joined with `and`.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterClause {
    /// Case-insensitive comparison; `value` is already lower-cased.
    Text {
        field: String,
        mode: TextMatch,
        value: String,
    },
    PhenomenonTime { bound: Bound, at: DateTime<Utc> },
    Result { bound: Bound, value: f64 },
    /// `<id> eq <path>/id`, OR-ed when there is more than one id.
    Related {
        path: NavigationPath,
        ids: Vec<EntityId>,
    },
    Raw(String),
}

impl FilterClause {
    /// Compile a wildcard text pattern.
    ///
    /// `*x*` is a substring match, `*x` a suffix match, `x*` a prefix match
    /// and anything else an exact match. Both sides are lower-cased.
    pub fn text(field: &str, pattern: &str) -> Self {
        let value = pattern.to_lowercase();
        let field = field.to_lowercase();

        let (mode, value) = if value.chars().count() > 1 {
            let starts = value.starts_with('*');
            let ends = value.ends_with('*');
            match (starts, ends) {
                (true, true) => (TextMatch::Substring, &value[1..value.len() - 1]),
                (true, false) => (TextMatch::Suffix, &value[1..]),
                (false, true) => (TextMatch::Prefix, &value[..value.len() - 1]),
                (false, false) => (TextMatch::Exact, value.as_str()),
            }
        } else {
            (TextMatch::Exact, value.as_str())
        };

        FilterClause::Text {
            field,
            mode,
            value: value.to_string(),
        }
    }

    pub fn phenomenon_time(bound: Bound, at: &TimeValue) -> Result<Self> {
        Ok(FilterClause::PhenomenonTime {
            bound,
            at: at.to_utc()?,
        })
    }

    pub fn result(bound: Bound, value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(FrostaError::FilterConstruction(format!(
                "result limit must be a finite number, got {}",
                value
            )));
        }
        Ok(FilterClause::Result { bound, value })
    }

    pub fn related(path: NavigationPath, ids: Vec<EntityId>) -> Result<Self> {
        if ids.is_empty() {
            return Err(FrostaError::FilterConstruction(format!(
                "relation via {} names no entities",
                path
            )));
        }
        Ok(FilterClause::Related { path, ids })
    }
}

impl fmt::Display for FilterClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterClause::Text { field, mode, value } => {
                let value = quote(value);
                match mode {
                    TextMatch::Exact => write!(f, "{} eq tolower({})", value, field),
                    TextMatch::Prefix => write!(f, "startswith(tolower({}), {})", field, value),
                    TextMatch::Suffix => write!(f, "endswith(tolower({}), {})", field, value),
                    TextMatch::Substring => {
                        write!(f, "substringof({}, tolower({}))", value, field)
                    }
                }
            }
            FilterClause::PhenomenonTime { bound, at } => write!(
                f,
                "phenomenonTime {} {}",
                bound.operator(),
                at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
            ),
            FilterClause::Result { bound, value } => {
                write!(f, "result {} {}", bound.operator(), value)
            }
            FilterClause::Related { path, ids } => {
                let target = path.id_path();
                if let [id] = ids.as_slice() {
                    return write!(f, "{} eq {}", id.literal(), target);
                }
                f.write_str("(")?;
                for (i, id) in ids.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" or ")?;
                    }
                    write!(f, "{} eq {}", id.literal(), target)?;
                }
                f.write_str(")")
            }
            FilterClause::Raw(expression) => f.write_str(expression),
        }
    }
}

impl Serialize for FilterClause {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Join clauses into one `$filter` expression, or `None` if there are none.
pub fn join(clauses: &[FilterClause]) -> Option<String> {
    if clauses.is_empty() {
        return None;
    }
    Some(
        clauses
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" and "),
    )
}

/// Text filter for `field` matching `pattern`, rendered.
pub fn string_filter(field: &str, pattern: &str) -> String {
    FilterClause::text(field, pattern).to_string()
}
