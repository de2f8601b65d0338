//! Constraint input types.
//!
//! Separated for modularity - types can evolve independently of logic.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::error::{FrostaError, Result};
use crate::schema::EntityType;

// ─── Identifiers ───────────────────────────────────────────────────

/// An entity identifier as assigned by the service (`@iot.id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Text(String),
}

impl EntityId {
    /// Literal form for filter expressions: integers bare, strings quoted
    /// with embedded quotes doubled.
    pub fn literal(&self) -> String {
        match self {
            EntityId::Int(n) => n.to_string(),
            EntityId::Text(s) => quote(s),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(n) => write!(f, "{}", n),
            EntityId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        EntityId::Int(n)
    }
}

impl From<i32> for EntityId {
    fn from(n: i32) -> Self {
        EntityId::Int(n.into())
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId::Text(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        EntityId::Text(s)
    }
}

/// Quote a string literal for the filter grammar.
pub(crate) fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Anything that knows its own entity type and identifier.
pub trait Identified {
    fn entity_type(&self) -> EntityType;
    fn entity_id(&self) -> EntityId;

    fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.entity_type(), self.entity_id())
    }
}

/// A reference to one already-identified entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EntityRef {
    pub entity_type: EntityType,
    pub id: EntityId,
}

impl EntityRef {
    pub fn new(entity_type: EntityType, id: impl Into<EntityId>) -> Self {
        Self {
            entity_type,
            id: id.into(),
        }
    }

    /// Parse `Type:id` (e.g. `Datastream:DS-1`, `Things:42`). Purely numeric
    /// identifiers become integer ids.
    pub fn parse(spec: &str) -> Result<Self> {
        let (ty, id) = spec.split_once(':').ok_or_else(|| {
            FrostaError::FilterConstruction(format!(
                "relation '{}' must be written as Type:id",
                spec
            ))
        })?;
        let entity_type: EntityType = ty.parse()?;
        let id = id.trim();
        if id.is_empty() {
            return Err(FrostaError::FilterConstruction(format!(
                "relation '{}' has an empty id",
                spec
            )));
        }
        let id = match id.parse::<i64>() {
            Ok(n) => EntityId::Int(n),
            Err(_) => EntityId::Text(id.to_string()),
        };
        Ok(Self { entity_type, id })
    }
}

impl Identified for EntityRef {
    fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    fn entity_id(&self) -> EntityId {
        self.id.clone()
    }
}

// ─── Relation Constraints ──────────────────────────────────────────

/// Entities the queried type must be connected to.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationConstraint {
    Single(EntityRef),
    /// Identifiers of the same type inside one collection are OR-ed.
    Collection(Vec<EntityRef>),
}

impl RelationConstraint {
    pub fn refs(&self) -> &[EntityRef] {
        match self {
            RelationConstraint::Single(r) => std::slice::from_ref(r),
            RelationConstraint::Collection(rs) => rs,
        }
    }
}

impl From<EntityRef> for RelationConstraint {
    fn from(r: EntityRef) -> Self {
        RelationConstraint::Single(r)
    }
}

impl From<Vec<EntityRef>> for RelationConstraint {
    fn from(rs: Vec<EntityRef>) -> Self {
        RelationConstraint::Collection(rs)
    }
}

// ─── Time Values ───────────────────────────────────────────────────

/// A time bound, either already typed or still textual.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeValue {
    Instant(DateTime<Utc>),
    Text(String),
}

impl TimeValue {
    /// Resolve to an absolute UTC instant.
    ///
    /// Text accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.f]` (read as
    /// UTC) or a bare `YYYY-MM-DD` (midnight UTC).
    pub fn to_utc(&self) -> Result<DateTime<Utc>> {
        match self {
            TimeValue::Instant(dt) => Ok(*dt),
            TimeValue::Text(s) => parse_instant(s),
        }
    }
}

fn parse_instant(text: &str) -> Result<DateTime<Utc>> {
    let s = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Some(naive) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    Err(FrostaError::FilterConstruction(format!(
        "cannot parse '{}' as a point in time",
        text
    )))
}

impl<Tz: TimeZone> From<DateTime<Tz>> for TimeValue {
    fn from(dt: DateTime<Tz>) -> Self {
        TimeValue::Instant(dt.with_timezone(&Utc))
    }
}

impl From<&str> for TimeValue {
    fn from(s: &str) -> Self {
        TimeValue::Text(s.to_string())
    }
}

impl From<String> for TimeValue {
    fn from(s: String) -> Self {
        TimeValue::Text(s)
    }
}

// ─── Ordering ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("asc"),
            SortDirection::Desc => f.write_str("desc"),
        }
    }
}

/// `$orderby` directive. A verbatim override carries no direction of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Option<SortDirection>,
}

impl OrderBy {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Some(SortDirection::Asc),
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Some(SortDirection::Desc),
        }
    }

    /// Use `expression` exactly as given, e.g. `"result desc,phenomenonTime"`.
    pub fn verbatim(expression: impl Into<String>) -> Self {
        Self {
            field: expression.into(),
            direction: None,
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Some(dir) => write!(f, "{} {}", self.field, dir),
            None => f.write_str(&self.field),
        }
    }
}

impl Serialize for OrderBy {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<&str> for OrderBy {
    fn from(s: &str) -> Self {
        OrderBy::verbatim(s)
    }
}

// ─── Constraints ───────────────────────────────────────────────────

/// Text properties that support wildcard matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Id,
    Name,
    Description,
}

impl TextField {
    pub fn as_str(self) -> &'static str {
        match self {
            TextField::Id => "id",
            TextField::Name => "name",
            TextField::Description => "description",
        }
    }
}

/// One declarative constraint on the queried entity type.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Text { field: TextField, pattern: String },
    Start(TimeValue),
    End(TimeValue),
    LowerLimit(f64),
    UpperLimit(f64),
    Related(RelationConstraint),
    /// Raw filter expression, appended as given.
    Filter(String),
}

/// Ordered constraint set plus ordering and paging overrides.
///
/// Clauses are emitted in the order the builder methods were called.
///
/// ```ignore
/// let constraints = Constraints::new()
///     .related(EntityRef::new(EntityType::Datastream, "DS-1"))
///     .start("2024-01-01T00:00:00Z")
///     .upper_limit(10.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    items: Vec<Constraint>,
    order_by: Option<OrderBy>,
    skip: Option<u64>,
    top: Option<u64>,
}

impl Constraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, constraint: Constraint) {
        self.items.push(constraint);
    }

    fn with(mut self, constraint: Constraint) -> Self {
        self.push(constraint);
        self
    }

    pub fn id(self, pattern: impl Into<String>) -> Self {
        self.with(Constraint::Text {
            field: TextField::Id,
            pattern: pattern.into(),
        })
    }

    pub fn name(self, pattern: impl Into<String>) -> Self {
        self.with(Constraint::Text {
            field: TextField::Name,
            pattern: pattern.into(),
        })
    }

    pub fn description(self, pattern: impl Into<String>) -> Self {
        self.with(Constraint::Text {
            field: TextField::Description,
            pattern: pattern.into(),
        })
    }

    /// Inclusive lower bound on `phenomenonTime`.
    pub fn start(self, at: impl Into<TimeValue>) -> Self {
        self.with(Constraint::Start(at.into()))
    }

    /// Exclusive upper bound on `phenomenonTime`.
    pub fn end(self, at: impl Into<TimeValue>) -> Self {
        self.with(Constraint::End(at.into()))
    }

    /// Inclusive lower bound on `result`.
    pub fn lower_limit(self, value: f64) -> Self {
        self.with(Constraint::LowerLimit(value))
    }

    /// Exclusive upper bound on `result`.
    pub fn upper_limit(self, value: f64) -> Self {
        self.with(Constraint::UpperLimit(value))
    }

    pub fn related(self, relation: impl Into<RelationConstraint>) -> Self {
        self.with(Constraint::Related(relation.into()))
    }

    pub fn related_to<T: Identified + ?Sized>(self, entity: &T) -> Self {
        self.related(entity.entity_ref())
    }

    /// Related to any of `entities`.
    pub fn related_to_any<'a, T, I>(self, entities: I) -> Self
    where
        T: Identified + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let refs: Vec<EntityRef> = entities.into_iter().map(Identified::entity_ref).collect();
        self.related(refs)
    }

    pub fn filter(self, expression: impl Into<String>) -> Self {
        self.with(Constraint::Filter(expression.into()))
    }

    pub fn order_by(mut self, order: impl Into<OrderBy>) -> Self {
        self.order_by = Some(order.into());
        self
    }

    pub fn skip(mut self, n: u64) -> Self {
        self.skip = Some(n);
        self
    }

    pub fn top(mut self, n: u64) -> Self {
        self.top = Some(n);
        self
    }

    pub fn items(&self) -> &[Constraint] {
        &self.items
    }

    pub fn order(&self) -> Option<&OrderBy> {
        self.order_by.as_ref()
    }

    pub fn skip_count(&self) -> Option<u64> {
        self.skip
    }

    pub fn top_count(&self) -> Option<u64> {
        self.top
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_literals() {
        assert_eq!(EntityId::from(42).literal(), "42");
        assert_eq!(EntityId::from("DS-1").literal(), "'DS-1'");
        assert_eq!(EntityId::from("O'Brien").literal(), "'O''Brien'");
    }

    #[test]
    fn test_entity_ref_parse() {
        let r = EntityRef::parse("Datastreams:DS-1").unwrap();
        assert_eq!(r, EntityRef::new(EntityType::Datastream, "DS-1"));

        let r = EntityRef::parse("Thing:7").unwrap();
        assert_eq!(r.id, EntityId::Int(7));

        assert!(EntityRef::parse("Thing").is_err());
        assert!(EntityRef::parse("Thing:").is_err());
        assert!(matches!(
            EntityRef::parse("Gizmo:1"),
            Err(FrostaError::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_time_value_parsing_is_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for text in [
            "2024-01-01T00:00:00Z",
            "2024-01-01T01:00:00+01:00",
            "2024-01-01T00:00:00",
            "2024-01-01",
        ] {
            assert_eq!(TimeValue::from(text).to_utc().unwrap(), expected, "{}", text);
        }

        let offset = chrono::FixedOffset::west_opt(5 * 3600).unwrap();
        let local = offset.with_ymd_and_hms(2023, 12, 31, 19, 0, 0).unwrap();
        assert_eq!(TimeValue::from(local).to_utc().unwrap(), expected);
    }

    #[test]
    fn test_time_value_rejects_garbage() {
        let err = TimeValue::from("next tuesday").to_utc().unwrap_err();
        assert!(matches!(err, FrostaError::FilterConstruction(_)));
    }

    #[test]
    fn test_order_by_rendering() {
        assert_eq!(OrderBy::ascending("name").to_string(), "name asc");
        assert_eq!(OrderBy::descending("result").to_string(), "result desc");
        assert_eq!(OrderBy::from("id").to_string(), "id");
    }

    #[test]
    fn test_builder_keeps_call_order() {
        let c = Constraints::new()
            .upper_limit(5.0)
            .name("x")
            .start("2024-01-01")
            .skip(10);
        assert!(matches!(c.items()[0], Constraint::UpperLimit(_)));
        assert!(matches!(
            c.items()[1],
            Constraint::Text {
                field: TextField::Name,
                ..
            }
        ));
        assert!(matches!(c.items()[2], Constraint::Start(_)));
        assert_eq!(c.skip_count(), Some(10));
        assert_eq!(c.top_count(), None);
    }
}
