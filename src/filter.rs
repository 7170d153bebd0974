//! Typed match filters for event queries
//!
//! Replaces string-keyed dynamic property bags with a closed condition set:
//! equality on known indexed fields, a timestamp range, and an OR combinator
//! used for actor correlation (`userID` OR `sessionID`). Filters carry their
//! own document-matching semantics so store adapters can evaluate them
//! without re-interpreting an opaque query language.

use crate::types::EventType;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// A conjunction of match conditions over stored event documents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    conditions: Vec<Condition>,
}

/// A single match condition
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals a literal value; a missing field compares as null
    Eq { field: String, value: Value },
    /// Event timestamp falls within `[earliest, latest]` inclusive
    TimestampBetween {
        earliest: DateTime<Utc>,
        latest: DateTime<Utc>,
    },
    /// At least one of the alternative filters matches
    AnyOf(Vec<EventFilter>),
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality condition on a field
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Adds an equality condition on the event type field
    pub fn event_type(self, event_type: EventType) -> Self {
        self.eq("eventType", event_type.as_str())
    }

    /// Constrains the event timestamp to `[earliest, latest]` inclusive
    pub fn timestamp_between(
        mut self,
        earliest: DateTime<Utc>,
        latest: DateTime<Utc>,
    ) -> Self {
        self.conditions.push(Condition::TimestampBetween { earliest, latest });
        self
    }

    /// Adds a disjunction over alternative filters
    ///
    /// An empty alternative list is a no-op rather than an unsatisfiable
    /// condition.
    pub fn any_of(mut self, alternatives: Vec<EventFilter>) -> Self {
        if !alternatives.is_empty() {
            self.conditions.push(Condition::AnyOf(alternatives));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Whether a stored document satisfies every condition of this filter
    pub fn matches(&self, document: &Value) -> bool {
        self.conditions.iter().all(|condition| match condition {
            Condition::Eq { field, value } => {
                lookup_path(document, field).unwrap_or(&Value::Null) == value
            }
            Condition::TimestampBetween { earliest, latest } => {
                match parse_timestamp_field(document) {
                    Some(timestamp) => timestamp >= *earliest && timestamp <= *latest,
                    None => false,
                }
            }
            Condition::AnyOf(alternatives) => {
                alternatives.iter().any(|filter| filter.matches(document))
            }
        })
    }
}

/// Resolves a dotted field path against a JSON document
pub(crate) fn lookup_path<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = document;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

fn parse_timestamp_field(document: &Value) -> Option<DateTime<Utc>> {
    let raw = document.get("timestamp")?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
