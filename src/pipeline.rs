//! Aggregation pipeline stage descriptors
//!
//! Store adapters accept an ordered list of [`PipelineStage`]s and execute
//! them against a collection. The stage set mirrors the capability surface
//! the analytics queries need: match, date bucketing, group-count, sort,
//! limit, lookup/unwind joins, field projection, and the densify/fill pair
//! that synthesizes empty time series buckets.

use crate::filter::EventFilter;
use crate::types::SortOrder;
use chrono::{DateTime, Duration, Months, NaiveDate, NaiveTime, Utc};
use serde_json::Value;

/// Grouping precision for time series buckets
///
/// Defaults to day granularity, the engine's defensive default for any
/// timespan without an explicit bucketing rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BucketGranularity {
    #[default]
    Day,
    Month,
}

impl BucketGranularity {
    /// Date-string format used to derive a per-event group timestamp
    pub fn group_format(&self) -> &'static str {
        match self {
            Self::Day => "%Y-%m-%d",
            Self::Month => "%Y-%m",
        }
    }

    /// Formats a timestamp at this granularity's grouping precision
    pub fn format_group(&self, timestamp: DateTime<Utc>) -> String {
        timestamp.format(self.group_format()).to_string()
    }

    /// Parses a group timestamp string back into a canonical instant
    /// (midnight UTC of the day, or of the first of the month)
    pub fn parse_group(&self, group: &str) -> Option<DateTime<Utc>> {
        let date = match self {
            Self::Day => NaiveDate::parse_from_str(group, "%Y-%m-%d").ok()?,
            Self::Month => NaiveDate::parse_from_str(&format!("{group}-01"), "%Y-%m-%d").ok()?,
        };
        Some(date.and_time(NaiveTime::MIN).and_utc())
    }

    /// Collapses a timestamp onto its bucket's canonical instant
    ///
    /// Round-trips through the group string so grouping and densification
    /// agree 1:1 on bucket identity and never produce duplicate buckets.
    pub fn truncate(&self, timestamp: DateTime<Utc>) -> DateTime<Utc> {
        self.parse_group(&self.format_group(timestamp))
            .unwrap_or(timestamp)
    }

    /// Advances a timestamp by one bucket step
    pub fn advance(&self, timestamp: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Day => timestamp.checked_add_signed(Duration::days(1)),
            Self::Month => timestamp.checked_add_months(Months::new(1)),
        }
    }
}

/// One stage of an aggregation pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineStage {
    /// Retain documents matching the filter
    Match(EventFilter),
    /// Derive a canonical bucket timestamp from a date field
    ///
    /// Equivalent to formatting the field at the granularity's precision and
    /// re-parsing the string into a normalized date, which collapses all
    /// events in the same bucket onto one instant.
    BucketTimestamps {
        field: String,
        granularity: BucketGranularity,
        output: String,
    },
    /// Group documents by a field value, counting occurrences per group;
    /// emits `{ "_id": <group value>, "count": <n> }` rows
    GroupCount { key: String },
    /// Sort rows by a field
    Sort { field: String, order: SortOrder },
    /// Truncate to the first `n` rows
    Limit(usize),
    /// Join rows to documents of another collection by field equality,
    /// collecting matches into an array field
    Lookup {
        from: String,
        local_field: String,
        foreign_field: String,
        as_field: String,
    },
    /// Flatten an array field into one row per element
    ///
    /// Rows whose array is empty or missing are dropped unless
    /// `preserve_null_and_empty` is set.
    Unwind {
        path: String,
        preserve_null_and_empty: bool,
    },
    /// Set a field from a dotted path within the row
    Set { field: String, path: String },
    /// Retain only the listed fields
    Project { fields: Vec<String> },
    /// Synthesize a row for every bucket boundary in `[bounds.0, bounds.1)`
    /// at the granularity step, for boundaries no existing row covers;
    /// output is ordered ascending by the densified field
    Densify {
        field: String,
        granularity: BucketGranularity,
        bounds: (DateTime<Utc>, DateTime<Utc>),
    },
    /// Give rows missing the field a default value
    Fill { field: String, value: Value },
}
