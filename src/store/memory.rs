//! In-memory event store
//!
//! Reference implementation of the [`EventStore`](super::EventStore)
//! contract: documents held per collection behind an async `RwLock`, with a
//! local interpreter for the aggregation stage set. Backs the test suite and
//! local development; production deployments supply an adapter over a real
//! document store instead.

use super::EventStore;
use crate::error::{EventError, Result};
use crate::filter::{lookup_path, EventFilter};
use crate::pipeline::{BucketGranularity, PipelineStage};
use crate::types::SortOrder;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory document store keyed by collection name
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends documents to a collection verbatim
    ///
    /// Used to stage join collections (e.g. restaurants) and pre-existing
    /// event history in tests.
    pub async fn seed(&self, collection: &str, documents: Vec<Value>) {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
    }

    /// Snapshot of a collection's documents
    pub async fn documents(&self, collection: &str) -> Vec<Value> {
        let collections = self.collections.read().await;
        collections.get(collection).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert_time_series_document(
        &self,
        collection: &str,
        id: &str,
        mut document: Value,
        date_fields: &[&str],
    ) -> Result<bool> {
        let object = document
            .as_object_mut()
            .ok_or_else(|| EventError::validation("document must be a JSON object"))?;
        object.insert("id".to_string(), Value::String(id.to_string()));

        // Designated date fields must hold range-queryable instants
        for field in date_fields {
            let raw = object
                .get(*field)
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    EventError::validation(format!("date field '{field}' missing or not a string"))
                })?;
            parse_instant(raw)
                .ok_or_else(|| EventError::validation(format!("date field '{field}' is not a valid timestamp: {raw}")))?;
        }

        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection.to_string()).or_default();

        let duplicate = documents
            .iter()
            .any(|doc| doc.get("id").and_then(Value::as_str) == Some(id));
        if duplicate {
            debug!(collection, id, "rejected duplicate time series document");
            return Ok(false);
        }

        documents.push(document);
        Ok(true)
    }

    async fn count_where(&self, collection: &str, predicate: &EventFilter) -> Result<u64> {
        let collections = self.collections.read().await;
        let count = collections
            .get(collection)
            .map(|documents| documents.iter().filter(|doc| predicate.matches(doc)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn run_aggregation_pipeline(
        &self,
        collection: &str,
        stages: &[PipelineStage],
    ) -> Result<Vec<Value>> {
        let collections = self.collections.read().await;
        let mut rows = collections.get(collection).cloned().unwrap_or_default();

        for stage in stages {
            rows = match stage {
                PipelineStage::Match(filter) => {
                    rows.into_iter().filter(|row| filter.matches(row)).collect()
                }
                PipelineStage::BucketTimestamps {
                    field,
                    granularity,
                    output,
                } => bucket_timestamps(rows, field, *granularity, output)?,
                PipelineStage::GroupCount { key } => group_count(rows, key),
                PipelineStage::Sort { field, order } => sort_rows(rows, field, *order),
                PipelineStage::Limit(limit) => {
                    rows.truncate(*limit);
                    rows
                }
                PipelineStage::Lookup {
                    from,
                    local_field,
                    foreign_field,
                    as_field,
                } => {
                    let foreign = collections.get(from).cloned().unwrap_or_default();
                    lookup(rows, &foreign, local_field, foreign_field, as_field)?
                }
                PipelineStage::Unwind {
                    path,
                    preserve_null_and_empty,
                } => unwind(rows, path, *preserve_null_and_empty),
                PipelineStage::Set { field, path } => set_field(rows, field, path)?,
                PipelineStage::Project { fields } => project(rows, fields),
                PipelineStage::Densify {
                    field,
                    granularity,
                    bounds,
                } => densify(rows, field, *granularity, *bounds)?,
                PipelineStage::Fill { field, value } => fill(rows, field, value)?,
            };
        }

        Ok(rows)
    }
}

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn row_object(row: &mut Value) -> Result<&mut serde_json::Map<String, Value>> {
    row.as_object_mut()
        .ok_or_else(|| EventError::pipeline("pipeline rows must be JSON objects"))
}

fn bucket_timestamps(
    mut rows: Vec<Value>,
    field: &str,
    granularity: BucketGranularity,
    output: &str,
) -> Result<Vec<Value>> {
    for row in &mut rows {
        let raw = row
            .get(field)
            .and_then(Value::as_str)
            .ok_or_else(|| EventError::pipeline(format!("field '{field}' missing or not a date string")))?;
        let instant = parse_instant(raw)
            .ok_or_else(|| EventError::pipeline(format!("field '{field}' is not a valid timestamp: {raw}")))?;

        let bucket = granularity.truncate(instant);
        row_object(row)?.insert(output.to_string(), Value::String(format_instant(bucket)));
    }
    Ok(rows)
}

fn group_count(rows: Vec<Value>, key: &str) -> Vec<Value> {
    let mut groups: IndexMap<String, (Value, u64)> = IndexMap::new();

    for row in rows {
        let group_value = row.get(key).cloned().unwrap_or(Value::Null);
        let group_key = group_value.to_string();
        groups.entry(group_key).or_insert((group_value, 0)).1 += 1;
    }

    groups
        .into_values()
        .map(|(value, count)| json!({ "_id": value, "count": count }))
        .collect()
}

fn compare_field_values(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => match (a.as_str(), b.as_str()) {
            (Some(a), Some(b)) => a.cmp(b),
            _ => a.to_string().cmp(&b.to_string()),
        },
    }
}

fn sort_rows(mut rows: Vec<Value>, field: &str, order: SortOrder) -> Vec<Value> {
    rows.sort_by(|a, b| {
        let left = a.get(field).unwrap_or(&Value::Null);
        let right = b.get(field).unwrap_or(&Value::Null);
        let ordering = compare_field_values(left, right);
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
    rows
}

fn lookup(
    mut rows: Vec<Value>,
    foreign: &[Value],
    local_field: &str,
    foreign_field: &str,
    as_field: &str,
) -> Result<Vec<Value>> {
    for row in &mut rows {
        let local_value = row.get(local_field).cloned().unwrap_or(Value::Null);
        let matches: Vec<Value> = foreign
            .iter()
            .filter(|doc| {
                lookup_path(doc, foreign_field).unwrap_or(&Value::Null) == &local_value
            })
            .cloned()
            .collect();
        row_object(row)?.insert(as_field.to_string(), Value::Array(matches));
    }
    Ok(rows)
}

fn unwind(rows: Vec<Value>, path: &str, preserve_null_and_empty: bool) -> Vec<Value> {
    let mut unwound = Vec::new();

    for row in rows {
        match row.get(path) {
            Some(Value::Array(elements)) if !elements.is_empty() => {
                for element in elements.clone() {
                    let mut clone = row.clone();
                    if let Some(object) = clone.as_object_mut() {
                        object.insert(path.to_string(), element);
                    }
                    unwound.push(clone);
                }
            }
            Some(Value::Array(_)) | Some(Value::Null) | None => {
                if preserve_null_and_empty {
                    unwound.push(row);
                }
            }
            // Non-array values pass through as a single element
            Some(_) => unwound.push(row),
        }
    }

    unwound
}

fn set_field(mut rows: Vec<Value>, field: &str, path: &str) -> Result<Vec<Value>> {
    for row in &mut rows {
        let value = lookup_path(row, path).cloned().unwrap_or(Value::Null);
        row_object(row)?.insert(field.to_string(), value);
    }
    Ok(rows)
}

fn project(rows: Vec<Value>, fields: &[String]) -> Vec<Value> {
    rows.into_iter()
        .map(|row| {
            let mut projected = serde_json::Map::new();
            for field in fields {
                if let Some(value) = row.get(field) {
                    projected.insert(field.clone(), value.clone());
                }
            }
            Value::Object(projected)
        })
        .collect()
}

fn densify(
    mut rows: Vec<Value>,
    field: &str,
    granularity: BucketGranularity,
    bounds: (DateTime<Utc>, DateTime<Utc>),
) -> Result<Vec<Value>> {
    let (lower, upper) = bounds;

    let mut covered: HashSet<i64> = HashSet::new();
    for row in &rows {
        let raw = row
            .get(field)
            .and_then(Value::as_str)
            .ok_or_else(|| EventError::pipeline(format!("densify field '{field}' missing or not a date string")))?;
        let instant = parse_instant(raw)
            .ok_or_else(|| EventError::pipeline(format!("densify field '{field}' is not a valid timestamp: {raw}")))?;
        covered.insert(instant.timestamp());
    }

    let mut boundary = lower;
    while boundary < upper {
        if covered.insert(boundary.timestamp()) {
            rows.push(json!({ field: format_instant(boundary) }));
        }
        boundary = match granularity.advance(boundary) {
            Some(next) if next > boundary => next,
            _ => break,
        };
    }

    // Densified output is ordered ascending by the bucket instant
    rows.sort_by_key(|row| {
        row.get(field)
            .and_then(Value::as_str)
            .and_then(parse_instant)
            .map(|instant| instant.timestamp())
            .unwrap_or(i64::MIN)
    });

    Ok(rows)
}

fn fill(mut rows: Vec<Value>, field: &str, value: &Value) -> Result<Vec<Value>> {
    for row in &mut rows {
        let missing = matches!(row.get(field), None | Some(Value::Null));
        if missing {
            row_object(row)?.insert(field.to_string(), value.clone());
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event_doc(id: &str, event_type: &str, timestamp: &str, restaurant: &str) -> Value {
        json!({
            "id": id,
            "eventType": event_type,
            "timestamp": timestamp,
            "fonciiRestaurantID": restaurant,
        })
    }

    #[tokio::test]
    async fn test_insert_once_by_id() {
        let store = MemoryEventStore::new();
        let doc = event_doc("e1", "RESTAURANT_VIEW", "2024-04-17T10:00:00Z", "r1");

        let inserted = store
            .insert_time_series_document("TrackedEvents", "e1", doc.clone(), &["timestamp"])
            .await
            .unwrap();
        assert!(inserted);

        let duplicate = store
            .insert_time_series_document("TrackedEvents", "e1", doc, &["timestamp"])
            .await
            .unwrap();
        assert!(!duplicate);

        assert_eq!(store.documents("TrackedEvents").await.len(), 1);
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_date_field() {
        let store = MemoryEventStore::new();
        let doc = json!({ "timestamp": "yesterday-ish" });

        let result = store
            .insert_time_series_document("TrackedEvents", "e1", doc, &["timestamp"])
            .await;
        assert!(matches!(result, Err(EventError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_count_where() {
        let store = MemoryEventStore::new();
        store
            .seed(
                "TrackedEvents",
                vec![
                    event_doc("e1", "RESTAURANT_VIEW", "2024-04-17T10:00:00Z", "r1"),
                    event_doc("e2", "RESTAURANT_VIEW", "2024-04-17T11:00:00Z", "r2"),
                    event_doc("e3", "POST_VIEW", "2024-04-17T12:00:00Z", "r1"),
                ],
            )
            .await;

        let predicate = EventFilter::new().eq("eventType", "RESTAURANT_VIEW");
        assert_eq!(store.count_where("TrackedEvents", &predicate).await.unwrap(), 2);

        let predicate = predicate.eq("fonciiRestaurantID", "r1");
        assert_eq!(store.count_where("TrackedEvents", &predicate).await.unwrap(), 1);

        assert_eq!(
            store
                .count_where("Missing", &EventFilter::new())
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_densify_synthesizes_every_missing_boundary() {
        let store = MemoryEventStore::new();
        let lower = Utc.with_ymd_and_hms(2024, 4, 10, 15, 0, 0).unwrap();
        let upper = Utc.with_ymd_and_hms(2024, 4, 17, 15, 0, 0).unwrap();

        let stages = vec![PipelineStage::Densify {
            field: "_id".to_string(),
            granularity: BucketGranularity::Day,
            bounds: (lower, upper),
        }];

        // Empty collection still produces one row per day boundary
        let rows = store
            .run_aggregation_pipeline("TrackedEvents", &stages)
            .await
            .unwrap();
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0]["_id"], "2024-04-10T15:00:00Z");
        assert_eq!(rows[6]["_id"], "2024-04-16T15:00:00Z");
    }

    #[tokio::test]
    async fn test_densify_keeps_existing_rows_and_sorts() {
        let store = MemoryEventStore::new();
        store
            .seed(
                "Buckets",
                vec![json!({ "_id": "2024-04-17T00:00:00Z", "count": 3 })],
            )
            .await;

        let lower = Utc.with_ymd_and_hms(2024, 4, 10, 15, 0, 0).unwrap();
        let upper = Utc.with_ymd_and_hms(2024, 4, 17, 15, 0, 0).unwrap();
        let stages = vec![
            PipelineStage::Densify {
                field: "_id".to_string(),
                granularity: BucketGranularity::Day,
                bounds: (lower, upper),
            },
            PipelineStage::Fill {
                field: "count".to_string(),
                value: json!(0),
            },
        ];

        let rows = store.run_aggregation_pipeline("Buckets", &stages).await.unwrap();
        // 7 synthesized boundaries plus the existing normalized bucket
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[7]["_id"], "2024-04-17T00:00:00Z");
        assert_eq!(rows[7]["count"], 3);
        assert!(rows[..7].iter().all(|row| row["count"] == 0));
    }

    #[tokio::test]
    async fn test_group_sort_limit() {
        let store = MemoryEventStore::new();
        store
            .seed(
                "TrackedEvents",
                vec![
                    event_doc("e1", "RESTAURANT_VIEW", "2024-04-17T10:00:00Z", "r1"),
                    event_doc("e2", "RESTAURANT_VIEW", "2024-04-17T11:00:00Z", "r1"),
                    event_doc("e3", "RESTAURANT_VIEW", "2024-04-17T12:00:00Z", "r2"),
                    event_doc("e4", "RESTAURANT_VIEW", "2024-04-17T13:00:00Z", "r3"),
                ],
            )
            .await;

        let stages = vec![
            PipelineStage::GroupCount {
                key: "fonciiRestaurantID".to_string(),
            },
            PipelineStage::Sort {
                field: "count".to_string(),
                order: SortOrder::Descending,
            },
            PipelineStage::Limit(2),
        ];

        let rows = store
            .run_aggregation_pipeline("TrackedEvents", &stages)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["_id"], "r1");
        assert_eq!(rows[0]["count"], 2);
        assert_eq!(rows[1]["count"], 1);
    }

    #[tokio::test]
    async fn test_lookup_unwind_drops_unresolvable_rows() {
        let store = MemoryEventStore::new();
        store
            .seed(
                "Groups",
                vec![
                    json!({ "_id": "r1", "count": 5 }),
                    json!({ "_id": "ghost", "count": 4 }),
                ],
            )
            .await;
        store
            .seed("Restaurants", vec![json!({ "id": "r1", "name": "Blue Hill" })])
            .await;

        let stages = vec![
            PipelineStage::Lookup {
                from: "Restaurants".to_string(),
                local_field: "_id".to_string(),
                foreign_field: "id".to_string(),
                as_field: "restaurant".to_string(),
            },
            PipelineStage::Unwind {
                path: "restaurant".to_string(),
                preserve_null_and_empty: false,
            },
            PipelineStage::Set {
                field: "category".to_string(),
                path: "restaurant.name".to_string(),
            },
            PipelineStage::Project {
                fields: vec!["category".to_string(), "count".to_string()],
            },
        ];

        let rows = store.run_aggregation_pipeline("Groups", &stages).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], json!({ "category": "Blue Hill", "count": 5 }));
    }

    #[tokio::test]
    async fn test_bucket_timestamps_collapses_same_day() {
        let store = MemoryEventStore::new();
        store
            .seed(
                "TrackedEvents",
                vec![
                    event_doc("e1", "SHARE", "2024-04-17T09:00:00Z", "r1"),
                    event_doc("e2", "SHARE", "2024-04-17T21:30:00Z", "r1"),
                ],
            )
            .await;

        let stages = vec![
            PipelineStage::BucketTimestamps {
                field: "timestamp".to_string(),
                granularity: BucketGranularity::Day,
                output: "normalizedTimestamp".to_string(),
            },
            PipelineStage::GroupCount {
                key: "normalizedTimestamp".to_string(),
            },
        ];

        let rows = store
            .run_aggregation_pipeline("TrackedEvents", &stages)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["_id"], "2024-04-17T00:00:00Z");
        assert_eq!(rows[0]["count"], 2);
    }
}
