//! Event analytics service
//!
//! The entry point for the engine: records incoming events (enforcing the
//! actor invariant and observation limits), and derives the analytics
//! products from the accumulated event log — gap-filled time series, ranked
//! distributions, windowed frequencies, and relative change.

use crate::config::AnalyticsConfig;
use crate::error::Result;
use crate::event::Event;
use crate::filter::EventFilter;
use crate::limits::{self, ObservationLimit};
use crate::pipeline::PipelineStage;
use crate::store::EventStore;
use crate::types::{Distribution, EventType, SortOrder, TimeSeriesEntry, Timespan};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Raw time series bucket row returned by the aggregation pipeline
#[derive(Debug, Deserialize)]
struct TimeSeriesRow {
    #[serde(rename = "_id")]
    bucket: DateTime<Utc>,
    count: u64,
}

/// Parameters for a distribution query
///
/// Groups occurrences of an event type by a referenced entity id, ranks the
/// groups by raw occurrence count, then joins in a display name.
#[derive(Debug, Clone)]
pub struct DistributionQuery {
    pub event_type: EventType,
    /// Event field holding the referenced entity id
    pub group_by_field: String,
    /// Collection the entity is joined from
    pub join_collection: String,
    /// Entity field matched against the grouped id
    pub join_field: String,
    /// Entity field projected as the distribution category
    pub display_field: String,
    /// Additional match properties
    pub filter: EventFilter,
    pub limit: usize,
    pub sort_order: SortOrder,
}

impl DistributionQuery {
    pub fn new(
        event_type: EventType,
        group_by_field: impl Into<String>,
        join_collection: impl Into<String>,
        join_field: impl Into<String>,
        display_field: impl Into<String>,
    ) -> Self {
        Self {
            event_type,
            group_by_field: group_by_field.into(),
            join_collection: join_collection.into(),
            join_field: join_field.into(),
            display_field: display_field.into(),
            filter: EventFilter::new(),
            limit: crate::config::DEFAULT_DISTRIBUTION_LIMIT,
            sort_order: SortOrder::Descending,
        }
    }

    pub fn with_filter(mut self, filter: EventFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = sort_order;
        self
    }
}

/// The event analytics aggregation engine
#[derive(Debug)]
pub struct EventService<S> {
    store: S,
    config: AnalyticsConfig,
}

impl<S: EventStore> EventService<S> {
    /// Creates a service with default configuration
    pub fn new(store: S) -> Self {
        Self::with_config(store, AnalyticsConfig::default())
    }

    pub fn with_config(store: S, config: AnalyticsConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Records an event, returning whether it was persisted
    ///
    /// Returns `Ok(false)` — never an error — when the event is discarded:
    /// either it has no attributable actor, or its type is observation
    /// limited and the acting user/session has exhausted their quota within
    /// the rolling window. Clients must treat "not recorded" as silent.
    pub async fn record(&self, event: &Event) -> Result<bool> {
        // An event that cannot be attributed to anyone has no analytical value
        if !event.has_actor() {
            debug!(event_type = %event.event_type, "discarding actor-less event");
            return Ok(false);
        }

        if ObservationLimit::for_event_type(event.event_type).is_some() {
            let properties = limits::correlation_filter(event).unwrap_or_default();
            if !self
                .is_event_currently_observable(event.event_type, properties)
                .await?
            {
                debug!(
                    event_type = %event.event_type,
                    "discarding event over its observation limit"
                );
                return Ok(false);
            }
        }

        let document = serde_json::to_value(event)?;
        self.store
            .insert_time_series_document(
                &self.config.events_collection,
                &event.id,
                document,
                &["timestamp"],
            )
            .await
    }

    /// Whether a new occurrence of an event type may currently be observed
    /// for the actor/subject described by `properties`
    ///
    /// Event types without an observation limit are always observable. The
    /// count-then-write sequence is not transactional, so concurrent
    /// recorders can briefly overshoot the limit; the limiter deters bulk
    /// abuse rather than providing a hard guarantee.
    pub async fn is_event_currently_observable(
        &self,
        event_type: EventType,
        properties: EventFilter,
    ) -> Result<bool> {
        let Some(limit) = ObservationLimit::for_event_type(event_type) else {
            return Ok(true);
        };

        let observation_start_date = Utc::now();
        let observation_end_date = observation_start_date - limit.observation_period;

        let frequency = self
            .get_event_frequency(
                event_type,
                observation_start_date,
                observation_end_date,
                properties,
            )
            .await?;

        Ok(frequency < limit.maximum_event_frequency)
    }

    /// Counts occurrences of an event type within an observation window
    pub async fn get_event_frequency(
        &self,
        event_type: EventType,
        observation_start_date: DateTime<Utc>,
        observation_end_date: DateTime<Utc>,
        properties: EventFilter,
    ) -> Result<u64> {
        let predicate = properties
            .event_type(event_type)
            .timestamp_between(observation_end_date, observation_start_date);
        self.store
            .count_where(&self.config.events_collection, &predicate)
            .await
    }

    /// Counts occurrences of an event type over all time
    pub async fn get_total_event_count(
        &self,
        event_type: EventType,
        properties: EventFilter,
    ) -> Result<u64> {
        let predicate = properties.event_type(event_type);
        self.store
            .count_where(&self.config.events_collection, &predicate)
            .await
    }

    /// Computes the signed change in event frequency between the given
    /// window and the equal-length window immediately preceding it
    ///
    /// Returns the raw delta (`current - previous`), not a percentage;
    /// callers divide by the previous count themselves and must handle a
    /// zero previous count.
    pub async fn compute_relative_change(
        &self,
        event_type: EventType,
        observation_start_date: DateTime<Utc>,
        observation_end_date: DateTime<Utc>,
        properties: EventFilter,
    ) -> Result<i64> {
        let window = observation_start_date - observation_end_date;
        let prev_observation_start_date = observation_end_date;
        let prev_observation_end_date = prev_observation_start_date - window;

        // The two window counts are independent reads
        let (current, previous) = tokio::try_join!(
            self.get_event_frequency(
                event_type,
                observation_start_date,
                observation_end_date,
                properties.clone(),
            ),
            self.get_event_frequency(
                event_type,
                prev_observation_start_date,
                prev_observation_end_date,
                properties,
            ),
        )?;

        Ok(current as i64 - previous as i64)
    }

    /// Computes a contiguous, gap-filled time series for an event type over
    /// the requested timespan
    ///
    /// Buckets are grouped at the timespan's granularity, densified so no
    /// boundary between the window edges is missing, zero-filled, then
    /// formatted into display labels. Buckets whose labels coincide are
    /// summed in first-seen order; `category` tags the series when several
    /// are combined into one chart.
    pub async fn compute_time_series(
        &self,
        event_type: EventType,
        properties: EventFilter,
        timespan: Timespan,
        observation_start_date: DateTime<Utc>,
        category: Option<String>,
    ) -> Result<TimeSeriesEntry> {
        let observation_end_date = timespan.observation_end(observation_start_date);
        let bucketing = timespan.bucketing();

        let stages = vec![
            PipelineStage::Match(
                properties
                    .event_type(event_type)
                    .timestamp_between(observation_end_date, observation_start_date),
            ),
            PipelineStage::BucketTimestamps {
                field: "timestamp".to_string(),
                granularity: bucketing.granularity,
                output: "normalizedTimestamp".to_string(),
            },
            PipelineStage::GroupCount {
                key: "normalizedTimestamp".to_string(),
            },
            PipelineStage::Densify {
                field: "_id".to_string(),
                granularity: bucketing.granularity,
                bounds: (observation_end_date, observation_start_date),
            },
            PipelineStage::Fill {
                field: "count".to_string(),
                value: json!(0),
            },
        ];

        let rows = self
            .store
            .run_aggregation_pipeline(&self.config.events_collection, &stages)
            .await?;

        // Distinct buckets can format to the same display label (weekday
        // names over a one-week span, leap-year artifacts); their counts are
        // summed, preserving first-seen order for positioning.
        let mut merged: IndexMap<String, u64> = IndexMap::new();
        for row in rows {
            let bucket: TimeSeriesRow = serde_json::from_value(row)?;
            let label = bucketing.label.format(bucket.bucket);
            *merged.entry(label).or_insert(0) += bucket.count;
        }

        let (timestamps, data) = merged.into_iter().unzip();
        Ok(TimeSeriesEntry {
            category,
            timestamps,
            data,
        })
    }

    /// Computes a ranked distribution of event occurrences grouped by a
    /// referenced entity
    ///
    /// Ranking and truncation happen on raw occurrence counts before the
    /// join, so the lookup only touches the retained groups. Groups whose
    /// entity can no longer be resolved are dropped from the output; groups
    /// joining to the same display name remain separate rows.
    pub async fn compute_event_distribution(
        &self,
        query: DistributionQuery,
    ) -> Result<Vec<Distribution>> {
        let stages = vec![
            PipelineStage::Match(query.filter.event_type(query.event_type)),
            PipelineStage::GroupCount {
                key: query.group_by_field,
            },
            PipelineStage::Sort {
                field: "count".to_string(),
                order: query.sort_order,
            },
            PipelineStage::Limit(query.limit),
            PipelineStage::Lookup {
                from: query.join_collection,
                local_field: "_id".to_string(),
                foreign_field: query.join_field,
                as_field: "entity".to_string(),
            },
            PipelineStage::Unwind {
                path: "entity".to_string(),
                preserve_null_and_empty: false,
            },
            PipelineStage::Set {
                field: "category".to_string(),
                path: format!("entity.{}", query.display_field),
            },
            PipelineStage::Project {
                fields: vec!["category".to_string(), "count".to_string()],
            },
        ];

        let rows = self
            .store
            .run_aggregation_pipeline(&self.config.events_collection, &stages)
            .await?;

        rows.into_iter()
            .map(|row| Ok(serde_json::from_value(row)?))
            .collect()
    }

    /// Distribution of an event type grouped by restaurant, categorized by
    /// restaurant display name
    pub async fn compute_distribution_by_restaurant_name(
        &self,
        event_type: EventType,
        properties: EventFilter,
    ) -> Result<Vec<Distribution>> {
        let query = DistributionQuery::new(
            event_type,
            "fonciiRestaurantID",
            &self.config.restaurants_collection,
            "id",
            "name",
        )
        .with_filter(properties)
        .with_limit(self.config.default_distribution_limit);

        self.compute_event_distribution(query).await
    }
}
