//! Event store adapter seam
//!
//! The engine treats persistence as an external collaborator: an append-only,
//! time-series-capable document store with an aggregation-pipeline executor.
//! [`memory::MemoryEventStore`] is the in-process reference implementation of
//! this contract, used by the test suite and for local development.

pub mod memory;

use crate::error::Result;
use crate::filter::EventFilter;
use crate::pipeline::PipelineStage;
use async_trait::async_trait;
use serde_json::Value;

pub use memory::MemoryEventStore;

/// Capability surface the analytics engine requires from a document store
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Inserts a document once by id, with the named fields coerced to the
    /// store's native date type so range queries work
    ///
    /// Returns `false` without writing when a document with the id already
    /// exists.
    async fn insert_time_series_document(
        &self,
        collection: &str,
        id: &str,
        document: Value,
        date_fields: &[&str],
    ) -> Result<bool>;

    /// Counts documents matching a predicate
    async fn count_where(&self, collection: &str, predicate: &EventFilter) -> Result<u64>;

    /// Executes an ordered list of aggregation stages against a collection
    async fn run_aggregation_pipeline(
        &self,
        collection: &str,
        stages: &[PipelineStage],
    ) -> Result<Vec<Value>>;
}
