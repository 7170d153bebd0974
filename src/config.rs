//! Configuration for the event analytics engine

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Default number of rows returned by distribution queries
pub const DEFAULT_DISTRIBUTION_LIMIT: usize = 10;

/// Engine configuration: collection names and query defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsConfig {
    /// Collection tracked events are appended to
    pub events_collection: String,
    /// Collection restaurant entities are joined from
    pub restaurants_collection: String,
    /// Row limit applied to distribution queries when unspecified
    pub default_distribution_limit: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            events_collection: "TrackedEvents".to_string(),
            restaurants_collection: "Restaurants".to_string(),
            default_distribution_limit: DEFAULT_DISTRIBUTION_LIMIT,
        }
    }
}

impl AnalyticsConfig {
    /// Loads configuration from the environment with built-in defaults
    ///
    /// Variables are prefixed with `FONCII_EVENTS`, e.g.
    /// `FONCII_EVENTS_EVENTS_COLLECTION`.
    pub fn from_env() -> Result<Self> {
        let config = config::Config::builder()
            .set_default("events_collection", "TrackedEvents")?
            .set_default("restaurants_collection", "Restaurants")?
            .set_default("default_distribution_limit", DEFAULT_DISTRIBUTION_LIMIT as i64)?
            .add_source(config::Environment::with_prefix("FONCII_EVENTS"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
