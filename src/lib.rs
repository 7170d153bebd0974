//! Foncii Events Library
//!
//! Event analytics aggregation engine for the Foncii platform.
//! This library records user interaction events against an append-only
//! document store and derives analytics products from them: gap-filled
//! time series, ranked distributions, and windowed frequency deltas.

pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod limits;
pub mod pipeline;
pub mod service;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::{AnalyticsConfig, DEFAULT_DISTRIBUTION_LIMIT};
pub use error::{EventError, Result};
pub use event::{Event, EventPayload};
pub use filter::{Condition, EventFilter};
pub use limits::ObservationLimit;
pub use pipeline::{BucketGranularity, PipelineStage};
pub use service::{DistributionQuery, EventService};
pub use store::{EventStore, MemoryEventStore};
pub use types::{
    Bucketing, Distribution, EventType, LabelStyle, SortOrder, TimeSeriesEntry, Timespan,
};

/// Initialize logging with JSON formatting
pub fn init_logging() -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "foncii_events=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    Ok(())
}

/// Initialize logging with custom configuration
pub fn init_logging_with_config(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::new(level);

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        "text" | "pretty" => {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_span_events(FmtSpan::CLOSE),
                )
                .init();
        }
        "compact" => {
            registry
                .with(tracing_subscriber::fmt::layer().compact())
                .init();
        }
        _ => {
            return Err(EventError::validation(format!(
                "Unknown log format: {}",
                format
            )));
        }
    }

    Ok(())
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get version info as a formatted string
pub fn version_info() -> String {
    format!("{} v{} - {}", NAME, VERSION, DESCRIPTION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Verify that main types are exported
        let _: Result<()> = Ok(());
        let _config = AnalyticsConfig::default();
        let _filter = EventFilter::new();
    }

    #[test]
    fn test_version_info() {
        let info = version_info();
        assert!(info.contains("foncii-events"));
        assert!(info.contains("v"));
    }

    #[test]
    fn test_logging_init() {
        // Note: This might fail if logging is already initialized
        let result = init_logging_with_config("debug", "compact");
        match result {
            Ok(()) => println!("Logging initialized successfully"),
            Err(e) => println!("Logging init failed (might be already initialized): {}", e),
        }

        assert!(init_logging_with_config("debug", "yaml").is_err());
    }
}
