//! Error handling for the event analytics engine

use thiserror::Error;

/// Result type alias for event analytics operations
pub type Result<T> = std::result::Result<T, EventError>;

/// Main error type for event analytics operations
#[derive(Error, Debug)]
pub enum EventError {
    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Generic errors
    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),

    /// Event store errors (connectivity, timeouts, rejected writes)
    #[error("Store error: {message}")]
    Store { message: String },

    /// Malformed aggregation pipeline or stage input
    #[error("Pipeline error: {message}")]
    Pipeline { message: String },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl EventError {
    /// Create a store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a pipeline error
    pub fn pipeline<S: Into<String>>(message: S) -> Self {
        Self::Pipeline {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Check if error is retryable
    ///
    /// The engine itself never retries; callers may use this to decide
    /// whether a failed call is worth reissuing.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store { .. })
    }
}
