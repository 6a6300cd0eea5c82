//! Error types for the onehop worker
//!
//! Each component boundary has its own error enum; the unified [`Error`]
//! wraps them for the few places that cross boundaries. Inside the worker
//! loop, errors never escape an invocation: they are converted to a
//! [`crate::worker::CrawlOutcome`] or logged and dropped.

use thiserror::Error;

/// Errors that can occur during HTTP fetching operations
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server responded with a non-success status
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Content-Type header missing or not HTML
    #[error("Not an HTML response: {0:?}")]
    NotHtml(Option<String>),
}

/// Errors that can occur during reader-mode extraction
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The extraction pass itself failed
    #[error("Reader-mode extraction failed: {0}")]
    ExtractionFailed(String),

    /// Invalid document URL
    #[error("Invalid document URL: {0}")]
    InvalidUrl(String),
}

/// Errors from the crawl ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Underlying store error
    #[error("Ledger store error: {0}")]
    Store(#[from] redis::RedisError),

    /// Entry could not be serialized or deserialized
    #[error("Ledger serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the event publisher
#[derive(Error, Debug)]
pub enum PublishError {
    /// Transport-level publish failure
    #[error("Publish failed: {0}")]
    Transport(String),

    /// Event could not be serialized
    #[error("Event serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<async_nats::PublishError> for PublishError {
    fn from(err: async_nats::PublishError) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Unified error type for the onehop crate
#[derive(Error, Debug)]
pub enum Error {
    /// Fetch-specific errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Extraction errors
    #[error("Extract error: {0}")]
    Extract(#[from] ExtractError),

    /// Ledger errors
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Publish errors
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let fetch_err = FetchError::ServerError(503);
        let unified: Error = fetch_err.into();
        assert!(matches!(unified, Error::Fetch(_)));

        let extract_err = ExtractError::InvalidUrl("not a url".to_string());
        let unified: Error = extract_err.into();
        assert!(matches!(unified, Error::Extract(_)));
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("allow pattern list is empty");
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("allow pattern list"));
    }

    #[test]
    fn test_not_html_display() {
        let err = FetchError::NotHtml(Some("application/json".to_string()));
        assert!(err.to_string().contains("application/json"));
    }
}
