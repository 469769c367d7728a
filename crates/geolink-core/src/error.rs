//! Error types for geolink-core.
//!
//! Transport-level failures (connect errors, abrupt closes, rejected
//! writes) are recovered locally by the link manager and never surface
//! as fatal errors; the variants here cover configuration problems,
//! serialization, and the few operations that can genuinely fail.

use thiserror::Error;

/// Errors that can occur in the reporting pipeline.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error
/// variants in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// WebSocket transport error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Failed to serialize a report payload.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Operation attempted while the link is not connected.
    #[error("link is not connected")]
    NotConnected,

    /// Fix source failed to start or was started twice.
    #[error("fix source error: {0}")]
    FixSource(String),

    /// Operation was cancelled during shutdown.
    #[error("operation cancelled")]
    Cancelled,

    /// Invalid configuration provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create a fix source error.
    pub fn fix_source(message: impl Into<String>) -> Self {
        Self::FixSource(message.into())
    }
}

/// Result type alias using geolink-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_config("retry_interval must be > 0");
        assert_eq!(
            err.to_string(),
            "invalid configuration: retry_interval must be > 0"
        );

        let err = Error::NotConnected;
        assert_eq!(err.to_string(), "link is not connected");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("refused"));
    }
}
