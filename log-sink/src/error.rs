//! Error types for the log-sink crate.

/// Errors that can occur while encoding or delivering a log payload.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The payload could not be encoded or decoded
    #[error("Invalid log payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// The collector endpoint is not a valid URL
    #[error("Invalid log endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// The request never reached the collector
    #[error("Failed to send log to server: {0}")]
    Delivery(#[from] reqwest::Error),

    /// The collector answered with a non-success status
    #[error("Log collector rejected payload with status {0}")]
    Rejected(u16),
}

/// Convenience type alias for Results using SinkError.
pub type Result<T> = std::result::Result<T, SinkError>;
