//! Error types for the playback-session crate.

use token_lifecycle::TransportError;

/// Errors surfaced by the session controller and its handle.
///
/// Engine and catalog failures during a session are reported to the
/// [`SessionObserver`](crate::SessionObserver) and never end it, so they
/// have no variant here.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Invalid configuration provided
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The session task has already ended
    #[error("Session closed")]
    Closed,

    /// An error occurred during shutdown
    #[error("Shutdown error: {0}")]
    Shutdown(String),
}

/// Errors from engine commands and the Web API remote.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine has no live connection
    #[error("Engine not connected")]
    NotConnected,

    /// The engine rejected or failed a command
    #[error("Engine command failed: {0}")]
    Command(String),

    /// A Web API call answered with a non-success status
    #[error("{action} failed with status {status}")]
    Status {
        /// What was being attempted
        action: &'static str,
        /// HTTP status returned
        status: u16,
    },

    /// A Web API call could not be completed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Errors from loading the track-timeout catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A start offset is not `[[HH:]MM:]SS[.fff]`
    #[error("Invalid start offset: {0:?}")]
    InvalidOffset(String),

    /// A forced duration is negative or not a number
    #[error("Invalid duration for {track:?}: {duration}")]
    InvalidDuration {
        /// Track the entry belongs to
        track: String,
        /// Duration in seconds as received
        duration: f64,
    },

    /// The catalog request failed
    #[error("Catalog fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The catalog source answered with a non-success status
    #[error("Catalog source returned status {0}")]
    Rejected(u16),
}

/// Convenience type alias for Results using SessionError.
pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_display() {
        assert_eq!(SessionError::Closed.to_string(), "Session closed");
        assert_eq!(
            SessionError::Configuration("poll_interval must be greater than 0".to_string())
                .to_string(),
            "Configuration error: poll_interval must be greater than 0"
        );
    }

    #[test]
    fn test_engine_error_display() {
        let error = EngineError::Status {
            action: "Transfer playback",
            status: 404,
        };
        assert_eq!(error.to_string(), "Transfer playback failed with status 404");
        assert_eq!(EngineError::NotConnected.to_string(), "Engine not connected");
    }

    #[test]
    fn test_catalog_error_display() {
        let error = CatalogError::InvalidOffset("1:xx".to_string());
        assert_eq!(error.to_string(), "Invalid start offset: \"1:xx\"");

        let error = CatalogError::InvalidDuration {
            track: "Intro".to_string(),
            duration: -1.0,
        };
        assert_eq!(error.to_string(), "Invalid duration for \"Intro\": -1");
    }
}
