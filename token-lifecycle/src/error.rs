//! Error types for the token-lifecycle crate.

/// Top-level errors surfaced by this crate.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Invalid configuration provided
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Renewing the access token failed
    #[error("Token renewal failed: {0}")]
    Refresh(#[from] RefreshError),

    /// An authenticated request failed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Outcome of a failed token renewal.
///
/// `Clone` so that a single renewal result can be handed to every waiter of
/// the single-flight slot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    /// No refresh token is stored, so there is nothing to exchange
    #[error("No refresh token available")]
    MissingRefreshToken,

    /// The refresh request never completed
    #[error("Refresh request failed: {0}")]
    Request(String),

    /// The authorization server refused the exchange
    #[error("Refresh rejected with status {status}: {body}")]
    Rejected {
        /// HTTP status returned by the token endpoint
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// The token endpoint answered with something that is not a token
    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    /// The renewal task was cancelled or panicked before producing a result
    #[error("Renewal task aborted: {0}")]
    Aborted(String),
}

/// Errors from [`AuthenticatedTransport`](crate::AuthenticatedTransport).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request was rejected with 401 and the forced renewal failed
    #[error("Request to {url} unauthorized and token renewal failed: {source}")]
    Unauthorized {
        /// URL of the rejected request
        url: String,
        /// Why the renewal failed
        #[source]
        source: RefreshError,
    },

    /// The underlying HTTP client failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request body is a stream and cannot be replayed after a 401
    #[error("Request body cannot be replayed")]
    RequestNotCloneable,

    /// The token contains characters not allowed in a header
    #[error("Access token is not a valid header value")]
    InvalidHeader,

    /// A request path could not be joined to the API base URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Convenience type alias for Results using AuthError.
pub type Result<T> = std::result::Result<T, AuthError>;
