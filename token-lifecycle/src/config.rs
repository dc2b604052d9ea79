//! Configuration for token renewal and authenticated requests.

use std::time::Duration;
use url::Url;

use crate::error::{AuthError, Result};

/// Configuration shared by the refresh endpoint, the manager and the transport.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// OAuth2 token endpoint used for `refresh_token` grants
    /// Default: "https://accounts.spotify.com/api/token"
    pub token_url: String,

    /// Public client identifier sent with every refresh
    /// Default: empty (must be set)
    pub client_id: String,

    /// Base URL that relative request paths are joined to
    /// Default: "https://api.spotify.com/v1/"
    pub api_base_url: String,

    /// How long before expiry the proactive renewal fires
    /// Default: 60 seconds
    pub renewal_lead: Duration,

    /// Per-request timeout for the HTTP client
    /// Default: 10 seconds
    pub request_timeout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            client_id: String::new(),
            api_base_url: "https://api.spotify.com/v1/".to_string(),
            renewal_lead: Duration::from_secs(60),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl AuthConfig {
    /// Create a configuration for `client_id` with default endpoints
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..Default::default()
        }
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Parsed token endpoint
    pub fn token_url(&self) -> Result<Url> {
        Url::parse(&self.token_url)
            .map_err(|e| AuthError::Configuration(format!("invalid token_url: {e}")))
    }

    /// Parsed API base URL, normalized to end with `/` so that joins append
    pub fn api_base_url(&self) -> Result<Url> {
        let mut base = self.api_base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        Url::parse(&base)
            .map_err(|e| AuthError::Configuration(format!("invalid api_base_url: {e}")))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() {
            return Err(AuthError::Configuration(
                "client_id must not be empty".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(AuthError::Configuration(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        self.token_url()?;
        self.api_base_url()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AuthConfig::default();
        assert_eq!(config.renewal_lead, Duration::from_secs(60));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(config.validate().is_err()); // client_id missing
    }

    #[test]
    fn test_new_config_validates() {
        let config = AuthConfig::new("client");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_api_base_url_gets_trailing_slash() {
        let config = AuthConfig::new("client").with_api_base_url("http://localhost:1234/v1");
        let base = config.api_base_url().unwrap();
        assert_eq!(base.join("me").unwrap().as_str(), "http://localhost:1234/v1/me");
    }

    #[test]
    fn test_invalid_token_url() {
        let config = AuthConfig::new("client").with_token_url("not a url");
        assert!(matches!(
            config.validate(),
            Err(AuthError::Configuration(msg)) if msg.contains("token_url")
        ));
    }
}
