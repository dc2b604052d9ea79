//! Token refresh endpoint.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

use crate::config::AuthConfig;
use crate::credential::REFRESH_TOKEN_KEY;
use crate::error::{AuthError, RefreshError, Result};
use crate::store::CredentialStore;

/// Successful answer of a token exchange.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime of `access_token` in seconds
    pub expires_in: u64,
    /// Present when the server rotates the refresh token
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Exchanges stored refresh material for a new access token.
#[async_trait]
pub trait RefreshEndpoint: Send + Sync {
    async fn refresh(&self) -> std::result::Result<TokenResponse, RefreshError>;
}

/// OAuth2 `refresh_token` grant against a token endpoint.
///
/// The refresh token is read from the credential store on every call, and a
/// rotated refresh token is written back before the response is returned.
pub struct HttpRefreshEndpoint {
    client: reqwest::Client,
    token_url: Url,
    client_id: String,
    store: Arc<dyn CredentialStore>,
}

impl HttpRefreshEndpoint {
    pub fn new(config: &AuthConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AuthError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            token_url: config.token_url()?,
            client_id: config.client_id.clone(),
            store,
        })
    }
}

#[async_trait]
impl RefreshEndpoint for HttpRefreshEndpoint {
    async fn refresh(&self) -> std::result::Result<TokenResponse, RefreshError> {
        let refresh_token = self
            .store
            .get(REFRESH_TOKEN_KEY)
            .ok_or(RefreshError::MissingRefreshToken)?
            .value;

        let response = self
            .client
            .post(self.token_url.clone())
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", self.client_id.as_str()),
            ])
            .send()
            .await
            .map_err(|e| RefreshError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;

        if let Some(rotated) = &token.refresh_token {
            self.store.set(REFRESH_TOKEN_KEY, rotated.clone(), None);
        }

        Ok(token)
    }
}
