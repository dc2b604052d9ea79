//! Authenticated HTTP transport with one-shot 401 recovery.

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Method, Request, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::AuthConfig;
use crate::error::{AuthError, Result, TransportError};
use crate::manager::TokenLifecycleManager;

/// HTTP client that authenticates every request with the manager's token.
///
/// When a response comes back `401 Unauthorized` the transport forces a
/// renewal (joining one already in flight) and replays the request once with
/// the new token. Whatever the replay returns is handed back as-is, so a
/// server that keeps rejecting the renewed token costs exactly one extra
/// request. If the renewal itself fails the caller gets
/// [`TransportError::Unauthorized`].
///
/// Other statuses pass through untouched; use
/// [`Response::error_for_status`] where an error is wanted.
#[derive(Clone)]
pub struct AuthenticatedTransport {
    client: reqwest::Client,
    base_url: Url,
    tokens: TokenLifecycleManager,
}

impl AuthenticatedTransport {
    pub fn new(config: &AuthConfig, tokens: TokenLifecycleManager) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AuthError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url()?,
            tokens,
        })
    }

    pub fn tokens(&self) -> &TokenLifecycleManager {
        &self.tokens
    }

    /// Resolve `path` against the API base URL. Absolute URLs are kept.
    pub fn url(&self, path: &str) -> std::result::Result<Url, TransportError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Start a request to `path`; finish it with [`send`](Self::send).
    pub fn request(
        &self,
        method: Method,
        path: &str,
    ) -> std::result::Result<RequestBuilder, TransportError> {
        Ok(self.client.request(method, self.url(path)?))
    }

    pub async fn send(&self, builder: RequestBuilder) -> std::result::Result<Response, TransportError> {
        self.execute(builder.build()?).await
    }

    /// Issue `request`, recovering from a single `401`.
    pub async fn execute(&self, request: Request) -> std::result::Result<Response, TransportError> {
        let url = request.url().to_string();
        let replay = request
            .try_clone()
            .ok_or(TransportError::RequestNotCloneable)?;

        let response = self.dispatch(request, self.tokens.current_token()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::warn!(%url, "Request unauthorized, forcing token renewal");
        match self.tokens.force_renew().await {
            Ok(credential) => {
                tracing::debug!(%url, "Replaying request with renewed token");
                self.dispatch(replay, Some(credential.value)).await
            }
            Err(source) => Err(TransportError::Unauthorized { url, source }),
        }
    }

    /// GET `path` and decode a successful JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> std::result::Result<T, TransportError> {
        let response = self
            .send(self.request(Method::GET, path)?)
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn dispatch(
        &self,
        mut request: Request,
        token: Option<String>,
    ) -> std::result::Result<Response, TransportError> {
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| TransportError::InvalidHeader)?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        Ok(self.client.execute(request).await?)
    }
}
