//! Web API playback commands.

use async_trait::async_trait;
use reqwest::{Method, Response};
use serde_json::json;
use token_lifecycle::AuthenticatedTransport;
use tracing::debug;

use crate::error::EngineError;
use crate::model::DeviceId;

/// Remote control of playback, used to move playback onto the engine's
/// device once it is ready
#[async_trait]
pub trait PlaybackRemote: Send + Sync {
    async fn transfer_playback(&self, device_id: &DeviceId) -> Result<(), EngineError>;
}

/// Player endpoints of the provider's Web API
#[derive(Clone)]
pub struct WebPlayerApi {
    transport: AuthenticatedTransport,
}

impl WebPlayerApi {
    pub fn new(transport: AuthenticatedTransport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &AuthenticatedTransport {
        &self.transport
    }

    /// `PUT me/player/seek?position_ms=..`
    pub async fn seek(&self, position_ms: u64) -> Result<(), EngineError> {
        let request = self
            .transport
            .request(Method::PUT, "me/player/seek")?
            .query(&[("position_ms", position_ms)]);
        let response = self.transport.send(request).await?;
        check("Seek", response)
    }

    /// `POST me/player/next`
    pub async fn next_track(&self) -> Result<(), EngineError> {
        let request = self.transport.request(Method::POST, "me/player/next")?;
        let response = self.transport.send(request).await?;
        check("Skip to next track", response)
    }
}

#[async_trait]
impl PlaybackRemote for WebPlayerApi {
    /// `PUT me/player` with `{"device_ids": [device_id]}`
    async fn transfer_playback(&self, device_id: &DeviceId) -> Result<(), EngineError> {
        debug!(%device_id, "Transferring playback");
        let request = self
            .transport
            .request(Method::PUT, "me/player")?
            .json(&json!({ "device_ids": [device_id] }));
        let response = self.transport.send(request).await?;
        check("Transfer playback", response)
    }
}

fn check(action: &'static str, response: Response) -> Result<(), EngineError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(EngineError::Status {
            action,
            status: status.as_u16(),
        })
    }
}
