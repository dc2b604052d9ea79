//! The seam to the embedded playback engine.
//!
//! The engine itself (audio decoding, DRM, the provider's streaming protocol)
//! lives outside this crate. The controller only needs what is described
//! here: a factory that says when the engine runtime is loaded and builds an
//! instance, and an instance that can connect, report state and follow a few
//! commands. Anything the engine pushes on its own arrives as an
//! [`EngineEvent`] on the channel handed to [`EngineFactory::create`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use token_lifecycle::TokenSource;
use tokio::sync::mpsc;

use crate::error::EngineError;
use crate::model::{DeviceId, PlaybackState};

/// Channel an engine pushes its events into
pub type EngineEventSender = mpsc::UnboundedSender<EngineEvent>;

/// Category of an error event reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineErrorKind {
    /// The engine could not start (unsupported platform, missing codecs)
    Initialization,
    /// The access token was rejected
    Authentication,
    /// The account cannot use the engine (e.g. not premium)
    Account,
    /// A track failed to play
    Playback,
}

impl EngineErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineErrorKind::Initialization => "initialization_error",
            EngineErrorKind::Authentication => "authentication_error",
            EngineErrorKind::Account => "account_error",
            EngineErrorKind::Playback => "playback_error",
        }
    }
}

impl fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something the engine reports without being asked
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The engine registered its device
    Ready { device_id: DeviceId },
    /// The engine's device went offline
    NotReady { device_id: DeviceId },
    /// Playback state changed; `None` when this device is no longer playing
    StateChanged(Option<PlaybackState>),
    Error {
        kind: EngineErrorKind,
        message: String,
    },
}

/// Options an engine instance is constructed with
#[derive(Clone)]
pub struct PlayerOptions {
    /// Device name shown in the provider's device picker
    pub name: String,
    pub initial_volume: f32,
    pub enable_media_session: bool,
    /// Where the engine fetches an access token whenever it needs one
    pub tokens: Arc<dyn TokenSource>,
}

impl fmt::Debug for PlayerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerOptions")
            .field("name", &self.name)
            .field("initial_volume", &self.initial_volume)
            .field("enable_media_session", &self.enable_media_session)
            .finish_non_exhaustive()
    }
}

/// A constructed engine instance
#[async_trait]
pub trait PlaybackEngine: Send + Sync {
    /// Open the connection. `Ok(false)` means the engine declined.
    async fn connect(&self) -> Result<bool, EngineError>;

    /// Close the connection. Must be safe to call when already closed.
    async fn disconnect(&self);

    /// Current playback state, `None` when this device is not playing
    async fn current_state(&self) -> Option<PlaybackState>;

    async fn seek(&self, position_ms: u64) -> Result<(), EngineError>;

    async fn next_track(&self) -> Result<(), EngineError>;
}

/// Loads the engine runtime and builds instances
#[async_trait]
pub trait EngineFactory: Send + Sync {
    /// Resolve once the engine runtime is available
    async fn wait_until_ready(&self);

    /// Build an engine that reports its events to `events`
    fn create(&self, options: PlayerOptions, events: EngineEventSender) -> Arc<dyn PlaybackEngine>;
}
