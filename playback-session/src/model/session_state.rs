//! Session-level state published by the controller

use serde::{Deserialize, Serialize};

use super::{DeviceId, PlaybackState, TrackId};

/// Lifecycle phase of a playback session
///
/// ```text
/// Uninitialized → WaitingForEngine → Connecting → WaitingForDevice → Active ⇄ Paused
///                                                        ↑              │
///                                                        └─ device lost ┘
/// any → Disconnected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    #[default]
    Uninitialized,
    /// Waiting for the engine runtime to load
    WaitingForEngine,
    /// Engine constructed, connection being opened
    Connecting,
    /// Connected; waiting for the device to be selected for playback
    WaitingForDevice,
    /// Device selected and playing
    Active,
    /// Device selected, playback paused
    Paused,
    /// Torn down
    Disconnected,
}

impl SessionPhase {
    /// True while a device is selected and being polled
    pub fn is_polling(&self) -> bool {
        matches!(self, SessionPhase::Active | SessionPhase::Paused)
    }
}

/// Snapshot of the session as seen by callers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Whether the engine connection is open
    pub connected: bool,
    /// Device assigned by the engine once ready
    pub device_id: Option<DeviceId>,
    /// Whether this engine's device is the active playback target
    pub is_active_device: bool,
    /// Last track the engine reported
    pub current_track_id: Option<TrackId>,
    pub paused: bool,
}

/// Change notification delivered to the observer's `on_update`
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// A new playback state snapshot
    State(PlaybackState),
    /// The engine's device id became known
    DeviceId(DeviceId),
    /// The engine's device became the active playback target
    ActiveDevice(DeviceId),
}
