//! Configuration types for the playback session
//!
//! This module defines the options a [`SessionController`](crate::SessionController)
//! hands to the engine and the intervals it drives polling with.

use std::time::Duration;

use crate::error::{Result, SessionError};

/// Configuration for a playback session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name the engine registers its device under
    /// Default: "Web Player"
    pub player_name: String,

    /// Engine volume at startup, 0.0 to 1.0
    /// Default: 0.5
    pub initial_volume: f32,

    /// Interval of the periodic state poll once a device is selected
    /// Default: 1000 ms
    pub poll_interval: Duration,

    /// Interval at which the device-selection wait re-checks engine state
    /// Default: 100 ms
    pub device_wait_interval: Duration,

    /// Connect the engine as soon as it is constructed
    /// Default: true
    pub auto_connect: bool,

    /// Let the engine integrate with OS media controls
    /// Default: true
    pub enable_media_session: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            player_name: "Web Player".to_string(),
            initial_volume: 0.5,
            poll_interval: Duration::from_millis(1000),
            device_wait_interval: Duration::from_millis(100),
            auto_connect: true,
            enable_media_session: true,
        }
    }
}

impl SessionConfig {
    /// Create a configuration with the given player name and defaults otherwise
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            ..Default::default()
        }
    }

    /// Create a SessionConfig that tracks the engine more tightly
    pub fn fast_polling() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            device_wait_interval: Duration::from_millis(50),
            ..Default::default()
        }
    }

    pub fn with_initial_volume(mut self, volume: f32) -> Self {
        self.initial_volume = volume;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_auto_connect(mut self, auto_connect: bool) -> Self {
        self.auto_connect = auto_connect;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.player_name.trim().is_empty() {
            return Err(SessionError::Configuration(
                "player_name must not be empty".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.initial_volume) {
            return Err(SessionError::Configuration(format!(
                "initial_volume must be within 0.0..=1.0, got {}",
                self.initial_volume
            )));
        }

        if self.poll_interval.is_zero() {
            return Err(SessionError::Configuration(
                "poll_interval must be greater than 0".to_string(),
            ));
        }

        if self.device_wait_interval.is_zero() {
            return Err(SessionError::Configuration(
                "device_wait_interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
