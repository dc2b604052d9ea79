//! Callbacks the session reports its progress through.

use crate::model::{DeviceId, SessionUpdate};

/// Receives session notifications.
///
/// All methods are called from the session task, one at a time, and default
/// to doing nothing. Implementations should return quickly; hand long work
/// off to another task.
pub trait SessionObserver: Send + Sync {
    /// The session started loading the engine runtime
    fn on_loading(&self) {}

    /// The engine is ready and the session waits for `device_id` to be selected
    fn on_waiting_for_device(&self, _device_id: &DeviceId) {}

    /// The device was selected for the first time
    fn on_device_selected(&self) {}

    /// The engine reported an error or a command failed
    fn on_player_error(&self, _message: &str) {}

    fn on_update(&self, _update: SessionUpdate) {}
}

/// Observer that ignores every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}
