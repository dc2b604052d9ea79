//! Model types for playback-session

mod id_types;
mod playback_state;
mod session_state;

pub use id_types::{DeviceId, TrackId};
pub use playback_state::{Artist, PlaybackState, TrackInfo, TrackWindow};
pub use session_state::{SessionPhase, SessionState, SessionUpdate};
