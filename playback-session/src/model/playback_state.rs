//! Playback state snapshot reported by the engine

use serde::{Deserialize, Serialize};

use super::TrackId;

/// Snapshot of what the engine is playing
///
/// Mirrors the shape the engine reports, so a raw state object deserializes
/// directly:
///
/// ```json
/// {
///   "paused": false,
///   "position": 1200,
///   "duration": 215000,
///   "track_window": { "current_track": { "id": "...", "name": "...", "uri": "..." } }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Whether playback is paused
    #[serde(default)]
    pub paused: bool,
    /// Playback position in milliseconds
    #[serde(default, rename = "position")]
    pub position_ms: u64,
    /// Duration of the current track in milliseconds
    #[serde(default, rename = "duration")]
    pub duration_ms: u64,
    #[serde(default)]
    pub track_window: TrackWindow,
}

/// Tracks around the playback position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackWindow {
    #[serde(default)]
    pub current_track: Option<TrackInfo>,
}

/// A track as reported by the engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    /// Provider track id; absent for local files
    #[serde(default)]
    pub id: Option<TrackId>,
    /// Display name, the key for timeout overrides
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub artists: Vec<Artist>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub name: String,
    #[serde(default)]
    pub uri: Option<String>,
}

impl PlaybackState {
    /// Create a state playing `track`
    pub fn playing(track: TrackInfo) -> Self {
        Self {
            track_window: TrackWindow {
                current_track: Some(track),
            },
            ..Default::default()
        }
    }

    pub fn with_paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    pub fn current_track(&self) -> Option<&TrackInfo> {
        self.track_window.current_track.as_ref()
    }

    pub fn track_id(&self) -> Option<&TrackId> {
        self.current_track().and_then(|track| track.id.as_ref())
    }

    pub fn track_name(&self) -> Option<&str> {
        self.current_track().map(|track| track.name.as_str())
    }
}

impl TrackInfo {
    pub fn new(id: impl Into<TrackId>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_engine_state() {
        let json = r#"{
            "paused": true,
            "position": 1200,
            "duration": 215000,
            "shuffle": false,
            "track_window": {
                "current_track": {
                    "id": "4uLU6hMCjMI75M1A2tKUQC",
                    "name": "Never Gonna Give You Up",
                    "uri": "spotify:track:4uLU6hMCjMI75M1A2tKUQC",
                    "artists": [{ "name": "Rick Astley", "uri": "spotify:artist:0gxyHStUsqpMadRV0Di1Qt" }]
                },
                "previous_tracks": [],
                "next_tracks": []
            }
        }"#;

        let state: PlaybackState = serde_json::from_str(json).unwrap();

        assert!(state.paused);
        assert_eq!(state.position_ms, 1200);
        assert_eq!(state.duration_ms, 215_000);
        assert_eq!(state.track_id(), Some(&TrackId::new("4uLU6hMCjMI75M1A2tKUQC")));
        assert_eq!(state.track_name(), Some("Never Gonna Give You Up"));
        assert_eq!(state.current_track().unwrap().artists[0].name, "Rick Astley");
    }

    #[test]
    fn test_missing_track_window() {
        let state: PlaybackState = serde_json::from_str(r#"{"paused": false}"#).unwrap();
        assert!(state.current_track().is_none());
        assert!(state.track_id().is_none());
    }

    #[test]
    fn test_local_file_has_no_id() {
        let json = r#"{"track_window": {"current_track": {"id": null, "name": "demo.mp3"}}}"#;
        let state: PlaybackState = serde_json::from_str(json).unwrap();
        assert_eq!(state.track_name(), Some("demo.mp3"));
        assert!(state.track_id().is_none());
    }
}
