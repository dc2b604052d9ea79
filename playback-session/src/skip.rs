//! Per-track skip scheduling.
//!
//! [`TrackSkipScheduler`] decides, for each playback state the session sees,
//! which timer operations to perform. It performs none itself: the session
//! task applies the returned [`SkipAction`]s, which keeps the decision logic
//! free of timers and easy to test.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::catalog::TrackTimeoutCatalog;
use crate::model::{PlaybackState, TrackId};

/// A timer operation requested by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipAction {
    /// Seek the engine to this position (ms)
    Seek(u64),
    /// Arm the skip timer to request the next track after this long
    Arm(Duration),
    /// Cancel the armed skip timer
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipSlot {
    /// Nothing decided for the recorded track
    Empty,
    /// The recorded track has no override, or its timer already fired
    Settled,
    Armed { deadline: Instant },
    /// Paused with this much of the forced duration left
    Suspended { remaining: Duration },
}

/// Tracks which track is playing and whether its skip timer is armed
#[derive(Debug, Clone)]
pub struct TrackSkipScheduler {
    catalog: TrackTimeoutCatalog,
    current_track: Option<TrackId>,
    slot: SkipSlot,
}

impl TrackSkipScheduler {
    pub fn new(catalog: TrackTimeoutCatalog) -> Self {
        Self {
            catalog,
            current_track: None,
            slot: SkipSlot::Empty,
        }
    }

    pub fn catalog(&self) -> &TrackTimeoutCatalog {
        &self.catalog
    }

    /// Last unpaused track seen. Pausing keeps it.
    pub fn current_track(&self) -> Option<&TrackId> {
        self.current_track.as_ref()
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.slot, SkipSlot::Armed { .. })
    }

    /// Decide the timer operations for `state`, observed at `now`.
    ///
    /// Repeated observations of the same unpaused track return nothing.
    /// Pausing cancels an armed timer and remembers what was left of it;
    /// resuming the same track re-arms that remainder without seeking again.
    pub fn observe(&mut self, state: &PlaybackState, now: Instant) -> Vec<SkipAction> {
        if state.paused {
            return match self.slot {
                SkipSlot::Armed { deadline } => {
                    let remaining = deadline.saturating_duration_since(now);
                    debug!(?remaining, "Playback paused, suspending track skip");
                    self.slot = SkipSlot::Suspended { remaining };
                    vec![SkipAction::Cancel]
                }
                _ => Vec::new(),
            };
        }

        let Some(track) = state.current_track() else {
            return Vec::new();
        };
        let Some(track_id) = track.id.as_ref() else {
            return Vec::new();
        };

        if self.current_track.as_ref() == Some(track_id) {
            match self.slot {
                SkipSlot::Armed { .. } | SkipSlot::Settled => return Vec::new(),
                SkipSlot::Suspended { remaining } => {
                    debug!(?remaining, "Playback resumed, re-arming track skip");
                    self.slot = SkipSlot::Armed {
                        deadline: now + remaining,
                    };
                    return vec![SkipAction::Arm(remaining)];
                }
                SkipSlot::Empty => {}
            }
        }

        let mut actions = Vec::new();
        if self.is_armed() {
            actions.push(SkipAction::Cancel);
        }

        match self.catalog.get(&track.name) {
            Some(entry) => {
                if entry.start_offset_ms > 0 {
                    actions.push(SkipAction::Seek(entry.start_offset_ms));
                }
                let duration = entry.forced_duration();
                debug!(track = %track.name, ?duration, "Arming track skip");
                actions.push(SkipAction::Arm(duration));
                self.slot = SkipSlot::Armed {
                    deadline: now + duration,
                };
            }
            None => self.slot = SkipSlot::Settled,
        }

        self.current_track = Some(track_id.clone());
        actions
    }

    /// The armed timer fired. The track stays settled until it changes.
    pub fn fired(&mut self) {
        if self.is_armed() {
            self.slot = SkipSlot::Settled;
        }
    }
}
