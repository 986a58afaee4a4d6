//! Playback Events
//!
//! Discrete notifications for UI synchronization. Continuous state (position,
//! queue contents) is published through the snapshot channel instead; events
//! mark the moments a UI may want to react to:
//! - Play/pause transitions
//! - Track loads (carrying the load generation)
//! - Queue, loop, shuffle and volume changes
//! - Natural end of a track
//! - Listen-history notifications
//! - Recoverable errors

use crate::types::LoopMode;
use resonance_core::TrackId;
use serde::{Deserialize, Serialize};

/// Events emitted by the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// Playing flag changed
    StateChanged {
        /// Whether audio is now playing
        is_playing: bool,
    },

    /// A track was loaded into the output
    TrackChanged {
        /// ID of the new (current) track
        track_id: TrackId,
        /// ID of the previous track (if any)
        previous_track_id: Option<TrackId>,
        /// Load generation; later loads carry larger values
        generation: u64,
    },

    /// Active queue replaced or reordered
    QueueChanged {
        /// Active queue length
        length: usize,
        /// Whether shuffle is enabled
        shuffled: bool,
    },

    /// Loop mode changed
    LoopModeChanged {
        /// The new loop mode
        mode: LoopMode,
    },

    /// Volume changed
    VolumeChanged {
        /// New volume level (0.0-1.0)
        level: f32,
        /// Whether audio is muted
        is_muted: bool,
    },

    /// Track reached its natural end
    TrackFinished {
        /// ID of the finished track
        track_id: TrackId,
    },

    /// Track crossed the listen threshold and was handed to the history recorder
    HistoryRecorded {
        /// ID of the recorded track
        track_id: TrackId,
    },

    /// Recoverable error (resolution or output start failure)
    Error {
        /// Error message
        message: String,
    },
}
