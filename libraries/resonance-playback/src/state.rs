//! Read-only view of the player state

use crate::types::LoopMode;
use resonance_core::Track;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Snapshot of the player state
///
/// Published on every mutation through the engine's watch channel. Tracks
/// are shared with the engine, so taking a snapshot never copies metadata.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlayerSnapshot {
    pub current_track: Option<Arc<Track>>,
    pub queue: Vec<Arc<Track>>,
    pub original_queue: Vec<Arc<Track>>,
    pub cursor: Option<usize>,
    pub is_playing: bool,
    pub volume: f32,
    pub is_muted: bool,
    pub stream_url: Option<String>,
    pub current_time: Duration,
    pub duration: Option<Duration>,
    pub is_shuffled: bool,
    pub loop_mode: LoopMode,
    pub history_recorded: bool,
    pub generation: u64,
}

impl PlayerSnapshot {
    /// Track under the cursor, if the cursor is set
    pub fn cursor_track(&self) -> Option<&Arc<Track>> {
        self.cursor.and_then(|index| self.queue.get(index))
    }

    /// Playback progress in 0.0-1.0, when the duration is known
    pub fn progress(&self) -> Option<f32> {
        self.duration
            .filter(|d| !d.is_zero())
            .map(|d| (self.current_time.as_secs_f32() / d.as_secs_f32()).clamp(0.0, 1.0))
    }
}
