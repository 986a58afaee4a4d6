//! Core types for playback management

use resonance_core::Track;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Loop mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    /// Stop at either end of the queue
    #[default]
    None,

    /// Wrap from the queue's end to its start (and back for `prev`)
    All,

    /// Repeat the current track when it ends
    One,
}

impl LoopMode {
    /// Next mode in the fixed cycle `None -> All -> One -> None`
    #[must_use]
    pub fn cycle(self) -> Self {
        match self {
            Self::None => Self::All,
            Self::All => Self::One,
            Self::One => Self::None,
        }
    }

    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::All => "all",
            Self::One => "one",
        }
    }

    /// Parse from string
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "all" => Some(Self::All),
            "one" => Some(Self::One),
            _ => None,
        }
    }
}

impl std::fmt::Display for LoopMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shuffle algorithm used whenever the active queue is reordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShuffleStrategy {
    /// Uniform Fisher-Yates shuffle
    #[default]
    Random,

    /// Spread artists out (avoid the same artist back-to-back)
    Smart,
}

/// Configuration for the playback engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Initial volume (0.0-1.0, default: 1.0)
    pub volume: f32,

    /// Shuffle algorithm (default: Random)
    pub shuffle_strategy: ShuffleStrategy,

    /// Absolute play time after which a track counts as listened (default: 30s)
    pub history_floor: Duration,

    /// Fraction of the track after which it counts as listened (default: 0.5)
    pub history_fraction: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 1.0,
            shuffle_strategy: ShuffleStrategy::Random,
            history_floor: Duration::from_secs(30),
            history_fraction: 0.5,
        }
    }
}

/// Options for [`PlaybackEngine::play`](crate::PlaybackEngine::play)
#[derive(Debug, Clone)]
pub struct PlayOptions {
    /// Adopt this sequence as the new queue
    pub queue: Option<Vec<Arc<Track>>>,

    /// Start playback once the stream is bound (default: true)
    pub autoplay: bool,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            queue: None,
            autoplay: true,
        }
    }
}

impl PlayOptions {
    /// Play within the given queue
    #[must_use]
    pub fn with_queue(queue: Vec<Arc<Track>>) -> Self {
        Self {
            queue: Some(queue),
            ..Self::default()
        }
    }

    /// Builder: set autoplay
    #[must_use]
    pub fn autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }
}
