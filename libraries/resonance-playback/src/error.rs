//! Error types for playback management

use resonance_core::ResonanceError;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No track is currently loaded
    #[error("No track loaded")]
    NoTrackLoaded,

    /// Index out of bounds
    #[error("Index out of bounds: {index} (queue length {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Track or stream resolution failed
    #[error("Resolution failed: {0}")]
    Resolve(#[from] ResonanceError),

    /// Audio output refused to start or is unusable
    #[error("Audio output error: {0}")]
    Output(String),

    /// Player service is no longer running
    #[error("Player service stopped")]
    ServiceStopped,
}

impl PlaybackError {
    /// Create an output error
    pub fn output(msg: impl Into<String>) -> Self {
        Self::Output(msg.into())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
