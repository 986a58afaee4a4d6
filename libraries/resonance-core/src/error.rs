/// Core error types for Resonance
use thiserror::Error;

/// Result type alias using `ResonanceError`
pub type Result<T> = std::result::Result<T, ResonanceError>;

/// Core error type for Resonance
#[derive(Error, Debug)]
pub enum ResonanceError {
    /// Entity not found in the catalog
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// No playable stream could be resolved for a track
    #[error("Stream unavailable for track {track_id}: {reason}")]
    StreamUnavailable { track_id: String, reason: String },

    /// Persistence store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Network error talking to the catalog
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl ResonanceError {
    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a stream unavailable error
    pub fn stream_unavailable(track_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StreamUnavailable {
            track_id: track_id.into(),
            reason: reason.into(),
        }
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this is a catalog miss rather than a transport failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
