/// Player application errors
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlayerError>;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(#[from] resonance_catalog_client::CatalogClientError),

    #[error("Storage error: {0}")]
    Storage(#[from] resonance_storage::StorageError),

    #[error("Playback error: {0}")]
    Playback(#[from] resonance_playback::PlaybackError),

    #[error("Playback failed: {0}")]
    PlaybackFailed(String),
}
