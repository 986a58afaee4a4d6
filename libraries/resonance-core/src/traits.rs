/// Collaborator traits consumed by the playback engine
use crate::error::Result;
use crate::types::{Album, AlbumId, Track, TrackId};
use async_trait::async_trait;

/// Catalog and stream resolver
///
/// Supplies track metadata and playable stream URLs. The engine treats it as
/// opaque: it never caches, retries or validates what comes back.
#[async_trait]
pub trait CatalogResolver: Send + Sync {
    /// Fetch track metadata
    ///
    /// # Errors
    /// Returns `ResonanceError::NotFound` if the catalog has no such track
    async fn get_track(&self, id: &TrackId) -> Result<Track>;

    /// Fetch album metadata (used for artwork)
    ///
    /// # Errors
    /// Returns `ResonanceError::NotFound` if the catalog has no such album
    async fn get_album(&self, id: &AlbumId) -> Result<Album>;

    /// Resolve a streamable URL for a track
    ///
    /// # Errors
    /// Returns `ResonanceError::StreamUnavailable` if no stream can be served
    async fn stream_url(&self, track_id: &TrackId) -> Result<String>;
}

/// Durable key/value store for session continuity
///
/// Callers treat every failure as "nothing stored"; implementations should
/// still report errors so they can be logged.
pub trait PersistenceStore: Send + Sync {
    /// Remember the most recently loaded track
    fn save_last_track_id(&self, id: &TrackId) -> Result<()>;

    /// Read back the most recently loaded track, if any
    fn load_last_track_id(&self) -> Result<Option<TrackId>>;
}

/// Sink notified once a loaded track has been played long enough
///
/// Notifications are fire-and-forget: the engine never awaits or retries.
/// Any `Fn(&TrackId)` closure can be registered directly.
pub trait HistoryRecorder: Send + Sync {
    /// Record a qualifying play of `track_id`
    fn record(&self, track_id: &TrackId);
}

impl<F> HistoryRecorder for F
where
    F: Fn(&TrackId) + Send + Sync,
{
    fn record(&self, track_id: &TrackId) {
        self(track_id);
    }
}
