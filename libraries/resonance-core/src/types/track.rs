/// Track domain type
use super::{AlbumId, ImageRef, TrackId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A catalog track
///
/// Immutable once fetched. The playback engine shares tracks behind `Arc`
/// rather than copying them around its queues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Catalog identifier
    pub id: TrackId,

    /// Display name
    pub name: String,

    /// Credited artists, primary artist first
    #[serde(default)]
    pub artists: Vec<String>,

    /// Album the track belongs to
    pub album_id: AlbumId,

    /// Album artwork, when the catalog attached it to the track
    #[serde(default)]
    pub album_images: Option<Vec<ImageRef>>,

    /// Track duration in milliseconds
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl Track {
    /// Create a track with minimal metadata
    pub fn new(id: TrackId, name: impl Into<String>, album_id: AlbumId) -> Self {
        Self {
            id,
            name: name.into(),
            artists: Vec::new(),
            album_id,
            album_images: None,
            duration_ms: None,
        }
    }

    /// Builder: set the artist list
    #[must_use]
    pub fn with_artists<I, S>(mut self, artists: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.artists = artists.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: set the duration
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = Some(duration.as_millis() as u64);
        self
    }

    /// Builder: attach album images
    #[must_use]
    pub fn with_album_images(mut self, images: Vec<ImageRef>) -> Self {
        self.album_images = Some(images);
        self
    }

    /// Get the track duration as a Duration
    pub fn duration(&self) -> Option<Duration> {
        self.duration_ms.map(Duration::from_millis)
    }

    /// First credited artist, used for display and smart shuffle grouping
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(String::as_str)
    }

    /// Whether album artwork still needs to be fetched separately
    pub fn needs_album_images(&self) -> bool {
        self.album_images.as_ref().map_or(true, Vec::is_empty)
    }
}
