//! HTTP catalog client.

use crate::error::{CatalogClientError, Result};
use crate::types::{CatalogConfig, StreamUrlResponse};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use resonance_core::{Album, AlbumId, CatalogResolver, ResonanceError, Track, TrackId};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Client for a Resonance catalog server.
///
/// Stateless apart from the connection pool; cheap to share behind an `Arc`.
pub struct CatalogClient {
    http: Client,
    base_url: Url,
    access_token: Option<String>,
}

impl CatalogClient {
    /// Create a new client with the given configuration.
    pub fn new(config: CatalogConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(CatalogClientError::InvalidUrl("URL cannot be empty".into()));
        }

        let mut base_url = Url::parse(config.url.trim())
            .map_err(|e| CatalogClientError::InvalidUrl(format!("{}: {}", config.url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(CatalogClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        // Relative stream URLs resolve under the base path, not beside it
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Resonance/{} (Player)", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            access_token: config.access_token.filter(|t| !t.is_empty()),
        })
    }

    /// Base URL all endpoints are built from.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether requests carry a bearer token.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Get a single track by ID.
    pub async fn get_track(&self, track_id: &TrackId) -> Result<Track> {
        let url = self.endpoint(&["api", "tracks", track_id.as_str()])?;
        debug!(url = %url, track_id = %track_id, "Fetching track");
        self.get_json(url, "Track", track_id.as_str()).await
    }

    /// Get a single album by ID.
    pub async fn get_album(&self, album_id: &AlbumId) -> Result<Album> {
        let url = self.endpoint(&["api", "albums", album_id.as_str()])?;
        debug!(url = %url, album_id = %album_id, "Fetching album");
        self.get_json(url, "Album", album_id.as_str()).await
    }

    /// Get a streaming URL for a track.
    ///
    /// The returned URL is always absolute. It may be time-limited and should
    /// be used promptly.
    pub async fn get_stream_url(&self, track_id: &TrackId) -> Result<StreamUrlResponse> {
        let url = self.endpoint(&["api", "tracks", track_id.as_str(), "stream"])?;
        debug!(url = %url, track_id = %track_id, "Getting stream URL");

        let mut stream: StreamUrlResponse = self.get_json(url, "Track", track_id.as_str()).await?;
        if stream.url.trim().is_empty() {
            return Err(CatalogClientError::ParseError(
                "stream response has an empty url".into(),
            ));
        }

        stream.url = self
            .base_url
            .join(&stream.url)
            .map_err(|e| CatalogClientError::ParseError(format!("Invalid stream URL: {}", e)))?
            .into();
        Ok(stream)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CatalogClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        entity: &'static str,
        id: &str,
    ) -> Result<T> {
        let mut request = self.http.get(url);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                CatalogClientError::ServerUnreachable(e.to_string())
            } else {
                CatalogClientError::Request(e)
            }
        })?;

        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| {
                CatalogClientError::ParseError(format!(
                    "Failed to parse {} response: {}",
                    entity.to_lowercase(),
                    e
                ))
            })
        } else if status == StatusCode::UNAUTHORIZED {
            Err(CatalogClientError::AuthRequired)
        } else if status == StatusCode::NOT_FOUND {
            Err(CatalogClientError::NotFound {
                entity,
                id: id.to_owned(),
            })
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(CatalogClientError::ServerError {
                status: status.as_u16(),
                message: error_text,
            })
        }
    }
}

#[async_trait]
impl CatalogResolver for CatalogClient {
    async fn get_track(&self, id: &TrackId) -> resonance_core::Result<Track> {
        Ok(CatalogClient::get_track(self, id).await?)
    }

    async fn get_album(&self, id: &AlbumId) -> resonance_core::Result<Album> {
        Ok(CatalogClient::get_album(self, id).await?)
    }

    async fn stream_url(&self, track_id: &TrackId) -> resonance_core::Result<String> {
        match self.get_stream_url(track_id).await {
            Ok(stream) => Ok(stream.url),
            Err(e) => {
                warn!(track_id = %track_id, error = %e, "Stream URL request failed");
                Err(ResonanceError::stream_unavailable(
                    track_id.as_str(),
                    e.to_string(),
                ))
            }
        }
    }
}
