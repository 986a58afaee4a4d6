//! Resonance Catalog Client
//!
//! HTTP client for the Resonance catalog API. Implements
//! [`resonance_core::CatalogResolver`] so the playback engine can resolve
//! tracks, albums and stream URLs over the network.
//!
//! # Endpoints
//!
//! - `GET {base}/api/tracks/{id}`: track metadata
//! - `GET {base}/api/albums/{id}`: album metadata (artwork)
//! - `GET {base}/api/tracks/{id}/stream`: `{ "url": "...", "expires_in": 300 }`
//!
//! Stream URLs may be relative; they are resolved against the base URL.
//!
//! # Example
//!
//! ```ignore
//! use resonance_catalog_client::{CatalogClient, CatalogConfig};
//! use resonance_core::TrackId;
//!
//! let client = CatalogClient::new(CatalogConfig::new("https://music.example.com").with_token("secret"))?;
//!
//! let track = client.get_track(&TrackId::new("t1")).await?;
//! let stream = client.get_stream_url(&track.id).await?;
//! println!("{} -> {}", track.name, stream.url);
//! ```

mod client;
mod error;
mod types;

pub use client::CatalogClient;
pub use error::{CatalogClientError, Result};
pub use types::{CatalogConfig, StreamUrlResponse};
