//! Resonance Core
//!
//! Domain types, errors and collaborator traits shared by the Resonance
//! crates.
//!
//! The playback engine never talks to the network, the disk or the rest of
//! the application directly. Everything it needs from the outside world is
//! described here as a trait:
//! - **`CatalogResolver`**: track/album metadata and stream URLs
//! - **`PersistenceStore`**: remembers the last played track across sessions
//! - **`HistoryRecorder`**: notified when a track has been played long enough
//!
//! # Example
//!
//! ```rust
//! use resonance_core::types::{AlbumId, Track, TrackId};
//! use std::time::Duration;
//!
//! let track = Track::new(TrackId::new("t1"), "Intro", AlbumId::new("a1"))
//!     .with_artists(["Artist"])
//!     .with_duration(Duration::from_secs(215));
//!
//! assert_eq!(track.primary_artist(), Some("Artist"));
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{ResonanceError, Result};
pub use traits::{CatalogResolver, HistoryRecorder, PersistenceStore};
pub use types::{Album, AlbumId, ImageRef, Track, TrackId};
