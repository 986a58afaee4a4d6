//! Resonance - Playback Engine
//!
//! Client-side playback for Resonance: one audio output, a play queue, and the
//! transport, shuffle and loop controls around it.
//!
//! This crate provides:
//! - Queue with original and active (shuffled) order and a cursor
//! - Shuffle algorithms (Random + Smart)
//! - Loop modes (None, All, One) and auto-advance at end of track
//! - Volume and mute
//! - Listen-history threshold
//! - Persistence of the last played track and session restore
//! - A serialized command loop ([`PlayerService`]) for multi-caller use
//!
//! # Architecture
//!
//! The engine never talks to the network or disk directly. Track and stream
//! resolution, persistence and history are reached through the traits in
//! `resonance-core`; sound comes out of an [`AudioOutput`].
//!
//! Every load bumps a generation counter that is handed to the output with the
//! stream. Output events carry it back, and events from a replaced stream are
//! ignored.
//!
//! # Example
//!
//! ```rust,no_run
//! use resonance_core::{AlbumId, Track, TrackId};
//! use resonance_playback::{PlaybackConfig, PlaybackEngine, PlayerService, SimulatedOutput};
//! use std::sync::Arc;
//! # use resonance_core::{Album, CatalogResolver, PersistenceStore, Result};
//! # struct Catalog;
//! # #[async_trait::async_trait]
//! # impl CatalogResolver for Catalog {
//! #     async fn get_track(&self, id: &TrackId) -> Result<Track> { unimplemented!() }
//! #     async fn get_album(&self, id: &AlbumId) -> Result<Album> { unimplemented!() }
//! #     async fn stream_url(&self, id: &TrackId) -> Result<String> { unimplemented!() }
//! # }
//! # struct Store;
//! # impl PersistenceStore for Store {
//! #     fn save_last_track_id(&self, _: &TrackId) -> Result<()> { Ok(()) }
//! #     fn load_last_track_id(&self) -> Result<Option<TrackId>> { Ok(None) }
//! # }
//!
//! # async fn run() -> resonance_playback::Result<()> {
//! let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
//! let output = SimulatedOutput::new(events_tx);
//!
//! let engine = PlaybackEngine::new(
//!     PlaybackConfig::default(),
//!     Arc::new(Catalog),
//!     Arc::new(Store),
//!     Box::new(output),
//! );
//! let (service, player) = PlayerService::new(engine, events_rx);
//! tokio::spawn(service.run());
//!
//! let tracks = vec![
//!     Arc::new(Track::new(TrackId::new("t1"), "Intro", AlbumId::new("a1"))),
//!     Arc::new(Track::new(TrackId::new("t2"), "Outro", AlbumId::new("a1"))),
//! ];
//! player.play_queue(tracks, 0).await?;
//! player.next().await?;
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
pub mod events;
mod history;
pub mod output;
mod queue;
mod service;
pub mod shuffle;
mod simulated;
mod state;
pub mod types;
mod volume;

// Public exports
pub use engine::PlaybackEngine;
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use history::ListenThreshold;
pub use output::{AudioOutput, OutputEvent, OutputEventKind, StreamSource};
pub use queue::PlayQueue;
pub use service::{PlayerCommand, PlayerHandle, PlayerService};
pub use simulated::SimulatedOutput;
pub use state::PlayerSnapshot;
pub use types::{LoopMode, PlayOptions, PlaybackConfig, ShuffleStrategy};
pub use volume::Volume;
