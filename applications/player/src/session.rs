//! Player session wiring
//!
//! Builds the catalog client, state file store and simulated output around a
//! playback engine, restores the previous session and runs the service loop.

use crate::config::PlayerConfig;
use crate::error::{PlayerError, Result};
use resonance_catalog_client::{CatalogClient, CatalogConfig};
use resonance_core::{Track, TrackId};
use resonance_playback::{
    PlaybackEngine, PlaybackEvent, PlayerHandle, PlayerService, PlayerSnapshot, SimulatedOutput,
};
use resonance_storage::JsonFileStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A running player
pub struct Session {
    player: PlayerHandle,
    catalog: Arc<CatalogClient>,
    events: broadcast::Receiver<PlaybackEvent>,
    task: JoinHandle<PlaybackEngine>,
}

impl Session {
    /// Wire everything up and start the service loop
    ///
    /// The last played track is restored before the loop starts, so
    /// [`Session::player`] already reflects it.
    pub async fn start(config: &PlayerConfig) -> Result<Self> {
        let mut catalog_config = CatalogConfig::new(config.catalog.url.clone());
        if let Some(token) = &config.catalog.access_token {
            catalog_config = catalog_config.with_token(token.clone());
        }
        let catalog = Arc::new(CatalogClient::new(catalog_config)?);
        let store = Arc::new(JsonFileStore::open(&config.storage.state_file)?);

        let (output_tx, output_rx) = mpsc::unbounded_channel();
        let output = SimulatedOutput::new(output_tx)
            .with_tick(Duration::from_millis(config.output.tick_ms))
            .with_speed(config.output.speed);

        let mut engine = PlaybackEngine::new(
            config.playback_config(),
            catalog.clone(),
            store,
            Box::new(output),
        );
        engine.set_history_recorder(Arc::new(|track_id: &TrackId| {
            info!(track_id = %track_id, "Listen recorded");
        }));

        if let Err(e) = engine.restore().await {
            warn!(error = %e, "Could not restore previous session");
        }

        let (service, player) = PlayerService::new(engine, output_rx);
        let events = player.events();
        let task = tokio::spawn(service.run());

        info!(catalog = %catalog.base_url(), "Player session started");

        Ok(Self {
            player,
            catalog,
            events,
            task,
        })
    }

    pub fn player(&self) -> &PlayerHandle {
        &self.player
    }

    /// Resolve track metadata for the given IDs, in order
    pub async fn fetch_tracks(&self, ids: &[TrackId]) -> Result<Vec<Arc<Track>>> {
        let mut tracks = Vec::with_capacity(ids.len());
        for id in ids {
            tracks.push(Arc::new(self.catalog.get_track(id).await?));
        }
        Ok(tracks)
    }

    /// Wait until playback comes to rest
    ///
    /// Returns once a track finishes and nothing follows it, or with an error
    /// if a failure leaves the player stopped.
    pub async fn wait_until_finished(&mut self) -> Result<()> {
        loop {
            match self.events.recv().await {
                Ok(PlaybackEvent::TrackChanged { .. }) => {
                    if let Some(track) = self.player.snapshot().current_track {
                        info!(
                            track_id = %track.id,
                            name = %track.name,
                            artist = track.primary_artist().unwrap_or("Unknown artist"),
                            "Now playing"
                        );
                    }
                }
                Ok(PlaybackEvent::TrackFinished { track_id }) => {
                    debug!(track_id = %track_id, "Track finished");
                    if !self.player.snapshot().is_playing {
                        return Ok(());
                    }
                }
                Ok(PlaybackEvent::Error { message }) => {
                    warn!(error = %message, "Playback error");
                    if !self.player.snapshot().is_playing {
                        return Err(PlayerError::PlaybackFailed(message));
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Event receiver lagged");
                }
                Err(RecvError::Closed) => return Ok(()),
            }
        }
    }

    /// Stop the service loop and return the final state
    pub async fn shutdown(self) -> Result<PlayerSnapshot> {
        // An already stopped loop is fine here
        let _ = self.player.shutdown().await;

        let engine = self
            .task
            .await
            .map_err(|e| PlayerError::PlaybackFailed(format!("player task failed: {e}")))?;
        Ok(engine.snapshot())
    }
}
