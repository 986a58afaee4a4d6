//! Player service - serialized command loop
//!
//! Runs a [`PlaybackEngine`] on its own task. User commands and output events
//! are applied one at a time, so no two engine operations ever interleave.

use crate::{
    engine::PlaybackEngine,
    error::{PlaybackError, Result},
    events::PlaybackEvent,
    output::OutputEvent,
    state::PlayerSnapshot,
    types::{LoopMode, PlayOptions},
};
use resonance_core::Track;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info};

const COMMAND_BUFFER: usize = 64;
const EVENT_BUFFER: usize = 256;

/// Commands accepted by the player service
#[derive(Debug)]
pub enum PlayerCommand {
    Play {
        track: Arc<Track>,
        options: PlayOptions,
    },
    PlayQueue {
        tracks: Vec<Arc<Track>>,
        start_index: usize,
    },
    Pause,
    Resume,
    Stop,
    Next,
    Prev,
    /// Seek to a position in seconds
    Seek(f64),
    SetVolume(f32),
    Mute,
    Unmute,
    ToggleMute,
    ToggleShuffle,
    SetShuffle(bool),
    ToggleLoop,
    SetLoopMode(LoopMode),
    SkipTo(usize),
    Restore,
    Shutdown,
}

/// Cloneable handle for talking to a running [`PlayerService`]
#[derive(Clone)]
pub struct PlayerHandle {
    commands: mpsc::Sender<PlayerCommand>,
    snapshot: watch::Receiver<PlayerSnapshot>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl PlayerHandle {
    /// Queue a command for the service
    pub async fn send(&self, command: PlayerCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| PlaybackError::ServiceStopped)
    }

    pub async fn play(&self, track: Arc<Track>, options: PlayOptions) -> Result<()> {
        self.send(PlayerCommand::Play { track, options }).await
    }

    pub async fn play_queue(&self, tracks: Vec<Arc<Track>>, start_index: usize) -> Result<()> {
        self.send(PlayerCommand::PlayQueue {
            tracks,
            start_index,
        })
        .await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(PlayerCommand::Pause).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.send(PlayerCommand::Resume).await
    }

    pub async fn next(&self) -> Result<()> {
        self.send(PlayerCommand::Next).await
    }

    pub async fn prev(&self) -> Result<()> {
        self.send(PlayerCommand::Prev).await
    }

    pub async fn seek(&self, seconds: f64) -> Result<()> {
        self.send(PlayerCommand::Seek(seconds)).await
    }

    pub async fn set_volume(&self, level: f32) -> Result<()> {
        self.send(PlayerCommand::SetVolume(level)).await
    }

    pub async fn restore(&self) -> Result<()> {
        self.send(PlayerCommand::Restore).await
    }

    /// Ask the service to stop; the call returns once the command is queued
    pub async fn shutdown(&self) -> Result<()> {
        self.send(PlayerCommand::Shutdown).await
    }

    /// Latest published state
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver for state changes
    pub fn watch(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshot.clone()
    }

    /// Receiver for discrete playback events
    ///
    /// Only events emitted after subscribing are delivered.
    pub fn events(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }
}

/// Owns the engine and drives it from commands and output events
pub struct PlayerService {
    engine: PlaybackEngine,
    commands: mpsc::Receiver<PlayerCommand>,
    output_events: mpsc::UnboundedReceiver<OutputEvent>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl PlayerService {
    /// Wrap an engine together with the receiving end of its output's events
    pub fn new(
        engine: PlaybackEngine,
        output_events: mpsc::UnboundedReceiver<OutputEvent>,
    ) -> (Self, PlayerHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);

        let handle = PlayerHandle {
            commands: command_tx,
            snapshot: engine.subscribe(),
            events: events_tx.clone(),
        };

        let service = Self {
            engine,
            commands: command_rx,
            output_events,
            events: events_tx,
        };

        (service, handle)
    }

    /// Run until `Shutdown` is received or every handle is dropped
    ///
    /// Pauses the output on the way out and hands the engine back.
    pub async fn run(mut self) -> PlaybackEngine {
        info!("Player service started");

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(PlayerCommand::Shutdown) | None => break,
                    Some(command) => self.apply(command).await,
                },
                Some(event) = self.output_events.recv() => {
                    self.engine.handle_output_event(event).await;
                }
            }
            self.forward_events();
        }

        self.engine.pause();
        self.forward_events();
        info!("Player service stopped");
        self.engine
    }

    async fn apply(&mut self, command: PlayerCommand) {
        debug!(?command, "Applying player command");

        let engine = &mut self.engine;
        let result = match command {
            PlayerCommand::Play { track, options } => engine.play(track, options).await,
            PlayerCommand::PlayQueue {
                tracks,
                start_index,
            } => engine.play_queue(tracks, start_index).await,
            PlayerCommand::Pause => {
                engine.pause();
                Ok(())
            }
            PlayerCommand::Resume => engine.resume().await,
            PlayerCommand::Stop => {
                engine.stop();
                Ok(())
            }
            PlayerCommand::Next => engine.next().await,
            PlayerCommand::Prev => engine.prev().await,
            PlayerCommand::Seek(seconds) => {
                engine.seek(seconds);
                Ok(())
            }
            PlayerCommand::SetVolume(level) => {
                engine.set_volume(level);
                Ok(())
            }
            PlayerCommand::Mute => {
                engine.mute();
                Ok(())
            }
            PlayerCommand::Unmute => {
                engine.unmute();
                Ok(())
            }
            PlayerCommand::ToggleMute => {
                engine.toggle_mute();
                Ok(())
            }
            PlayerCommand::ToggleShuffle => {
                engine.toggle_shuffle();
                Ok(())
            }
            PlayerCommand::SetShuffle(enabled) => {
                engine.set_shuffle(enabled);
                Ok(())
            }
            PlayerCommand::ToggleLoop => {
                engine.toggle_loop();
                Ok(())
            }
            PlayerCommand::SetLoopMode(mode) => {
                engine.set_loop_mode(mode);
                Ok(())
            }
            PlayerCommand::SkipTo(index) => engine.skip_to(index).await,
            PlayerCommand::Restore => engine.restore().await,
            PlayerCommand::Shutdown => Ok(()),
        };

        if let Err(e) = result {
            debug!(error = %e, "Player command had no effect");
        }
    }

    fn forward_events(&mut self) {
        for event in self.engine.drain_events() {
            // No subscribers is fine
            let _ = self.events.send(event);
        }
    }
}
