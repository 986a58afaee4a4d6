//! Headless audio output driven by a virtual clock
//!
//! Produces the same event sequence as a real output (metadata on load,
//! periodic time updates, play/pause, ended) without producing sound. Used by
//! the CLI player and by tests.

use crate::error::{PlaybackError, Result};
use crate::output::{AudioOutput, OutputEvent, OutputEventKind, StreamSource};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct Clock {
    source: Option<StreamSource>,
    position: Duration,
}

/// Virtual-clock output
pub struct SimulatedOutput {
    events: UnboundedSender<OutputEvent>,
    clock: Arc<Mutex<Clock>>,
    ticker: Option<JoinHandle<()>>,
    tick: Duration,
    speed: f32,
    volume: f32,
    reject_play: Arc<AtomicBool>,
}

impl SimulatedOutput {
    /// Create an output reporting to `events`, with 250ms ticks at real-time speed
    pub fn new(events: UnboundedSender<OutputEvent>) -> Self {
        Self {
            events,
            clock: Arc::new(Mutex::new(Clock::default())),
            ticker: None,
            tick: Duration::from_millis(250),
            speed: 1.0,
            volume: 1.0,
            reject_play: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Builder: set the wall-clock interval between time updates
    #[must_use]
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick.max(Duration::from_millis(1));
        self
    }

    /// Builder: advance the virtual clock `speed` times faster than real time
    #[must_use]
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = if speed.is_finite() && speed > 0.0 { speed } else { 1.0 };
        self
    }

    /// Handle that makes subsequent `play` calls fail, like a blocked autoplay
    pub fn play_rejection(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.reject_play)
    }

    /// Current volume as last set by the engine
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Current virtual play position
    pub fn position(&self) -> Duration {
        self.lock_clock().position
    }

    /// Whether the clock is currently running
    pub fn is_running(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, Clock> {
        // A poisoned clock only means a ticker panicked mid-update
        self.clock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn stop_ticker(&mut self) -> bool {
        match self.ticker.take() {
            Some(handle) => {
                let was_running = !handle.is_finished();
                handle.abort();
                was_running
            }
            None => false,
        }
    }

    fn emit(&self, generation: u64, kind: OutputEventKind) {
        // Receiver gone means the engine shut down
        let _ = self.events.send(OutputEvent::new(generation, kind));
    }

    fn spawn_ticker(&self, generation: u64) -> JoinHandle<()> {
        let clock = Arc::clone(&self.clock);
        let events = self.events.clone();
        let tick = self.tick;
        let step = tick.mul_f32(self.speed);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            // First tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;

                let (position, ended) = {
                    let mut clock = clock.lock().unwrap_or_else(|e| e.into_inner());
                    let duration = clock.source.as_ref().and_then(|s| s.duration_hint);
                    clock.position += step;
                    match duration {
                        Some(d) if clock.position >= d => {
                            clock.position = d;
                            (d, true)
                        }
                        _ => (clock.position, false),
                    }
                };

                let _ = events.send(OutputEvent::new(
                    generation,
                    OutputEventKind::TimeUpdate(position),
                ));

                if ended {
                    let _ = events.send(OutputEvent::new(generation, OutputEventKind::Paused));
                    let _ = events.send(OutputEvent::new(generation, OutputEventKind::Ended));
                    break;
                }
            }
        })
    }
}

#[async_trait]
impl AudioOutput for SimulatedOutput {
    fn load(&mut self, source: StreamSource) {
        self.stop_ticker();

        let generation = source.generation;
        let duration = source.duration_hint;
        debug!(url = %source.url, generation, "Simulated output loading source");

        {
            let mut clock = self.lock_clock();
            clock.source = Some(source);
            clock.position = Duration::ZERO;
        }

        self.emit(generation, OutputEventKind::MetadataLoaded(duration));
    }

    fn has_source(&self) -> bool {
        self.lock_clock().source.is_some()
    }

    async fn play(&mut self) -> Result<()> {
        let generation = {
            let mut clock = self.lock_clock();
            let Some(source) = clock.source.as_ref() else {
                return Err(PlaybackError::NoTrackLoaded);
            };
            let generation = source.generation;

            // Playing an ended stream starts it over
            if source.duration_hint.is_some_and(|d| clock.position >= d) {
                clock.position = Duration::ZERO;
            }
            generation
        };

        if self.reject_play.load(Ordering::SeqCst) {
            warn!(generation, "Simulated output rejecting play");
            return Err(PlaybackError::output("playback blocked by platform policy"));
        }

        if !self.is_running() {
            self.ticker = Some(self.spawn_ticker(generation));
        }
        self.emit(generation, OutputEventKind::Playing);
        Ok(())
    }

    fn pause(&mut self) {
        if self.stop_ticker() {
            let generation = self.lock_clock().source.as_ref().map(|s| s.generation);
            if let Some(generation) = generation {
                self.emit(generation, OutputEventKind::Paused);
            }
        }
    }

    fn set_position(&mut self, position: Duration) {
        let generation = {
            let mut clock = self.lock_clock();
            let Some(generation) = clock.source.as_ref().map(|s| s.generation) else {
                return;
            };
            clock.position = position;
            generation
        };
        self.emit(generation, OutputEventKind::TimeUpdate(position));
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }
}

impl Drop for SimulatedOutput {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}
