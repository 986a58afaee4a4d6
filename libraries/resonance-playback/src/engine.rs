//! Playback engine - core orchestration
//!
//! Owns the player state and the single audio output, and coordinates the
//! catalog, persistence store and history recorder around them.

use crate::{
    error::{PlaybackError, Result},
    events::PlaybackEvent,
    history::ListenThreshold,
    output::{AudioOutput, OutputEvent, OutputEventKind, StreamSource},
    queue::PlayQueue,
    state::PlayerSnapshot,
    types::{LoopMode, PlayOptions, PlaybackConfig},
    volume::Volume,
};
use resonance_core::{CatalogResolver, HistoryRecorder, PersistenceStore, Track, TrackId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// How a load affects the queue once the stream has been resolved
enum QueueChange {
    /// Single-track play: queue and cursor stay as they are
    Keep,

    /// Move the cursor within the current queue
    Cursor(usize),

    /// Adopt a freshly built queue (always shuffled)
    Replace(PlayQueue),
}

/// Central playback engine
///
/// All mutation goes through `&mut self`, so operations are applied strictly
/// in call order; see [`PlayerService`](crate::PlayerService) for the loop
/// that serializes user commands and output events onto one engine.
///
/// Queue-changing operations resolve the stream URL *before* touching any
/// state: a resolution failure leaves the player exactly as it was.
pub struct PlaybackEngine {
    config: PlaybackConfig,

    // Collaborators
    catalog: Arc<dyn CatalogResolver>,
    store: Arc<dyn PersistenceStore>,
    recorder: Option<Arc<dyn HistoryRecorder>>,
    output: Box<dyn AudioOutput>,

    // State
    queue: PlayQueue,
    current_track: Option<Arc<Track>>,
    is_playing: bool,
    volume: Volume,
    stream_url: Option<String>,
    position: Duration,
    duration: Option<Duration>,
    shuffle: bool,
    loop_mode: LoopMode,
    listen: ListenThreshold,

    // Bumped on every load; output events from older loads are ignored
    generation: u64,

    // Event queue for UI synchronization
    pending_events: Vec<PlaybackEvent>,
    snapshot_tx: watch::Sender<PlayerSnapshot>,
}

impl PlaybackEngine {
    /// Create a new engine around an output it will exclusively own
    pub fn new(
        config: PlaybackConfig,
        catalog: Arc<dyn CatalogResolver>,
        store: Arc<dyn PersistenceStore>,
        mut output: Box<dyn AudioOutput>,
    ) -> Self {
        let volume = Volume::new(config.volume);
        output.set_volume(volume.effective());

        let listen = ListenThreshold::new(config.history_floor, config.history_fraction);
        let (snapshot_tx, _) = watch::channel(PlayerSnapshot::default());

        let engine = Self {
            config,
            catalog,
            store,
            recorder: None,
            output,
            queue: PlayQueue::new(),
            current_track: None,
            is_playing: false,
            volume,
            stream_url: None,
            position: Duration::ZERO,
            duration: None,
            shuffle: false,
            loop_mode: LoopMode::None,
            listen,
            generation: 0,
            pending_events: Vec::new(),
            snapshot_tx,
        };
        engine.publish();
        engine
    }

    /// Register the sink notified when a track crosses the listen threshold
    pub fn set_history_recorder(&mut self, recorder: Arc<dyn HistoryRecorder>) {
        self.recorder = Some(recorder);
    }

    // ===== Session =====

    /// Restore the last played track from the persistence store
    ///
    /// Loads metadata only: the track becomes current inside a one-track
    /// queue, nothing is bound to the output and playback does not start.
    /// `resume` performs the cold load later.
    pub async fn restore(&mut self) -> Result<()> {
        let id = match self.store.load_last_track_id() {
            Ok(Some(id)) => id,
            Ok(None) => {
                debug!("No previous session to restore");
                return Ok(());
            }
            Err(e) => {
                debug!(error = %e, "Could not read last track id, starting fresh");
                return Ok(());
            }
        };

        let track = match self.catalog.get_track(&id).await {
            Ok(track) => track,
            Err(e) => {
                warn!(track_id = %id, error = %e, "Failed to restore last track");
                let err = PlaybackError::from(e);
                self.emit_error(&err);
                return Err(err);
            }
        };

        let track = Arc::new(Self::with_album_images(self.catalog.as_ref(), track).await);
        info!(track_id = %track.id, name = %track.name, "Restored last played track");

        self.queue = PlayQueue::single(Arc::clone(&track));
        self.current_track = Some(track);
        self.stream_url = None;
        self.position = Duration::ZERO;
        self.duration = None;
        self.listen.reset();
        self.set_playing(false);
        self.emit_queue_changed();
        self.publish();
        Ok(())
    }

    // ===== Playback Control =====

    /// Load a track and, unless `options.autoplay` is false, start it
    ///
    /// With `options.queue`, the queue is adopted and shuffled (shuffle is
    /// always switched on for a new queue) and the cursor lands on `track`'s
    /// position in the shuffled order, or 0 if `track` is not in the queue.
    pub async fn play(&mut self, track: Arc<Track>, options: PlayOptions) -> Result<()> {
        let change = match options.queue {
            Some(tracks) => QueueChange::Replace(PlayQueue::shuffled_from(
                tracks,
                &track.id,
                self.config.shuffle_strategy,
            )),
            None => QueueChange::Keep,
        };

        let result = self.load(track, change, options.autoplay).await;
        self.publish();
        result
    }

    /// Load a whole queue and start at the track found at `start_index`
    ///
    /// The start track is picked in the caller's order and then located by
    /// identity in the shuffled order. Empty input is a no-op.
    pub async fn play_queue(&mut self, tracks: Vec<Arc<Track>>, start_index: usize) -> Result<()> {
        let Some(last) = tracks.len().checked_sub(1) else {
            debug!("play_queue called with an empty queue");
            return Ok(());
        };

        let start_track = Arc::clone(&tracks[start_index.min(last)]);
        let queue =
            PlayQueue::shuffled_from(tracks, &start_track.id, self.config.shuffle_strategy);

        let result = self
            .load(start_track, QueueChange::Replace(queue), true)
            .await;
        self.publish();
        result
    }

    /// Pause playback
    pub fn pause(&mut self) {
        self.output.pause();
        self.set_playing(false);
        self.publish();
    }

    /// Resume playback
    ///
    /// After a restore nothing is bound to the output yet; in that case the
    /// current track is fully loaded (stream resolved) and started.
    pub async fn resume(&mut self) -> Result<()> {
        let Some(track) = self.current_track.clone() else {
            debug!("resume called with no current track");
            return Err(PlaybackError::NoTrackLoaded);
        };

        let result = if self.output.has_source() {
            self.start_output().await
        } else {
            info!(track_id = %track.id, "No source bound, loading current track");
            self.load(track, QueueChange::Keep, true).await
        };
        self.publish();
        result
    }

    /// Stop playback
    ///
    /// Pauses and rewinds to the start. Current track and queue are kept.
    pub fn stop(&mut self) {
        self.output.pause();
        if self.output.has_source() {
            self.output.set_position(Duration::ZERO);
        }
        self.position = Duration::ZERO;
        self.set_playing(false);
        self.publish();
    }

    /// Advance to the next track in the active queue
    ///
    /// Past the end this wraps to 0 under `LoopMode::All` and is a no-op
    /// otherwise. Shuffle has no influence on wrapping.
    pub async fn next(&mut self) -> Result<()> {
        match self.queue.next_index(self.loop_mode) {
            Some(index) => self.load_index(index).await,
            None => {
                debug!(
                    cursor = ?self.queue.cursor(),
                    len = self.queue.len(),
                    "next: nothing to advance to"
                );
                Ok(())
            }
        }
    }

    /// Go back to the previous track in the active queue
    ///
    /// Before the start this wraps to the last track under `LoopMode::All` and
    /// is a no-op otherwise.
    pub async fn prev(&mut self) -> Result<()> {
        match self.queue.prev_index(self.loop_mode) {
            Some(index) => self.load_index(index).await,
            None => {
                debug!(
                    cursor = ?self.queue.cursor(),
                    len = self.queue.len(),
                    "prev: nothing to go back to"
                );
                Ok(())
            }
        }
    }

    /// Jump to an index in the active queue
    pub async fn skip_to(&mut self, index: usize) -> Result<()> {
        if index >= self.queue.len() {
            return Err(PlaybackError::IndexOutOfBounds {
                index,
                len: self.queue.len(),
            });
        }
        self.load_index(index).await
    }

    // ===== Seek =====

    /// Seek to `seconds`, clamped to `[0, duration]`
    ///
    /// With an unknown duration only the lower bound applies.
    pub fn seek(&mut self, seconds: f64) {
        let Some(target) = clamp_seek(seconds, self.duration) else {
            debug!(seconds, "Ignoring seek to an unrepresentable position");
            return;
        };

        self.output.set_position(target);
        self.position = target;
        self.publish();
    }

    // ===== Volume =====

    /// Set volume, clamped to 0.0-1.0
    pub fn set_volume(&mut self, level: f32) {
        self.volume.set_level(level);
        self.apply_volume();
    }

    pub fn mute(&mut self) {
        self.volume.mute();
        self.apply_volume();
    }

    pub fn unmute(&mut self) {
        self.volume.unmute();
        self.apply_volume();
    }

    pub fn toggle_mute(&mut self) {
        self.volume.toggle_mute();
        self.apply_volume();
    }

    fn apply_volume(&mut self) {
        self.output.set_volume(self.volume.effective());
        self.pending_events.push(PlaybackEvent::VolumeChanged {
            level: self.volume.level(),
            is_muted: self.volume.is_muted(),
        });
        self.publish();
    }

    // ===== Shuffle & Loop =====

    /// Flip shuffle
    pub fn toggle_shuffle(&mut self) {
        self.set_shuffle(!self.shuffle);
    }

    /// Enable or disable shuffle
    ///
    /// Enabling reshuffles the *active* queue and moves the cursor to follow
    /// the current track. Disabling freezes the present order; the original
    /// order is not restored.
    pub fn set_shuffle(&mut self, enabled: bool) {
        if self.shuffle == enabled {
            return;
        }
        self.shuffle = enabled;

        if enabled {
            let current = self.current_track.as_ref().map(|t| t.id.clone());
            self.queue
                .reshuffle(self.config.shuffle_strategy, current.as_ref());
        }

        debug!(shuffle = enabled, cursor = ?self.queue.cursor(), "Shuffle changed");
        self.emit_queue_changed();
        self.publish();
    }

    /// Cycle loop mode `None -> All -> One -> None`
    pub fn toggle_loop(&mut self) {
        self.set_loop_mode(self.loop_mode.cycle());
    }

    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.loop_mode = mode;
        self.pending_events
            .push(PlaybackEvent::LoopModeChanged { mode });
        self.publish();
    }

    // ===== Output Events =====

    /// Apply an event reported by the audio output
    ///
    /// Events stamped with an older load generation are dropped.
    pub async fn handle_output_event(&mut self, event: OutputEvent) {
        if event.generation != self.generation {
            debug!(
                event_generation = event.generation,
                generation = self.generation,
                "Dropping stale output event"
            );
            return;
        }

        match event.kind {
            OutputEventKind::TimeUpdate(position) => {
                self.position = position;
                self.check_listen_threshold();
            }
            OutputEventKind::MetadataLoaded(duration) => {
                self.duration = duration;
            }
            OutputEventKind::Playing => self.set_playing(true),
            OutputEventKind::Paused => self.set_playing(false),
            OutputEventKind::Ended => self.on_track_ended().await,
        }
        self.publish();
    }

    /// Natural end of the current track
    ///
    /// Loop one restarts the track. Otherwise the engine only moves on when
    /// shuffle is enabled; with shuffle off it stops and keeps showing what
    /// just played, even under loop all. Manual `next` wraps on loop mode
    /// alone, so the two paths intentionally disagree.
    async fn on_track_ended(&mut self) {
        let Some(track) = self.current_track.clone() else {
            return;
        };

        self.set_playing(false);
        self.pending_events.push(PlaybackEvent::TrackFinished {
            track_id: track.id.clone(),
        });

        let result = if self.loop_mode == LoopMode::One {
            debug!(track_id = %track.id, "Loop one, restarting track");
            self.load(Arc::clone(&track), QueueChange::Keep, true).await
        } else if self.shuffle {
            self.next().await
        } else {
            debug!(track_id = %track.id, "Shuffle off, stopping after track");
            Ok(())
        };

        if let Err(e) = result {
            debug!(track_id = %track.id, error = %e, "Auto-advance had no effect");
        }
    }

    fn check_listen_threshold(&mut self) {
        if !self.listen.observe(self.position, self.duration) {
            return;
        }

        let Some(track_id) = self.current_track.as_ref().map(|t| t.id.clone()) else {
            return;
        };

        info!(track_id = %track_id, position_ms = self.position.as_millis() as u64, "Recording listen");
        if let Some(recorder) = &self.recorder {
            recorder.record(&track_id);
        }
        self.pending_events
            .push(PlaybackEvent::HistoryRecorded { track_id });
    }

    // ===== Loading =====

    async fn load_index(&mut self, index: usize) -> Result<()> {
        let Some(track) = self.queue.get(index).cloned() else {
            return Err(PlaybackError::IndexOutOfBounds {
                index,
                len: self.queue.len(),
            });
        };

        let result = self.load(track, QueueChange::Cursor(index), true).await;
        self.publish();
        result
    }

    /// Resolve, commit, bind and optionally start a track
    async fn load(&mut self, track: Arc<Track>, change: QueueChange, autoplay: bool) -> Result<()> {
        let url = match self.catalog.stream_url(&track.id).await {
            Ok(url) => url,
            Err(e) => {
                warn!(track_id = %track.id, error = %e, "Stream resolution failed, state unchanged");
                let err = PlaybackError::from(e);
                self.emit_error(&err);
                return Err(err);
            }
        };

        match change {
            QueueChange::Keep => {}
            QueueChange::Cursor(index) => self.queue.set_cursor(index),
            QueueChange::Replace(queue) => {
                self.queue = queue;
                self.shuffle = true;
                self.emit_queue_changed();
            }
        }

        self.generation += 1;
        let previous_track_id = self
            .current_track
            .replace(Arc::clone(&track))
            .map(|t| t.id.clone());
        self.stream_url = Some(url.clone());
        self.position = Duration::ZERO;
        self.duration = None;
        self.listen.reset();
        self.persist_last_track(&track.id);

        self.output.load(StreamSource {
            url,
            duration_hint: track.duration(),
            generation: self.generation,
        });

        info!(
            track_id = %track.id,
            name = %track.name,
            cursor = ?self.queue.cursor(),
            generation = self.generation,
            "Loaded track"
        );
        self.pending_events.push(PlaybackEvent::TrackChanged {
            track_id: track.id.clone(),
            previous_track_id,
            generation: self.generation,
        });

        if autoplay {
            self.start_output().await
        } else {
            self.set_playing(false);
            Ok(())
        }
    }

    async fn start_output(&mut self) -> Result<()> {
        match self.output.play().await {
            Ok(()) => {
                self.set_playing(true);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Audio output refused to start");
                self.set_playing(false);
                self.emit_error(&e);
                Err(e)
            }
        }
    }

    async fn with_album_images(catalog: &dyn CatalogResolver, track: Track) -> Track {
        if !track.needs_album_images() {
            return track;
        }

        match catalog.get_album(&track.album_id).await {
            Ok(album) if !album.images.is_empty() => track.with_album_images(album.images),
            Ok(_) => track,
            Err(e) => {
                debug!(album_id = %track.album_id, error = %e, "Album artwork unavailable");
                track
            }
        }
    }

    fn persist_last_track(&self, id: &TrackId) {
        if let Err(e) = self.store.save_last_track_id(id) {
            debug!(track_id = %id, error = %e, "Failed to persist last track id");
        }
    }

    // ===== State Queries =====

    pub fn current_track(&self) -> Option<&Arc<Track>> {
        self.current_track.as_ref()
    }

    /// Active queue
    pub fn queue(&self) -> &[Arc<Track>] {
        self.queue.active()
    }

    /// Queue in the order it was submitted
    pub fn original_queue(&self) -> &[Arc<Track>] {
        self.queue.original()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.queue.cursor()
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn volume(&self) -> f32 {
        self.volume.level()
    }

    pub fn is_muted(&self) -> bool {
        self.volume.is_muted()
    }

    pub fn stream_url(&self) -> Option<&str> {
        self.stream_url.as_deref()
    }

    pub fn position(&self) -> Duration {
        self.position
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffle
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn history_recorded(&self) -> bool {
        self.listen.is_recorded()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current state as a snapshot
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            current_track: self.current_track.clone(),
            queue: self.queue.active().to_vec(),
            original_queue: self.queue.original().to_vec(),
            cursor: self.queue.cursor(),
            is_playing: self.is_playing,
            volume: self.volume.level(),
            is_muted: self.volume.is_muted(),
            stream_url: self.stream_url.clone(),
            current_time: self.position,
            duration: self.duration,
            is_shuffled: self.shuffle,
            loop_mode: self.loop_mode,
            history_recorded: self.listen.is_recorded(),
            generation: self.generation,
        }
    }

    /// Receiver that sees a fresh snapshot after every mutation
    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    // ===== Events =====

    /// Drain all pending events
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }

    fn set_playing(&mut self, playing: bool) {
        if self.is_playing != playing {
            self.is_playing = playing;
            self.pending_events.push(PlaybackEvent::StateChanged {
                is_playing: playing,
            });
        }
    }

    fn emit_queue_changed(&mut self) {
        self.pending_events.push(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
            shuffled: self.shuffle,
        });
    }

    fn emit_error(&mut self, error: &PlaybackError) {
        self.pending_events.push(PlaybackEvent::Error {
            message: error.to_string(),
        });
    }
}

/// Clamp a seek target in seconds; `None` if it cannot be represented
fn clamp_seek(seconds: f64, duration: Option<Duration>) -> Option<Duration> {
    let seconds = if seconds.is_nan() { 0.0 } else { seconds.max(0.0) };
    let seconds = match duration {
        Some(d) => seconds.min(d.as_secs_f64()),
        None => seconds,
    };
    Duration::try_from_secs_f64(seconds).ok()
}
