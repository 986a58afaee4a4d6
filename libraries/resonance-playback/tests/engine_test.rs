//! Integration tests for the playback engine
//!
//! Drive the engine through its public operations with an in-memory catalog
//! and a recording output, and check the observable state after each step.

use async_trait::async_trait;
use resonance_core::{
    Album, AlbumId, CatalogResolver, ImageRef, PersistenceStore, ResonanceError, Track, TrackId,
};
use resonance_playback::{
    AudioOutput, LoopMode, OutputEvent, OutputEventKind, PlayOptions, PlaybackConfig,
    PlaybackEngine, PlaybackError, PlaybackEvent, StreamSource,
};
use resonance_storage::MemoryStore;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ===== Test Helpers =====

#[derive(Default)]
struct MockCatalog {
    tracks: HashMap<TrackId, Track>,
    albums: HashMap<AlbumId, Album>,
    broken_streams: Mutex<HashSet<TrackId>>,
}

impl MockCatalog {
    fn with_tracks(tracks: &[Arc<Track>]) -> Self {
        Self {
            tracks: tracks
                .iter()
                .map(|t| (t.id.clone(), Track::clone(t)))
                .collect(),
            ..Self::default()
        }
    }

    fn with_album(mut self, album: Album) -> Self {
        self.albums.insert(album.id.clone(), album);
        self
    }

    fn break_stream(&self, id: &str) {
        self.broken_streams.lock().unwrap().insert(TrackId::new(id));
    }
}

#[async_trait]
impl CatalogResolver for MockCatalog {
    async fn get_track(&self, id: &TrackId) -> resonance_core::Result<Track> {
        self.tracks
            .get(id)
            .cloned()
            .ok_or_else(|| ResonanceError::not_found("Track", id.as_str()))
    }

    async fn get_album(&self, id: &AlbumId) -> resonance_core::Result<Album> {
        self.albums
            .get(id)
            .cloned()
            .ok_or_else(|| ResonanceError::not_found("Album", id.as_str()))
    }

    async fn stream_url(&self, track_id: &TrackId) -> resonance_core::Result<String> {
        if self.broken_streams.lock().unwrap().contains(track_id) {
            return Err(ResonanceError::stream_unavailable(
                track_id.as_str(),
                "transcoder offline",
            ));
        }
        Ok(stream_url_for(track_id.as_str()))
    }
}

fn stream_url_for(id: &str) -> String {
    format!("https://cdn.test/{id}.mp3")
}

#[derive(Debug, Default)]
struct OutputLog {
    loaded: Vec<StreamSource>,
    plays: usize,
    pauses: usize,
    positions: Vec<Duration>,
    volume: Option<f32>,
}

/// Output that records every call and can refuse to play
struct MockOutput {
    log: Arc<Mutex<OutputLog>>,
    reject_play: Arc<AtomicBool>,
}

#[async_trait]
impl AudioOutput for MockOutput {
    fn load(&mut self, source: StreamSource) {
        self.log.lock().unwrap().loaded.push(source);
    }

    fn has_source(&self) -> bool {
        !self.log.lock().unwrap().loaded.is_empty()
    }

    async fn play(&mut self) -> resonance_playback::Result<()> {
        if self.reject_play.load(Ordering::SeqCst) {
            return Err(PlaybackError::output("autoplay blocked"));
        }
        self.log.lock().unwrap().plays += 1;
        Ok(())
    }

    fn pause(&mut self) {
        self.log.lock().unwrap().pauses += 1;
    }

    fn set_position(&mut self, position: Duration) {
        self.log.lock().unwrap().positions.push(position);
    }

    fn set_volume(&mut self, volume: f32) {
        self.log.lock().unwrap().volume = Some(volume);
    }
}

struct Harness {
    engine: PlaybackEngine,
    catalog: Arc<MockCatalog>,
    store: Arc<MemoryStore>,
    output: Arc<Mutex<OutputLog>>,
    reject_play: Arc<AtomicBool>,
}

impl Harness {
    fn new(catalog: MockCatalog) -> Self {
        Self::with_store(catalog, MemoryStore::new())
    }

    fn with_store(catalog: MockCatalog, store: MemoryStore) -> Self {
        let catalog = Arc::new(catalog);
        let store = Arc::new(store);
        let output = Arc::new(Mutex::new(OutputLog::default()));
        let reject_play = Arc::new(AtomicBool::new(false));

        let engine = PlaybackEngine::new(
            PlaybackConfig::default(),
            catalog.clone(),
            store.clone(),
            Box::new(MockOutput {
                log: output.clone(),
                reject_play: reject_play.clone(),
            }),
        );

        Self {
            engine,
            catalog,
            store,
            output,
            reject_play,
        }
    }

    fn loads(&self) -> usize {
        self.output.lock().unwrap().loaded.len()
    }

    fn last_loaded_url(&self) -> Option<String> {
        self.output
            .lock()
            .unwrap()
            .loaded
            .last()
            .map(|s| s.url.clone())
    }

    fn current_id(&self) -> Option<String> {
        self.engine
            .current_track()
            .map(|t| t.id.as_str().to_owned())
    }

    async fn output_event(&mut self, kind: OutputEventKind) {
        let generation = self.engine.generation();
        self.engine
            .handle_output_event(OutputEvent::new(generation, kind))
            .await;
    }
}

fn track(id: &str) -> Arc<Track> {
    Arc::new(
        Track::new(TrackId::new(id), format!("Track {id}"), AlbumId::new("a1"))
            .with_artists([format!("Artist {id}")])
            .with_duration(Duration::from_secs(180)),
    )
}

fn tracks(ids: &[&str]) -> Vec<Arc<Track>> {
    ids.iter().map(|id| track(id)).collect()
}

fn sorted_ids(tracks: &[Arc<Track>]) -> Vec<String> {
    let mut ids: Vec<_> = tracks.iter().map(|t| t.id.as_str().to_owned()).collect();
    ids.sort();
    ids
}

fn assert_cursor_on_current(engine: &PlaybackEngine) {
    let cursor = engine.cursor().expect("cursor set after queue playback");
    assert!(cursor < engine.queue().len());
    assert_eq!(
        engine.queue()[cursor].id,
        engine.current_track().expect("current track").id
    );
}

// ===== Queue Playback =====

#[tokio::test]
async fn test_play_queue_active_is_permutation_of_input() {
    let input = tracks(&["a", "b", "c", "d", "e"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));

    h.engine.play_queue(input.clone(), 0).await.unwrap();

    assert_eq!(sorted_ids(h.engine.queue()), sorted_ids(&input));
    assert_eq!(h.engine.original_queue().len(), 5);
    assert!(h.engine.is_shuffled());
    assert!(h.engine.is_playing());
}

#[tokio::test]
async fn test_play_queue_starts_requested_track_and_tracks_cursor() {
    let input = tracks(&["a", "b", "c"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));

    h.engine.play_queue(input, 1).await.unwrap();

    assert_eq!(h.current_id().as_deref(), Some("b"));
    assert_cursor_on_current(&h.engine);
    assert_eq!(h.last_loaded_url(), Some(stream_url_for("b")));
    assert_eq!(h.engine.stream_url(), Some(stream_url_for("b").as_str()));
}

#[tokio::test]
async fn test_play_queue_clamps_start_index() {
    let input = tracks(&["a", "b", "c"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));

    h.engine.play_queue(input, 99).await.unwrap();

    assert_eq!(h.current_id().as_deref(), Some("c"));
    assert_cursor_on_current(&h.engine);
}

#[tokio::test]
async fn test_play_queue_empty_is_noop() {
    let mut h = Harness::new(MockCatalog::default());

    h.engine.play_queue(Vec::new(), 0).await.unwrap();

    assert!(h.engine.current_track().is_none());
    assert_eq!(h.loads(), 0);
}

#[tokio::test]
async fn test_play_with_queue_missing_track_puts_cursor_at_zero() {
    let input = tracks(&["a", "b"]);
    let outsider = track("z");
    let mut catalog = MockCatalog::with_tracks(&input);
    catalog.tracks.insert(outsider.id.clone(), Track::clone(&outsider));
    let mut h = Harness::new(catalog);

    h.engine
        .play(outsider, PlayOptions::with_queue(input))
        .await
        .unwrap();

    assert_eq!(h.current_id().as_deref(), Some("z"));
    assert_eq!(h.engine.cursor(), Some(0));
}

#[tokio::test]
async fn test_single_track_play_keeps_queue() {
    let input = tracks(&["a", "b", "c"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));
    h.engine.play_queue(input, 0).await.unwrap();
    let queue_before = sorted_ids(h.engine.queue());
    let cursor_before = h.engine.cursor();

    h.engine
        .play(track("b"), PlayOptions::default())
        .await
        .unwrap();

    assert_eq!(h.current_id().as_deref(), Some("b"));
    assert_eq!(sorted_ids(h.engine.queue()), queue_before);
    assert_eq!(h.engine.cursor(), cursor_before);
}

#[tokio::test]
async fn test_play_without_autoplay_only_loads() {
    let input = tracks(&["a"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));

    h.engine
        .play(track("a"), PlayOptions::default().autoplay(false))
        .await
        .unwrap();

    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert!(!h.engine.is_playing());
    assert_eq!(h.output.lock().unwrap().plays, 0);
    assert_eq!(h.loads(), 1);
}

// ===== Navigation =====

#[tokio::test]
async fn test_loop_all_next_wraps_to_start() {
    let input = tracks(&["a", "b", "c"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));
    h.engine.play_queue(input, 0).await.unwrap();
    h.engine.skip_to(2).await.unwrap();
    h.engine.set_loop_mode(LoopMode::All);

    h.engine.next().await.unwrap();

    assert_eq!(h.engine.cursor(), Some(0));
    let first = h.engine.queue()[0].id.as_str().to_owned();
    assert_eq!(h.current_id(), Some(first.clone()));
    assert_eq!(h.last_loaded_url(), Some(stream_url_for(&first)));
}

#[tokio::test]
async fn test_next_at_end_without_loop_is_noop() {
    let input = tracks(&["a", "b", "c"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));
    h.engine.play_queue(input, 0).await.unwrap();
    h.engine.skip_to(2).await.unwrap();
    let current = h.current_id();
    let loads = h.loads();

    h.engine.next().await.unwrap();

    assert_eq!(h.engine.cursor(), Some(2));
    assert_eq!(h.current_id(), current);
    assert_eq!(h.loads(), loads);
}

#[tokio::test]
async fn test_wrap_ignores_shuffle_flag() {
    let input = tracks(&["a", "b"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));
    h.engine.play_queue(input, 0).await.unwrap();
    h.engine.set_shuffle(false);
    h.engine.skip_to(1).await.unwrap();

    h.engine.set_loop_mode(LoopMode::All);
    h.engine.next().await.unwrap();

    assert_eq!(h.engine.cursor(), Some(0));
}

#[tokio::test]
async fn test_prev_at_start() {
    let input = tracks(&["a", "b", "c"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));
    h.engine.play_queue(input, 0).await.unwrap();
    h.engine.skip_to(0).await.unwrap();

    h.engine.prev().await.unwrap();
    assert_eq!(h.engine.cursor(), Some(0));

    h.engine.set_loop_mode(LoopMode::All);
    h.engine.prev().await.unwrap();
    assert_eq!(h.engine.cursor(), Some(2));
    assert_cursor_on_current(&h.engine);
}

#[tokio::test]
async fn test_next_and_prev_on_empty_queue_are_noops() {
    let mut h = Harness::new(MockCatalog::default());
    h.engine.set_loop_mode(LoopMode::All);

    h.engine.next().await.unwrap();
    h.engine.prev().await.unwrap();

    assert!(h.engine.current_track().is_none());
    assert_eq!(h.loads(), 0);
}

#[tokio::test]
async fn test_loop_all_visits_every_track_once_per_cycle() {
    let input = tracks(&["a", "b", "c"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));
    h.engine.play_queue(input, 1).await.unwrap();
    h.engine.set_loop_mode(LoopMode::All);
    assert_eq!(h.current_id().as_deref(), Some("b"));

    let mut visited = Vec::new();
    for _ in 0..3 {
        h.engine.next().await.unwrap();
        visited.push(h.current_id().unwrap());
    }

    visited.sort();
    assert_eq!(visited, vec!["a", "b", "c"]);
    assert_eq!(h.current_id().as_deref(), Some("b"));
}

#[tokio::test]
async fn test_skip_to_out_of_range() {
    let input = tracks(&["a", "b"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));
    h.engine.play_queue(input, 0).await.unwrap();
    let current = h.current_id();

    let result = h.engine.skip_to(5).await;

    assert!(matches!(
        result,
        Err(PlaybackError::IndexOutOfBounds { index: 5, len: 2 })
    ));
    assert_eq!(h.current_id(), current);
}

// ===== Failure Handling =====

#[tokio::test]
async fn test_stream_failure_leaves_state_untouched() {
    let first = tracks(&["a", "b"]);
    let second = tracks(&["x", "y"]);
    let mut all = first.clone();
    all.extend(second.iter().cloned());
    let mut h = Harness::new(MockCatalog::with_tracks(&all));

    h.engine.play_queue(first.clone(), 0).await.unwrap();
    let before = h.engine.snapshot();
    h.engine.drain_events();

    h.catalog.break_stream("x");
    let result = h.engine.play_queue(second, 0).await;

    assert!(matches!(result, Err(PlaybackError::Resolve(_))));
    let after = h.engine.snapshot();
    assert_eq!(after.current_track, before.current_track);
    assert_eq!(sorted_ids(&after.queue), sorted_ids(&first));
    assert_eq!(after.cursor, before.cursor);
    assert_eq!(after.generation, before.generation);
    assert_eq!(
        h.store.load_last_track_id().unwrap(),
        Some(TrackId::new("a"))
    );

    let events = h.engine.drain_events();
    assert!(matches!(events.as_slice(), [PlaybackEvent::Error { .. }]));
}

#[tokio::test]
async fn test_rejected_play_keeps_track_loaded_but_paused() {
    let input = tracks(&["a"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));
    h.reject_play.store(true, Ordering::SeqCst);

    let result = h.engine.play_queue(input, 0).await;

    assert!(matches!(result, Err(PlaybackError::Output(_))));
    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert!(!h.engine.is_playing());
    assert!(h
        .engine
        .drain_events()
        .iter()
        .any(|e| matches!(e, PlaybackEvent::Error { .. })));
}

// ===== Shuffle & Loop =====

#[tokio::test]
async fn test_toggle_shuffle_never_changes_current_track() {
    let input = tracks(&["a", "b", "c", "d", "e", "f"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));
    h.engine.play_queue(input, 3).await.unwrap();
    let loads = h.loads();

    for _ in 0..6 {
        h.engine.toggle_shuffle();
        assert_eq!(h.current_id().as_deref(), Some("d"));
        assert_cursor_on_current(&h.engine);
    }
    assert_eq!(h.loads(), loads);
}

#[tokio::test]
async fn test_disabling_shuffle_keeps_active_order() {
    let input = tracks(&["a", "b", "c", "d"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));
    h.engine.play_queue(input, 0).await.unwrap();
    let order: Vec<_> = h.engine.queue().iter().map(|t| t.id.clone()).collect();

    h.engine.toggle_shuffle();

    assert!(!h.engine.is_shuffled());
    let after: Vec<_> = h.engine.queue().iter().map(|t| t.id.clone()).collect();
    assert_eq!(after, order);
}

#[tokio::test]
async fn test_toggle_loop_cycles() {
    let mut h = Harness::new(MockCatalog::default());
    assert_eq!(h.engine.loop_mode(), LoopMode::None);

    h.engine.toggle_loop();
    assert_eq!(h.engine.loop_mode(), LoopMode::All);
    h.engine.toggle_loop();
    assert_eq!(h.engine.loop_mode(), LoopMode::One);
    h.engine.toggle_loop();
    assert_eq!(h.engine.loop_mode(), LoopMode::None);
}

// ===== Natural End =====

#[tokio::test]
async fn test_end_with_shuffle_off_stops() {
    let input = tracks(&["a", "b", "c"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));
    h.engine.play_queue(input, 0).await.unwrap();
    h.engine.toggle_shuffle();
    let before = h.engine.snapshot();
    let loads = h.loads();

    h.output_event(OutputEventKind::Ended).await;

    assert!(!h.engine.is_playing());
    assert_eq!(h.engine.current_track(), before.current_track.as_ref());
    assert_eq!(h.engine.cursor(), before.cursor);
    assert_eq!(h.engine.queue().len(), before.queue.len());
    assert_eq!(h.loads(), loads);
}

#[tokio::test]
async fn test_end_with_shuffle_off_stops_even_under_loop_all() {
    let input = tracks(&["a", "b"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));
    h.engine.play_queue(input, 0).await.unwrap();
    h.engine.set_shuffle(false);
    h.engine.set_loop_mode(LoopMode::All);
    let loads = h.loads();

    h.output_event(OutputEventKind::Ended).await;

    assert!(!h.engine.is_playing());
    assert_eq!(h.loads(), loads);
}

#[tokio::test]
async fn test_end_with_shuffle_on_advances() {
    let input = tracks(&["a", "b", "c"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));
    h.engine.play_queue(input, 0).await.unwrap();
    h.engine.skip_to(0).await.unwrap();

    h.output_event(OutputEventKind::Ended).await;

    assert_eq!(h.engine.cursor(), Some(1));
    assert!(h.engine.is_playing());
    assert_cursor_on_current(&h.engine);

    let events = h.engine.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, PlaybackEvent::TrackFinished { .. })));
}

#[tokio::test]
async fn test_end_with_loop_one_restarts_same_track() {
    let input = tracks(&["a", "b", "c"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));
    h.engine.play_queue(input, 2).await.unwrap();
    h.engine.set_loop_mode(LoopMode::One);
    let cursor = h.engine.cursor();
    let generation = h.engine.generation();

    h.output_event(OutputEventKind::Ended).await;

    assert_eq!(h.current_id().as_deref(), Some("c"));
    assert_eq!(h.engine.cursor(), cursor);
    assert_eq!(h.engine.generation(), generation + 1);
    assert!(h.engine.is_playing());
    assert_eq!(h.last_loaded_url(), Some(stream_url_for("c")));
}

#[tokio::test]
async fn test_failed_loop_one_restart_stays_stopped() {
    let input = tracks(&["a", "b"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));
    h.engine.play_queue(input, 0).await.unwrap();
    h.engine.set_loop_mode(LoopMode::One);
    h.catalog.break_stream("a");
    let generation = h.engine.generation();
    h.engine.drain_events();

    h.output_event(OutputEventKind::Ended).await;

    assert!(!h.engine.is_playing());
    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert_eq!(h.engine.generation(), generation);
    let events = h.engine.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, PlaybackEvent::TrackFinished { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, PlaybackEvent::Error { .. })));
}

#[tokio::test]
async fn test_stale_output_events_are_ignored() {
    let input = tracks(&["a", "b"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));
    h.engine.play_queue(input, 0).await.unwrap();
    let stale = h.engine.generation();
    let cursor = h.engine.cursor().unwrap();
    h.engine.skip_to(cursor).await.unwrap();
    let current = h.current_id();

    h.engine
        .handle_output_event(OutputEvent::new(stale, OutputEventKind::Ended))
        .await;
    h.engine
        .handle_output_event(OutputEvent::new(
            stale,
            OutputEventKind::TimeUpdate(Duration::from_secs(90)),
        ))
        .await;

    assert_eq!(h.current_id(), current);
    assert!(h.engine.is_playing());
    assert_eq!(h.engine.position(), Duration::ZERO);
}

// ===== Transport =====

#[tokio::test]
async fn test_pause_resume_stop() {
    let input = tracks(&["a"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));
    h.engine.play_queue(input, 0).await.unwrap();
    h.output_event(OutputEventKind::TimeUpdate(Duration::from_secs(12)))
        .await;

    h.engine.pause();
    assert!(!h.engine.is_playing());

    h.engine.resume().await.unwrap();
    assert!(h.engine.is_playing());
    assert_eq!(h.loads(), 1);

    h.engine.stop();
    assert!(!h.engine.is_playing());
    assert_eq!(h.engine.position(), Duration::ZERO);
    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert_eq!(
        h.output.lock().unwrap().positions.last(),
        Some(&Duration::ZERO)
    );
}

#[tokio::test]
async fn test_resume_without_track_is_noop() {
    let mut h = Harness::new(MockCatalog::default());

    let result = h.engine.resume().await;

    assert!(matches!(result, Err(PlaybackError::NoTrackLoaded)));
    assert!(!h.engine.is_playing());
}

#[tokio::test]
async fn test_seek_clamps_to_duration() {
    let input = tracks(&["a"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));
    h.engine.play_queue(input, 0).await.unwrap();

    // Unknown duration: only the lower bound applies
    h.engine.seek(500.0);
    assert_eq!(h.engine.position(), Duration::from_secs(500));

    h.output_event(OutputEventKind::MetadataLoaded(Some(Duration::from_secs(180))))
        .await;
    h.engine.seek(500.0);
    assert_eq!(h.engine.position(), Duration::from_secs(180));

    h.engine.seek(-3.0);
    assert_eq!(h.engine.position(), Duration::ZERO);
    assert_eq!(
        h.output.lock().unwrap().positions.last(),
        Some(&Duration::ZERO)
    );
}

// ===== Volume =====

#[tokio::test]
async fn test_set_volume_clamps() {
    let mut h = Harness::new(MockCatalog::default());

    h.engine.set_volume(-1.0);
    assert_eq!(h.engine.volume(), 0.0);

    h.engine.set_volume(5.0);
    assert_eq!(h.engine.volume(), 1.0);

    h.engine.set_volume(0.4);
    assert_eq!(h.engine.volume(), 0.4);
    assert_eq!(h.output.lock().unwrap().volume, Some(0.4));
}

#[tokio::test]
async fn test_mute_sends_zero_but_keeps_level() {
    let mut h = Harness::new(MockCatalog::default());
    h.engine.set_volume(0.7);

    h.engine.mute();
    assert!(h.engine.is_muted());
    assert_eq!(h.engine.volume(), 0.7);
    assert_eq!(h.output.lock().unwrap().volume, Some(0.0));

    h.engine.toggle_mute();
    assert!(!h.engine.is_muted());
    assert_eq!(h.output.lock().unwrap().volume, Some(0.7));
}

// ===== History =====

#[tokio::test]
async fn test_history_recorded_once_per_load() {
    let input = tracks(&["a", "b"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));
    let recorded = Arc::new(Mutex::new(Vec::new()));
    let sink = recorded.clone();
    h.engine.set_history_recorder(Arc::new(move |id: &TrackId| {
        sink.lock().unwrap().push(id.clone());
    }));

    h.engine.play_queue(input, 0).await.unwrap();
    let first = h.engine.current_track().unwrap().id.clone();
    h.output_event(OutputEventKind::MetadataLoaded(Some(Duration::from_secs(180))))
        .await;

    h.output_event(OutputEventKind::TimeUpdate(Duration::from_secs(10)))
        .await;
    assert!(recorded.lock().unwrap().is_empty());

    h.output_event(OutputEventKind::TimeUpdate(Duration::from_secs(30)))
        .await;
    h.output_event(OutputEventKind::TimeUpdate(Duration::from_secs(45)))
        .await;
    assert_eq!(*recorded.lock().unwrap(), vec![first]);
    assert!(h.engine.history_recorded());

    // A fresh load re-arms the threshold
    let cursor = h.engine.cursor().unwrap();
    h.engine.skip_to(cursor).await.unwrap();
    assert!(!h.engine.history_recorded());
}

fn history_recorded(events: &[PlaybackEvent]) -> bool {
    events
        .iter()
        .any(|e| matches!(e, PlaybackEvent::HistoryRecorded { .. }))
}

#[tokio::test]
async fn test_half_duration_does_not_undercut_floor() {
    let track = Arc::new(
        Track::new(TrackId::new("m"), "Medium", AlbumId::new("a1"))
            .with_duration(Duration::from_secs(40)),
    );
    let mut h = Harness::new(MockCatalog::with_tracks(&[track.clone()]));
    h.engine.play(track, PlayOptions::default()).await.unwrap();
    h.output_event(OutputEventKind::MetadataLoaded(Some(Duration::from_secs(40))))
        .await;

    h.output_event(OutputEventKind::TimeUpdate(Duration::from_secs(20)))
        .await;
    h.output_event(OutputEventKind::TimeUpdate(Duration::from_secs(30)))
        .await;
    assert!(!history_recorded(&h.engine.drain_events()));

    h.output_event(OutputEventKind::TimeUpdate(Duration::from_secs(31)))
        .await;
    assert!(history_recorded(&h.engine.drain_events()));
}

#[tokio::test]
async fn test_track_shorter_than_floor_is_not_recorded() {
    let short = Arc::new(
        Track::new(TrackId::new("s"), "Short", AlbumId::new("a1"))
            .with_duration(Duration::from_secs(20)),
    );
    let mut h = Harness::new(MockCatalog::with_tracks(&[short.clone()]));
    h.engine.play(short, PlayOptions::default()).await.unwrap();
    h.output_event(OutputEventKind::MetadataLoaded(Some(Duration::from_secs(20))))
        .await;

    for secs in [5, 10, 15, 20] {
        h.output_event(OutputEventKind::TimeUpdate(Duration::from_secs(secs)))
            .await;
    }

    assert!(!history_recorded(&h.engine.drain_events()));
    assert!(!h.engine.history_recorded());
}

// ===== Persistence & Restore =====

#[tokio::test]
async fn test_loaded_track_is_persisted() {
    let input = tracks(&["a", "b"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));

    h.engine.play_queue(input, 1).await.unwrap();

    assert_eq!(
        h.store.load_last_track_id().unwrap(),
        Some(TrackId::new("b"))
    );
}

#[tokio::test]
async fn test_restore_sets_singleton_queue_without_playing() {
    let input = tracks(&["a"]);
    let store = MemoryStore::new();
    store.save_last_track_id(&TrackId::new("a")).unwrap();
    let mut h = Harness::with_store(MockCatalog::with_tracks(&input), store);

    h.engine.restore().await.unwrap();

    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert_eq!(h.engine.queue().len(), 1);
    assert_eq!(h.engine.original_queue().len(), 1);
    assert_eq!(h.engine.cursor(), Some(0));
    assert!(!h.engine.is_playing());
    assert!(h.engine.stream_url().is_none());
    assert_eq!(h.loads(), 0);
}

#[tokio::test]
async fn test_restore_attaches_album_images() {
    let input = tracks(&["a"]);
    let catalog = MockCatalog::with_tracks(&input).with_album(Album {
        id: AlbumId::new("a1"),
        name: "First Light".into(),
        images: vec![ImageRef {
            url: "https://img.test/a1.jpg".into(),
            width: Some(300),
            height: Some(300),
        }],
    });
    let store = MemoryStore::new();
    store.save_last_track_id(&TrackId::new("a")).unwrap();
    let mut h = Harness::with_store(catalog, store);

    h.engine.restore().await.unwrap();

    let images = h
        .engine
        .current_track()
        .and_then(|t| t.album_images.clone())
        .unwrap();
    assert_eq!(images[0].url, "https://img.test/a1.jpg");
}

#[tokio::test]
async fn test_restore_without_album_keeps_track() {
    let input = tracks(&["a"]);
    let store = MemoryStore::new();
    store.save_last_track_id(&TrackId::new("a")).unwrap();
    let mut h = Harness::with_store(MockCatalog::with_tracks(&input), store);

    h.engine.restore().await.unwrap();

    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert!(h.engine.current_track().unwrap().album_images.is_none());
}

#[tokio::test]
async fn test_restore_with_unknown_track_keeps_default_state() {
    let store = MemoryStore::new();
    store.save_last_track_id(&TrackId::new("gone")).unwrap();
    let mut h = Harness::with_store(MockCatalog::default(), store);

    let result = h.engine.restore().await;

    assert!(result.is_err());
    assert!(h.engine.current_track().is_none());
    assert!(h.engine.queue().is_empty());
    assert_eq!(h.engine.cursor(), None);
}

#[tokio::test]
async fn test_restore_with_nothing_stored() {
    let mut h = Harness::new(MockCatalog::default());

    h.engine.restore().await.unwrap();

    assert!(h.engine.current_track().is_none());
}

#[tokio::test]
async fn test_resume_after_restore_cold_loads() {
    let input = tracks(&["a"]);
    let store = MemoryStore::new();
    store.save_last_track_id(&TrackId::new("a")).unwrap();
    let mut h = Harness::with_store(MockCatalog::with_tracks(&input), store);
    h.engine.restore().await.unwrap();

    h.engine.resume().await.unwrap();

    assert!(h.engine.is_playing());
    assert_eq!(h.loads(), 1);
    assert_eq!(h.last_loaded_url(), Some(stream_url_for("a")));
    assert_eq!(h.engine.cursor(), Some(0));
}

/// Store whose every read and write fails
struct FailingStore;

impl PersistenceStore for FailingStore {
    fn save_last_track_id(&self, _id: &TrackId) -> resonance_core::Result<()> {
        Err(ResonanceError::storage("disk full"))
    }

    fn load_last_track_id(&self) -> resonance_core::Result<Option<TrackId>> {
        Err(ResonanceError::storage("state file unreadable"))
    }
}

fn engine_with_failing_store(catalog: MockCatalog) -> PlaybackEngine {
    PlaybackEngine::new(
        PlaybackConfig::default(),
        Arc::new(catalog),
        Arc::new(FailingStore),
        Box::new(MockOutput {
            log: Arc::new(Mutex::new(OutputLog::default())),
            reject_play: Arc::new(AtomicBool::new(false)),
        }),
    )
}

#[tokio::test]
async fn test_failed_persist_does_not_block_playback() {
    let input = tracks(&["a", "b"]);
    let mut engine = engine_with_failing_store(MockCatalog::with_tracks(&input));

    engine.play_queue(input, 0).await.unwrap();

    assert!(engine.is_playing());
    assert_eq!(
        engine.current_track().map(|t| t.id.clone()),
        Some(TrackId::new("a"))
    );
    assert!(!engine
        .drain_events()
        .iter()
        .any(|e| matches!(e, PlaybackEvent::Error { .. })));
}

#[tokio::test]
async fn test_unreadable_store_means_no_prior_session() {
    let mut engine = engine_with_failing_store(MockCatalog::with_tracks(&tracks(&["a"])));

    engine.restore().await.unwrap();

    assert!(engine.current_track().is_none());
    assert!(engine.queue().is_empty());
    assert!(!engine.is_playing());
}

// ===== Observability =====

#[tokio::test]
async fn test_subscribers_see_every_mutation() {
    let input = tracks(&["a", "b"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));
    let mut rx = h.engine.subscribe();

    h.engine.play_queue(input, 0).await.unwrap();
    assert!(rx.has_changed().unwrap());
    {
        let snapshot = rx.borrow_and_update();
        assert!(snapshot.is_playing);
        assert_eq!(snapshot.queue.len(), 2);
        assert_eq!(
            snapshot.cursor_track().map(|t| &t.id),
            snapshot.current_track.as_ref().map(|t| &t.id)
        );
    }

    h.engine.set_volume(0.2);
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().volume, 0.2);
}

#[tokio::test]
async fn test_track_changed_events_carry_increasing_generations() {
    let input = tracks(&["a", "b", "c"]);
    let mut h = Harness::new(MockCatalog::with_tracks(&input));

    h.engine.play_queue(input, 0).await.unwrap();
    h.engine.skip_to(1).await.unwrap();
    h.engine.skip_to(2).await.unwrap();

    let generations: Vec<u64> = h
        .engine
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            PlaybackEvent::TrackChanged { generation, .. } => Some(generation),
            _ => None,
        })
        .collect();
    assert_eq!(generations, vec![1, 2, 3]);
    assert!(!h.engine.has_pending_events());
}
