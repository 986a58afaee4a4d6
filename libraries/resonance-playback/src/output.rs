//! Audio output abstraction
//!
//! The engine exclusively owns one `AudioOutput`. Outputs report back through
//! an unbounded channel of [`OutputEvent`]s; every event is stamped with the
//! generation of the source it belongs to so the engine can drop events from
//! a source it has already replaced.

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// A stream handed to the output
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSource {
    /// Playable URL from the catalog
    pub url: String,

    /// Catalog duration, for outputs that cannot probe the stream themselves
    pub duration_hint: Option<Duration>,

    /// Load generation assigned by the engine
    pub generation: u64,
}

/// What happened in the output
#[derive(Debug, Clone, PartialEq)]
pub enum OutputEventKind {
    /// Play position advanced
    TimeUpdate(Duration),

    /// Stream metadata is available; `None` when the duration is unknown
    MetadataLoaded(Option<Duration>),

    /// Playback started
    Playing,

    /// Playback paused
    Paused,

    /// Stream reached its natural end
    Ended,
}

/// Event emitted by an output for a given source
#[derive(Debug, Clone, PartialEq)]
pub struct OutputEvent {
    pub generation: u64,
    pub kind: OutputEventKind,
}

impl OutputEvent {
    pub fn new(generation: u64, kind: OutputEventKind) -> Self {
        Self { generation, kind }
    }
}

/// Audio output resource
///
/// Implementations wrap whatever actually produces sound. Only `play` is
/// asynchronous because starting playback may need platform permission and
/// may be refused.
#[async_trait]
pub trait AudioOutput: Send {
    /// Bind a new source, replacing (and stopping) any previous one
    fn load(&mut self, source: StreamSource);

    /// Whether a source is currently bound
    fn has_source(&self) -> bool;

    /// Start or resume the bound source
    ///
    /// # Errors
    /// Returns an error if no source is bound or the platform rejects playback
    async fn play(&mut self) -> Result<()>;

    /// Pause the bound source
    fn pause(&mut self);

    /// Move the play position
    fn set_position(&mut self, position: Duration);

    /// Set output volume (0.0-1.0)
    fn set_volume(&mut self, volume: f32);
}
