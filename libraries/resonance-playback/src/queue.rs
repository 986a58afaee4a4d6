//! Play queue with original and active orderings
//!
//! ```text
//! original: A B C D      (as submitted by the caller)
//! active:   C A D B      (what transport controls walk through)
//! cursor:       ^        (index into active)
//! ```
//!
//! The active queue is always a permutation of the original queue as it was
//! when set. Shuffling replaces the active queue wholesale; nothing ever
//! inserts into or removes from it.

use crate::shuffle::{shuffle_tracks, shuffled};
use crate::types::{LoopMode, ShuffleStrategy};
use resonance_core::{Track, TrackId};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct PlayQueue {
    /// Order as submitted by the caller
    original: Vec<Arc<Track>>,

    /// Order actually traversed
    active: Vec<Arc<Track>>,

    /// Index into `active`, `None` until a queue position is chosen
    cursor: Option<usize>,
}

impl PlayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a queue whose active order is a shuffled copy of `tracks`
    ///
    /// The cursor is placed on the first occurrence of `start` in the
    /// shuffled order, or 0 when `start` is not part of the queue.
    pub fn shuffled_from(
        tracks: Vec<Arc<Track>>,
        start: &TrackId,
        strategy: ShuffleStrategy,
    ) -> Self {
        let active = shuffled(&tracks, strategy);
        let cursor = if active.is_empty() {
            None
        } else {
            Some(position_in(&active, start).unwrap_or(0))
        };

        Self {
            original: tracks,
            active,
            cursor,
        }
    }

    /// Queue holding a single track with the cursor on it
    pub fn single(track: Arc<Track>) -> Self {
        Self {
            original: vec![Arc::clone(&track)],
            active: vec![track],
            cursor: Some(0),
        }
    }

    /// Reshuffle the active order in place and follow `current` to its new slot
    ///
    /// Shuffles the current active contents, not the original queue. If
    /// `current` is not in the queue the cursor index is left as is.
    pub fn reshuffle(&mut self, strategy: ShuffleStrategy, current: Option<&TrackId>) {
        shuffle_tracks(&mut self.active, strategy);

        if let Some(index) = current.and_then(|id| position_in(&self.active, id)) {
            self.cursor = Some(index);
        }
    }

    /// Index `next` would move to, honouring loop mode
    ///
    /// An unset cursor behaves like position -1, so the first `next` lands on 0.
    pub fn next_index(&self, loop_mode: LoopMode) -> Option<usize> {
        if self.active.is_empty() {
            return None;
        }

        let candidate = self.cursor.map_or(0, |c| c + 1);
        if candidate < self.active.len() {
            Some(candidate)
        } else if loop_mode == LoopMode::All {
            Some(0)
        } else {
            None
        }
    }

    /// Index `prev` would move to, honouring loop mode
    pub fn prev_index(&self, loop_mode: LoopMode) -> Option<usize> {
        if self.active.is_empty() {
            return None;
        }

        match self.cursor {
            Some(c) if c > 0 => Some(c - 1),
            _ if loop_mode == LoopMode::All => Some(self.active.len() - 1),
            _ => None,
        }
    }

    pub fn set_cursor(&mut self, index: usize) {
        debug_assert!(index < self.active.len());
        self.cursor = Some(index);
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Track>> {
        self.active.get(index)
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn active(&self) -> &[Arc<Track>] {
        &self.active
    }

    pub fn original(&self) -> &[Arc<Track>] {
        &self.original
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

fn position_in(tracks: &[Arc<Track>], id: &TrackId) -> Option<usize> {
    tracks.iter().position(|t| &t.id == id)
}
