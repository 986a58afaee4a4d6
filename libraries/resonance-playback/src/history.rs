//! Listen-history threshold tracking
//!
//! A loaded track counts as listened once its play position is past the
//! absolute floor and past the point where the track reached either that
//! floor or `fraction * duration`. The floor is never undercut, so a track
//! shorter than the floor is never recorded. Each loaded track instance
//! fires at most once; loading again (including a loop-one restart) re-arms
//! the tracker.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ListenThreshold {
    floor: Duration,
    fraction: f32,
    recorded: bool,
}

impl ListenThreshold {
    pub fn new(floor: Duration, fraction: f32) -> Self {
        Self {
            floor,
            fraction: fraction.clamp(0.0, 1.0),
            recorded: false,
        }
    }

    /// Re-arm for a freshly loaded track
    pub fn reset(&mut self) {
        self.recorded = false;
    }

    pub fn is_recorded(&self) -> bool {
        self.recorded
    }

    /// Earlier of the floor and the fractional mark; the floor alone while
    /// the duration is unknown
    fn progress_mark(&self, duration: Option<Duration>) -> Duration {
        match duration {
            Some(duration) => self.floor.min(duration.mul_f32(self.fraction)),
            None => self.floor,
        }
    }

    /// Whether `position` qualifies the current track as listened
    pub fn qualifies(&self, position: Duration, duration: Option<Duration>) -> bool {
        position > self.floor && position > self.progress_mark(duration)
    }

    /// Feed a position update; returns true exactly once per loaded track
    pub fn observe(&mut self, position: Duration, duration: Option<Duration>) -> bool {
        if self.recorded || position.is_zero() {
            return false;
        }

        if self.qualifies(position, duration) {
            self.recorded = true;
            return true;
        }

        false
    }
}
