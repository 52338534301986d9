//! Time-based session score.
//!
//! The score is a pure function of play time: `floor(elapsed_seconds × rate)`.
//! [`ScoreEngine`] samples it once per frame and never lets the displayed
//! value go backwards, even if the wall clock does.

use chrono::{DateTime, Utc};
use gamehub_core::clock::Clock;

/// Points earned per second of play.
pub const DECAY_RATE: f64 = 0.2;

/// Score after `elapsed_secs` of play at `rate` points per second.
///
/// Negative or non-finite elapsed time scores zero.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn score_at(elapsed_secs: f64, rate: f64) -> u32 {
    let raw = (elapsed_secs * rate).floor();
    if raw.is_nan() || raw <= 0.0 {
        return 0;
    }
    // Saturates at u32::MAX.
    raw as u32
}

/// Per-session score state.
#[derive(Debug, Clone)]
pub struct ScoreEngine {
    rate: f64,
    started_at: Option<DateTime<Utc>>,
    current: u32,
}

impl Default for ScoreEngine {
    fn default() -> Self {
        Self::new(DECAY_RATE)
    }
}

impl ScoreEngine {
    /// Creates a stopped engine scoring `rate` points per second.
    #[must_use]
    pub fn new(rate: f64) -> Self {
        Self {
            rate,
            started_at: None,
            current: 0,
        }
    }

    /// Starts timing from `now` with a score of zero.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.started_at = Some(now);
        self.current = 0;
    }

    /// Recomputes the score from `clock`. Returns the new value if it
    /// increased, `None` otherwise or when the engine is stopped.
    pub fn sample(&mut self, clock: &dyn Clock) -> Option<u32> {
        let started_at = self.started_at?;
        let next = score_at(clock.seconds_since(started_at), self.rate);
        if next > self.current {
            self.current = next;
            Some(next)
        } else {
            None
        }
    }

    /// The last sampled score.
    #[must_use]
    pub fn value(&self) -> u32 {
        self.current
    }

    /// When timing started, if running.
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Stops timing and zeroes the score.
    pub fn reset(&mut self) {
        self.started_at = None;
        self.current = 0;
    }
}
