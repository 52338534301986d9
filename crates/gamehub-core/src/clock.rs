//! Wall-clock abstraction so score sampling can be driven by tests.

use chrono::{DateTime, Utc};

/// Abstraction over system time.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;

    /// Seconds elapsed between `since` and now. Negative when the clock has
    /// moved backwards past `since`.
    #[allow(clippy::cast_precision_loss)]
    fn seconds_since(&self, since: DateTime<Utc>) -> f64 {
        (self.now() - since).num_milliseconds() as f64 / 1000.0
    }
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
