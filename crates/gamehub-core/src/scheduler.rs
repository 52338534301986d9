//! Cooperative per-frame tick scheduling.
//!
//! The score clock is recomputed on every frame while a session is playing.
//! Callers hand a tick closure to a [`TickScheduler`] and keep the returned
//! [`TickHandle`]; cancelling (or dropping) the handle stops the ticks before
//! the next frame.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// A frame callback.
pub type Tick = Box<dyn FnMut() + Send + 'static>;

/// Default frame period, roughly 60 frames per second.
pub const DEFAULT_FRAME_PERIOD: Duration = Duration::from_millis(16);

/// Starts recurring frame ticks.
pub trait TickScheduler: Send + Sync {
    /// Begins invoking `tick` once per frame until the returned handle is
    /// cancelled or dropped.
    fn start(&self, tick: Tick) -> TickHandle;
}

/// Ownership of a running tick. Dropping the handle cancels it.
#[derive(Debug)]
pub struct TickHandle {
    token: CancellationToken,
}

impl TickHandle {
    /// Wraps a cancellation token that the scheduler observes.
    #[must_use]
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Stops further ticks. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns `true` once the tick has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Production scheduler: a Tokio task driven by a fixed-period interval.
#[derive(Debug, Clone, Copy)]
pub struct IntervalTickScheduler {
    period: Duration,
}

impl IntervalTickScheduler {
    /// Creates a scheduler ticking every `period`.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self { period }
    }
}

impl Default for IntervalTickScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_PERIOD)
    }
}

impl TickScheduler for IntervalTickScheduler {
    fn start(&self, mut tick: Tick) -> TickHandle {
        let token = CancellationToken::new();

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no Tokio runtime available, frame ticks not started");
            token.cancel();
            return TickHandle::new(token);
        };

        let task_token = token.clone();
        let period = self.period;
        runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    () = task_token.cancelled() => break,
                    _ = interval.tick() => {
                        if task_token.is_cancelled() {
                            break;
                        }
                        tick();
                    }
                }
            }
            debug!("frame ticks stopped");
        });

        TickHandle::new(token)
    }
}
