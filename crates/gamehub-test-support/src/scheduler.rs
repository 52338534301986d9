//! Test scheduler: frames fire only when a test asks for them.

use std::sync::{Arc, Mutex};

use gamehub_core::scheduler::{Tick, TickHandle, TickScheduler};
use tokio_util::sync::CancellationToken;

type SharedTick = Arc<Mutex<Tick>>;

/// A `TickScheduler` that records started ticks and runs them on
/// [`ManualTickScheduler::fire`]. Cancelled ticks are never run again.
#[derive(Default)]
pub struct ManualTickScheduler {
    ticks: Mutex<Vec<(CancellationToken, SharedTick)>>,
}

impl ManualTickScheduler {
    /// Creates a scheduler with no ticks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one frame of every live tick.
    ///
    /// # Panics
    ///
    /// Panics if an internal mutex is poisoned.
    pub fn fire(&self) {
        let live: Vec<SharedTick> = {
            let mut ticks = self.ticks.lock().unwrap();
            ticks.retain(|(token, _)| !token.is_cancelled());
            ticks.iter().map(|(_, tick)| Arc::clone(tick)).collect()
        };
        for tick in live {
            let mut tick = tick.lock().unwrap();
            (*tick)();
        }
    }

    /// Number of ticks started and not yet cancelled.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn active_ticks(&self) -> usize {
        self.ticks
            .lock()
            .unwrap()
            .iter()
            .filter(|(token, _)| !token.is_cancelled())
            .count()
    }
}

impl TickScheduler for ManualTickScheduler {
    fn start(&self, tick: Tick) -> TickHandle {
        let token = CancellationToken::new();
        self.ticks
            .lock()
            .unwrap()
            .push((token.clone(), Arc::new(Mutex::new(tick))));
        TickHandle::new(token)
    }
}
