//! Periodic tick source for a running session.
//!
//! The first tick fires one full period after [`Ticker::spawn`]. Dropping
//! the [`Ticker`] cancels it.

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

/// Handle to a repeating tick task.
#[derive(Debug)]
pub struct Ticker {
    handle: JoinHandle<()>,
    period: Duration,
}

impl Ticker {
    /// Spawns a task calling `on_tick` every `period` with the 1-based tick
    /// count.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut(u64) + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            let mut count = 0u64;
            loop {
                ticker.tick().await;
                count += 1;
                on_tick(count);
            }
        });

        Self { handle, period }
    }

    /// Returns the tick period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Stops the tick task.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
