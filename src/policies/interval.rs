//! # Interval sleeper: minimum spacing between loop iterations.
//!
//! [`IntervalSleeper::sleep`] completes no earlier than `interval` after the
//! previous call returned. It is a hard floor, not best effort: a loop whose
//! body returns instantly (e.g. a failing source) still runs at most once per
//! interval.
//!
//! ```text
//! call 1 ──► returns at once            (no previous call)
//! call 2 ──► sleep_until(t1 + interval)
//! call 3 ──► sleep_until(t2 + interval) (no wait if the body already took longer)
//! ```

use std::time::Duration;

use tokio::time::{self, Instant};

/// Rate limiter consumed by the delivery loop.
#[derive(Debug, Clone, Default)]
pub struct IntervalSleeper {
    /// Minimum interval between the starts of consecutive iterations.
    ///
    /// `Duration::ZERO` disables pacing.
    pub interval: Duration,
    last: Option<Instant>,
}

impl IntervalSleeper {
    /// Creates a sleeper with the given minimum interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Waits until at least `interval` has elapsed since the previous call.
    pub async fn sleep(&mut self) {
        if let Some(last) = self.last {
            let deadline = last + self.interval;
            if deadline > Instant::now() {
                time::sleep_until(deadline).await;
            }
        }
        self.last = Some(Instant::now());
    }
}
