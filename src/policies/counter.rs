//! # Bounded event counter.
//!
//! [`BoundedCounter`] counts events inside `[0, threshold]` and reports when the
//! threshold has been reached. It saturates rather than wrapping, so once reached
//! every further [`count`](BoundedCounter::count) keeps reporting `true` until
//! [`reset`](BoundedCounter::reset).

use std::sync::atomic::{AtomicU32, Ordering};

/// Saturating counter with a fixed threshold.
///
/// Safe to share: `count` is expected from a single writer, while `reset` and
/// `value` may run from any task.
#[derive(Debug)]
pub struct BoundedCounter {
    value: AtomicU32,
    threshold: u32,
}

impl BoundedCounter {
    /// Creates a counter at zero. A `threshold` of `0` is clamped to `1`.
    pub fn new(threshold: u32) -> Self {
        Self {
            value: AtomicU32::new(0),
            threshold: threshold.max(1),
        }
    }

    /// Records one event; returns `true` if the counter is at its threshold.
    pub fn count(&self) -> bool {
        let previous = self
            .value
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| {
                Some(v.saturating_add(1).min(self.threshold))
            })
            .unwrap_or(self.threshold);
        previous.saturating_add(1) >= self.threshold
    }

    /// Zeroes the counter.
    #[inline]
    pub fn reset(&self) {
        self.value.store(0, Ordering::Release);
    }

    /// Current value, in `[0, threshold]`.
    #[inline]
    pub fn value(&self) -> u32 {
        self.value.load(Ordering::Acquire)
    }

    /// Configured threshold (always `>= 1`).
    #[inline]
    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}
