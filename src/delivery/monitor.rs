//! # Delivery task monitor and the reference circuit-breaker policy.
//!
//! A monitor is told about every pull outcome and decides when the stage should
//! stop. The [`DeliveryTask`](crate::DeliveryTask) only reads
//! [`is_done`](DoneSignal::is_done) and reports outcomes; everything else is policy.
//!
//! ## BreakerMonitor state machine
//! ```text
//!              error (streak < K)            success
//!             ┌──────────────┐           ┌──────────────┐
//!             ▼              │           ▼              │
//!   ┌──────────────────────────┐  streak reaches K  ┌────────────────┐
//!   │ ARMED  done=false        │ ─────────────────► │ TRIPPED        │
//!   │ streak in [0, K)         │                    │ done=true      │
//!   └──────────────────────────┘ ◄───────────────── └────────────────┘
//!                 ▲                    reset()              │
//!                 │                                         │ interrupt()
//!                 └──────── success: streak = 0             ▼ (idempotent)
//! ```
//!
//! ## Rules
//! - any single success forgives all prior failures (no decay window);
//! - K consecutive errors trip the breaker; K−1 errors then a success do not;
//! - `interrupt`/`reset`/`is_done` are safe from any task, the streak is written
//!   by the stage's own task only;
//! - override handlers, when set, fully replace the default policy for that
//!   notification and the streak is left untouched.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use super::signal::DoneSignal;
use crate::policies::BoundedCounter;

/// Monitor of a delivery task: a done signal plus outcome notifications.
pub trait DeliveryTaskMonitor: DoneSignal {
    /// Records one failed pull.
    fn handle_item_source_error(&self);

    /// Records one successful pull.
    fn handle_item_source_success(&self);
}

/// Override for one of the monitor notifications.
///
/// Receives the monitor's done signal so a custom policy can stop the stage.
pub type MonitorHandler = Box<dyn Fn(&dyn DoneSignal) + Send + Sync>;

/// Settings for [`BreakerMonitor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Consecutive source errors that trip the breaker (`0` is treated as `1`).
    pub failure_threshold: u32,
}

impl MonitorConfig {
    /// Threshold clamped to a minimum of 1.
    #[inline]
    pub fn failure_threshold_clamped(&self) -> u32 {
        self.failure_threshold.max(1)
    }
}

impl Default for MonitorConfig {
    /// `failure_threshold = 10`.
    fn default() -> Self {
        Self {
            failure_threshold: 10,
        }
    }
}

/// Reference monitor: trips after a streak of consecutive source errors.
pub struct BreakerMonitor {
    done: AtomicBool,
    streak: BoundedCounter,
    on_error: Option<MonitorHandler>,
    on_success: Option<MonitorHandler>,
}

impl BreakerMonitor {
    /// Creates an armed monitor that trips after `failure_threshold` errors in a row.
    pub fn new(failure_threshold: u32) -> Self {
        Self {
            done: AtomicBool::new(false),
            streak: BoundedCounter::new(failure_threshold),
            on_error: None,
            on_success: None,
        }
    }

    /// Creates a monitor from config.
    pub fn from_config(cfg: &MonitorConfig) -> Self {
        Self::new(cfg.failure_threshold_clamped())
    }

    /// Replaces the default error policy.
    pub fn with_error_handler(
        mut self,
        handler: impl Fn(&dyn DoneSignal) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Replaces the default success policy.
    pub fn with_success_handler(
        mut self,
        handler: impl Fn(&dyn DoneSignal) + Send + Sync + 'static,
    ) -> Self {
        self.on_success = Some(Box::new(handler));
        self
    }

    /// Current run of consecutive errors, in `[0, threshold]`.
    #[inline]
    pub fn failure_streak(&self) -> u32 {
        self.streak.value()
    }

    /// Errors in a row that trip the breaker.
    #[inline]
    pub fn threshold(&self) -> u32 {
        self.streak.threshold()
    }
}

impl Default for BreakerMonitor {
    fn default() -> Self {
        Self::from_config(&MonitorConfig::default())
    }
}

impl fmt::Debug for BreakerMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BreakerMonitor")
            .field("done", &self.is_done())
            .field("streak", &self.failure_streak())
            .field("threshold", &self.threshold())
            .field("overridden", &(self.on_error.is_some() || self.on_success.is_some()))
            .finish()
    }
}

impl DoneSignal for BreakerMonitor {
    #[inline]
    fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    fn interrupt(&self) {
        if !self.done.swap(true, Ordering::AcqRel) {
            debug!("monitor interrupted");
        }
    }

    fn reset(&self) {
        self.streak.reset();
        self.done.store(false, Ordering::Release);
    }
}

impl DeliveryTaskMonitor for BreakerMonitor {
    fn handle_item_source_error(&self) {
        if let Some(handler) = &self.on_error {
            handler(self as &dyn DoneSignal);
            return;
        }
        if self.streak.count() && !self.is_done() {
            warn!(
                threshold = self.threshold(),
                "consecutive source failures reached threshold; tripping"
            );
            self.interrupt();
        }
    }

    fn handle_item_source_success(&self) {
        if let Some(handler) = &self.on_success {
            handler(self as &dyn DoneSignal);
            return;
        }
        self.streak.reset();
    }
}
