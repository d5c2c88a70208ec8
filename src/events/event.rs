//! # Runtime events emitted by the supervisor and stage actors.
//!
//! The [`EventKind`] enum classifies events across three categories:
//! - **Stage lifecycle**: one run of a stage (starting, stopped, unavailable)
//! - **Restart flow**: rerun scheduling and policy exhaustion
//! - **Runtime**: shutdown progress and subscriber health
//!
//! The [`Event`] struct carries the metadata: timestamps, stage name, attempt,
//! delay, reason and the counters of the finished run.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use pipevisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RestartScheduled)
//!     .with_stage("ingest")
//!     .with_attempt(2)
//!     .with_delay(Duration::from_millis(1500));
//!
//! assert_eq!(ev.kind, EventKind::RestartScheduled);
//! assert_eq!(ev.stage.as_deref(), Some("ingest"));
//! assert_eq!(ev.delay_ms, Some(1500));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::delivery::{ExecutionSummary, ExitReason};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `stage`: subscriber name
    /// - `reason`: panic message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `stage`: subscriber name
    /// - `reason`: `full` or `closed`
    SubscriberOverflow,

    // === Shutdown events ===
    /// Shutdown requested (OS signal or caller-provided future).
    ShutdownRequested,

    /// All stages stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some stages did not stop in time.
    ///
    /// Sets:
    /// - `reason`: stuck stage names
    GraceExceeded,

    // === Stage lifecycle ===
    /// Stage run is starting.
    ///
    /// Sets:
    /// - `stage`: stage name
    /// - `attempt`: run number (1-based, per actor)
    StageStarting,

    /// Stage run has returned.
    ///
    /// Sets:
    /// - `stage`: stage name
    /// - `attempt`: run number
    /// - `reason`: exit label (`done`, `collaborator_lost`)
    /// - `summary`: counters of the run
    StageStopped,

    /// Stage could not run because a collaborator was gone.
    ///
    /// Sets:
    /// - `stage`: stage name
    /// - `attempt`: run number, when reported by an actor
    StageUnavailable,

    // === Restart flow ===
    /// Next run scheduled after the monitor tripped.
    ///
    /// Sets:
    /// - `stage`: stage name
    /// - `attempt`: previous run number
    /// - `delay_ms`: delay before the next run
    RestartScheduled,

    /// Actor will not run the stage again.
    ///
    /// Emitted when the restart policy forbids another run, or when the stage
    /// lost a collaborator.
    ///
    /// Sets:
    /// - `stage`: stage name
    /// - `attempt`: last run number
    /// - `reason`: why
    StageExhausted,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the stage (or subscriber), if applicable.
    pub stage: Option<Arc<str>>,
    /// Run count (starting from 1).
    pub attempt: Option<u32>,
    /// Delay before next run in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason.
    pub reason: Option<Arc<str>>,
    /// Counters of a finished run.
    pub summary: Option<ExecutionSummary>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            stage: None,
            attempt: None,
            delay_ms: None,
            reason: None,
            summary: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a stage name.
    #[inline]
    pub fn with_stage(mut self, stage: impl Into<Arc<str>>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    /// Attaches a restart delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a run count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches run counters and the exit label as reason.
    #[inline]
    pub fn with_summary(mut self, summary: ExecutionSummary) -> Self {
        self.reason = Some(summary.exit.as_label().into());
        self.summary = Some(summary);
        self
    }

    /// Exit of the finished run, if attached.
    #[inline]
    pub fn exit(&self) -> Option<ExitReason> {
        self.summary.map(|s| s.exit)
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_stage(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_stage(subscriber)
            .with_reason(info)
    }

    /// True for events produced by the subscriber machinery itself.
    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}
