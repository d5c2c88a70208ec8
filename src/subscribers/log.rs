//! # LogWriter: bridge from bus events to `tracing`
//!
//! A subscriber that renders every incoming [`Event`] as a structured
//! `tracing` record. Install any `tracing` subscriber to see the output.
//!
//! ## Example output (with `tracing_subscriber::fmt`)
//! ```text
//! INFO  stage="ingest" attempt=1: stage starting
//! INFO  stage="ingest" attempt=1 exit="done" iterations=12 delivered=9 failures=3: stage stopped
//! WARN  stage="ingest" attempt=1 delay_ms=1000: restart scheduled
//! WARN  stage="ingest" reason="restart policy exhausted": stage exhausted
//! INFO  shutdown requested
//! INFO  all stages stopped within grace
//! ```

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let stage = e.stage.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::StageStarting => {
                info!(stage, attempt = e.attempt, "stage starting");
            }
            EventKind::StageStopped => match e.summary {
                Some(s) => info!(
                    stage,
                    attempt = e.attempt,
                    exit = s.exit.as_label(),
                    iterations = s.iterations,
                    delivered = s.delivered,
                    failures = s.failures,
                    "stage stopped"
                ),
                None => info!(stage, attempt = e.attempt, "stage stopped"),
            },
            EventKind::StageUnavailable => {
                warn!(stage, attempt = e.attempt, "stage unavailable");
            }
            EventKind::RestartScheduled => {
                warn!(stage, attempt = e.attempt, delay_ms = e.delay_ms, "restart scheduled");
            }
            EventKind::StageExhausted => {
                warn!(stage, attempt = e.attempt, reason, "stage exhausted");
            }
            EventKind::ShutdownRequested => {
                info!("shutdown requested");
            }
            EventKind::AllStoppedWithin => {
                info!("all stages stopped within grace");
            }
            EventKind::GraceExceeded => {
                error!(stuck = reason, "grace exceeded");
            }
            EventKind::SubscriberOverflow => {
                warn!(subscriber = stage, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                error!(subscriber = stage, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
