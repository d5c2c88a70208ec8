//! # StageActor: single-stage supervisor.
//!
//! Supervises one [`Stage`](super::stage::Stage) with policies:
//! - reruns after a trip per [`RestartPolicy`](crate::RestartPolicy),
//! - delays per [`BackoffPolicy`](crate::BackoffPolicy),
//! - cooperative shutdown via [`CancellationToken`].
//!
//! ## Event flow
//! ```text
//! StageStarting → [execute] → StageStopped     (exit done / collaborator_lost)
//!                           → StageUnavailable (collaborator gone at start)
//!
//! After a trip (exit done):
//!   policy allows → RestartScheduled → [sleep] → reset → (next run)
//!   policy denies → StageExhausted
//! ```
//!
//! ## Architecture
//! ```text
//! loop {
//!   ├─► cancelled? → break
//!   ├─► publish StageStarting
//!   ├─► select { execute() , token.cancelled() → interrupter.interrupt(); await execute() }
//!   ├─► publish StageStopped / StageUnavailable
//!   ├─► exit != done  → publish StageExhausted, break
//!   ├─► cancelled?    → break
//!   ├─► RestartPolicy
//!   │     ├─► denies  → publish StageExhausted, break
//!   │     └─► allows  → publish RestartScheduled, sleep(backoff) (cancellable)
//!   └─► stage.reset()
//! }
//! ```
//!
//! ## Rules
//! - Runs are **sequential** within one actor
//! - Shutdown never cuts an iteration short: the monitor is interrupted and the
//!   current iteration finishes
//! - The backoff index counts consecutive trips and resets after a run that
//!   delivered at least one item

use std::sync::Arc;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::spec::StageSpec;
use crate::delivery::{ExecutionSummary, ExitReason};
use crate::events::{Bus, Event, EventKind};

/// Supervises execution of a single stage with restarts, backoff, and event publishing.
pub struct StageActor {
    spec: StageSpec,
    bus: Bus,
}

impl StageActor {
    /// Creates a new stage actor.
    pub fn new(spec: StageSpec, bus: Bus) -> Self {
        Self { spec, bus }
    }

    /// Runs the actor until the restart policy is exhausted, a collaborator is
    /// lost, or `token` is cancelled.
    pub async fn run(mut self, token: CancellationToken) {
        let name = self.spec.name.clone();
        let interrupter = self.spec.stage.interrupter();
        let mut attempt: u32 = 0;
        let mut restarts: u32 = 0;
        let mut trips: u32 = 0;

        loop {
            if token.is_cancelled() {
                break;
            }

            attempt += 1;
            self.bus.publish(
                Event::new(EventKind::StageStarting)
                    .with_stage(name.clone())
                    .with_attempt(attempt),
            );

            let summary = {
                let run = self.spec.stage.execute();
                tokio::pin!(run);
                select! {
                    summary = &mut run => summary,
                    _ = token.cancelled() => {
                        interrupter.interrupt();
                        run.await
                    }
                }
            };

            match summary.exit {
                ExitReason::Unavailable => {
                    self.bus.publish(
                        Event::new(EventKind::StageUnavailable)
                            .with_stage(name.clone())
                            .with_attempt(attempt),
                    );
                    self.exhausted(&name, attempt, "collaborator unavailable");
                    break;
                }
                ExitReason::CollaboratorLost => {
                    self.stopped(&name, attempt, summary);
                    self.exhausted(&name, attempt, "collaborator lost");
                    break;
                }
                ExitReason::Done => self.stopped(&name, attempt, summary),
            }

            if token.is_cancelled() {
                break;
            }
            if !self.spec.restart.allows(restarts) {
                self.exhausted(&name, attempt, "restart policy exhausted");
                break;
            }

            if summary.delivered > 0 {
                trips = 0;
            }
            let delay = self.spec.backoff.delay_for(trips);
            trips = trips.saturating_add(1);
            restarts = restarts.saturating_add(1);

            self.bus.publish(
                Event::new(EventKind::RestartScheduled)
                    .with_stage(name.clone())
                    .with_attempt(attempt)
                    .with_delay(delay),
            );

            let sleep = time::sleep(delay);
            tokio::pin!(sleep);
            select! {
                _ = &mut sleep => {}
                _ = token.cancelled() => { break; }
            }

            self.spec.stage.reset();
        }
        debug!(stage = %name, runs = attempt, "stage actor finished");
    }

    fn stopped(&self, name: &Arc<str>, attempt: u32, summary: ExecutionSummary) {
        self.bus.publish(
            Event::new(EventKind::StageStopped)
                .with_stage(name.clone())
                .with_attempt(attempt)
                .with_summary(summary),
        );
    }

    fn exhausted(&self, name: &Arc<str>, attempt: u32, reason: &'static str) {
        self.bus.publish(
            Event::new(EventKind::StageExhausted)
                .with_stage(name.clone())
                .with_attempt(attempt)
                .with_reason(reason),
        );
    }
}
