//! Pacing, failure-counting and restart policies.
//!
//! This module groups the small primitives a pipeline stage consumes and the
//! knobs that control whether a tripped stage gets another run.
//!
//! ## Contents
//! - [`IntervalSleeper`] minimum wall-clock interval between loop iterations
//! - [`BoundedCounter`]  saturating counter reporting when a threshold is reached
//! - [`RestartPolicy`]   whether a tripped stage is reset and run again
//! - [`BackoffPolicy`]   how long to wait before that next run
//! - [`JitterPolicy`]    randomization of the backoff delay
//!
//! ## Quick wiring
//! ```text
//! DeliveryTask ─► IntervalSleeper::sleep() once per iteration
//! BreakerMonitor ─► BoundedCounter::count() per source error, reset() per success
//! StageActor ─► RestartPolicy decides, BackoffPolicy::delay_for(restarts) waits
//! ```
//!
//! ## Defaults
//! - `RestartPolicy::Never`: a tripped stage stays down until reset from outside.
//! - `BackoffPolicy::default()` → first=1s, factor=2.0, max=60s, jitter=None.

mod backoff;
mod counter;
mod interval;
mod jitter;
mod restart;

pub use backoff::BackoffPolicy;
pub use counter::BoundedCounter;
pub use interval::IntervalSleeper;
pub use jitter::JitterPolicy;
pub use restart::RestartPolicy;
