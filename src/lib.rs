//! # pipevisor
//!
//! **Pipevisor** runs supervised pull → push pipeline stages.
//!
//! A stage is a [`DeliveryTask`]: a rate-limited loop that pulls one item from
//! an [`ItemSource`], pushes it to an [`ItemDestination`] and reports every
//! outcome to a [`DeliveryTaskMonitor`] that decides when to stop. The
//! reference monitor, [`BreakerMonitor`], trips after a run of consecutive
//! source failures. Collaborators are wired through non-owning
//! [`Credential`]s, so tearing down a collaborator stops the stages that use it
//! instead of keeping it alive.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  Owner<Source>   Owner<Dest>   Owner<Monitor>        (application keeps these)
//!        │ authorize()   │             │
//!        ▼               ▼             ▼
//!  ┌─────────────────────────────────────────┐
//!  │ DeliveryTask (Credential × 3 + sleeper) │ ── Stage ──┐
//!  └─────────────────────────────────────────┘            │
//!                                                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Supervisor                                                     │
//! │  - Bus (broadcast events)                                       │
//! │  - AliveTracker (executing stages, sequence-ordered)            │
//! │  - SubscriberSet (fans out to user subscribers)                 │
//! └──────┬──────────────────┬──────────────────┬────────────────────┘
//!        ▼                  ▼                  ▼
//!   StageActor         StageActor         StageActor
//!   (restart loop)     (restart loop)     (restart loop)
//!        │ StageStarting / StageStopped / RestartScheduled / ...
//!        ▼
//!   Bus ─► listener ─► AliveTracker + SubscriberSet ─► sub.on_event()
//! ```
//!
//! ### One iteration
//! ```text
//! is_done()? ─► sleep(min_interval) ─► get_item()
//!                                        ├─ Some ─► set_item() ─► success()
//!                                        └─ None ─► error()
//! ```
//!
//! ## Features
//! | Area            | Description                                             | Key types / traits                                   |
//! |-----------------|---------------------------------------------------------|------------------------------------------------------|
//! | **Ownership**   | Owning / shared / non-owning handles                    | [`Owner`], [`User`], [`Credential`], [`validate_all!`] |
//! | **Delivery**    | Pull → push loop with pacing and a stop monitor         | [`DeliveryTask`], [`BreakerMonitor`]                 |
//! | **Fan-out**     | Destination that never waits on item handling           | [`NonBlockingConsumer`]                              |
//! | **Supervision** | Restart tripped stages, graceful shutdown               | [`Supervisor`], [`StageSpec`], [`RestartPolicy`]     |
//! | **Events**      | Lifecycle events for logging and custom subscribers     | [`Event`], [`Subscribe`]                             |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], a subscriber rendering events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use pipevisor::{BreakerMonitor, DeliveryTask, EmptyItemSource, EmptyItemDestination, ExitReason, Owner};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let source = Owner::new(EmptyItemSource::<String>::default());
//! let sink = Owner::new(EmptyItemDestination::<String>::default());
//! let monitor = Owner::new(BreakerMonitor::new(3));
//!
//! let mut task = DeliveryTask::new(
//!     source.authorize().unwrap(),
//!     sink.authorize().unwrap(),
//!     monitor.authorize().unwrap(),
//!     Duration::from_millis(1),
//! );
//!
//! // A source that never produces trips the breaker after three pulls.
//! let summary = task.execute().await;
//! assert_eq!(summary.exit, ExitReason::Done);
//! assert_eq!(summary.failures, 3);
//! # }
//! ```

mod core;
mod delivery;
mod error;
mod events;
pub mod ownership;
mod policies;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{AliveTracker, Config, Interrupter, Stage, StageActor, StageSpec, Supervisor};
pub use delivery::{
    Actors, BreakerMonitor, Configuration, DeliveryTask, DeliveryTaskMonitor, DoneSignal,
    EmptyItemDestination, EmptyItemSource, ExecutionSummary, ExitReason, FanoutStats, Functional,
    ItemDestination, ItemSource, MonitorConfig, MonitorHandler, NonBlockingConsumer, Options,
    SimpleItemSource,
};
pub use error::RuntimeError;
pub use events::{Bus, Event, EventKind};
pub use ownership::{Acquire, Credential, Owner, User, Validate};
pub use policies::{BackoffPolicy, BoundedCounter, IntervalSleeper, JitterPolicy, RestartPolicy};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose the tracing bridge subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
