//! Delivery pipeline: capability traits, monitor, loop and fan-out.
//!
//! ## Contents
//! - [`ItemSource`], [`ItemDestination`]: pull and push capabilities;
//! - [`DoneSignal`], [`Functional`]: stop flag and pre-flight check;
//! - [`DeliveryTaskMonitor`], [`BreakerMonitor`]: outcome notifications and the
//!   reference consecutive-failure breaker;
//! - [`DeliveryTask`]: the rate-limited pull → push loop;
//! - [`NonBlockingConsumer`]: destination that hands each item to its own worker.
//!
//! ## Wiring
//! ```text
//!  Owner<S> ─authorize─┐
//!  Owner<D> ─authorize─┼──► DeliveryTask ── execute() ──► ExecutionSummary
//!  Owner<M> ─authorize─┘         │
//!                                └─ monitor_credential() ─► Interrupter (core)
//! ```

mod fanout;
mod item;
mod monitor;
mod signal;
mod task;

pub(crate) use fanout::panic_message;

pub use fanout::{FanoutStats, NonBlockingConsumer};
pub use item::{EmptyItemDestination, EmptyItemSource, ItemDestination, ItemSource, SimpleItemSource};
pub use monitor::{BreakerMonitor, DeliveryTaskMonitor, MonitorConfig, MonitorHandler};
pub use signal::{DoneSignal, Functional};
pub use task::{Actors, Configuration, DeliveryTask, ExecutionSummary, ExitReason, Options};
