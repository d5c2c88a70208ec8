//! # Event subscribers for the pipevisor runtime.
//!
//! This module provides the [`Subscribe`] extension point and the
//! [`SubscriberSet`] that fans events out to subscribers without blocking
//! the publishers.
//!
//! ## Architecture
//! ```text
//!   StageActor ── publish(Event) ──► Bus ──► Supervisor listener
//!                                               │
//!                                               ├──► AliveTracker::update (inline)
//!                                               └──► SubscriberSet::emit
//!                                                       ├──► [queue] LogWriter
//!                                                       └──► [queue] custom ...
//! ```
//!
//! `LogWriter` is available with the `logging` feature.

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
