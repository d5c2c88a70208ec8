//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the supervisor runtime.
//!
//! Config is used in three ways:
//! 1. **Supervisor creation**: `Supervisor::new(config, subscribers)`
//! 2. **StageSpec defaults**: `StageSpec::with_defaults(name, stage, &config)`
//! 3. **Stage wiring**: [`Config::monitor`] and [`Config::min_interval`] feed
//!    monitors and delivery tasks built by the application.
//!
//! ## Sentinel values
//! - `grace = 0s` → do not wait for stages on shutdown
//! - `failure_threshold = 0` → treated as 1 (see [`MonitorConfig`])

use std::time::Duration;

use crate::delivery::MonitorConfig;
use crate::policies::{BackoffPolicy, RestartPolicy};

/// Global configuration for the supervisor runtime.
///
/// ## Field semantics
/// - `grace`: Maximum wait for stages to stop after shutdown is requested
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `restart`: Default restart policy (can be overridden per stage)
/// - `backoff`: Default restart backoff (can be overridden per stage)
/// - `min_interval`: Default minimum interval between delivery iterations
/// - `failure_threshold`: Default consecutive-failure threshold of the breaker
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time to wait for graceful shutdown.
    ///
    /// On shutdown every stage is interrupted and finishes its current
    /// iteration; the supervisor waits up to `grace` before returning
    /// `RuntimeError::GraceExceeded`.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Default restart policy for stages.
    pub restart: RestartPolicy,

    /// Default backoff policy between restarts.
    pub backoff: BackoffPolicy,

    /// Default minimum interval between the starts of two delivery iterations.
    pub min_interval: Duration,

    /// Default number of consecutive source failures that trip a breaker.
    pub failure_threshold: u32,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Monitor settings derived from this config.
    #[inline]
    pub fn monitor(&self) -> MonitorConfig {
        MonitorConfig {
            failure_threshold: self.failure_threshold,
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `grace = 30s`
    /// - `bus_capacity = 1024`
    /// - `restart = RestartPolicy::Never`
    /// - `backoff = BackoffPolicy::default()` (exponential backoff)
    /// - `min_interval = 100ms`
    /// - `failure_threshold = 10`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(30),
            bus_capacity: 1024,
            restart: RestartPolicy::default(),
            backoff: BackoffPolicy::default(),
            min_interval: Duration::from_millis(100),
            failure_threshold: MonitorConfig::default().failure_threshold,
        }
    }
}
