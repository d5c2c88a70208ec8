//! # Restart policies for tripped stages.
//!
//! A stage exits when its monitor reports done. [`RestartPolicy`] decides whether
//! the supervising actor resets the monitor and runs the stage again.
//!
//! Only a *trip* (exit with [`ExitReason::Done`](crate::ExitReason::Done)) is ever
//! restarted. A stage whose collaborators are gone cannot be revived by a reset
//! and always exits for good.
//!
//! ```text
//! RestartPolicy::Never                        → trip is final (default)
//! RestartPolicy::OnTrip                       → reset + rerun after backoff, forever
//! RestartPolicy::OnTripLimited { max: 3 }     → at most 3 reruns, then exhausted
//! ```

/// Policy controlling whether a tripped stage is run again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RestartPolicy {
    /// Never restart: a trip ends the stage (default).
    #[default]
    Never,
    /// Reset the monitor and rerun after every trip.
    OnTrip,
    /// Like [`OnTrip`](Self::OnTrip) but gives up after `max_restarts` reruns.
    OnTripLimited {
        /// Maximum number of reruns over the stage's lifetime.
        max_restarts: u32,
    },
}

impl RestartPolicy {
    /// Returns `true` if another run is allowed after `restarts` reruns so far.
    pub fn allows(&self, restarts: u32) -> bool {
        match self {
            RestartPolicy::Never => false,
            RestartPolicy::OnTrip => true,
            RestartPolicy::OnTripLimited { max_restarts } => restarts < *max_restarts,
        }
    }
}
