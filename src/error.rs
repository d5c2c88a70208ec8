//! Error types used by the pipevisor runtime.
//!
//! Delivery itself never fails: a source that produces nothing is reported to
//! the stage's monitor, and a missing collaborator ends the run with an
//! [`ExitReason`](crate::ExitReason). The only errors are raised by the
//! orchestration runtime.

use std::time::Duration;

use thiserror::Error;

/// # Errors produced by the pipevisor runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some stages were still executing and
    /// were aborted.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the stages that did not stop in time.
        stuck: Vec<String>,
    },

    /// Listening for OS termination signals failed.
    #[error("failed to listen for shutdown signals: {0}")]
    Signal(#[source] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use pipevisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Signal(_) => "runtime_signal",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck stages={stuck:?}")
            }
            RuntimeError::Signal(e) => format!("signal listener: {e}"),
        }
    }
}
