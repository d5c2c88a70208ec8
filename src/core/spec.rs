//! # Stage specification for supervisor.
//!
//! [`StageSpec`] bundles a named [`Stage`] with its restart [`RestartPolicy`]
//! and [`BackoffPolicy`].
//!
//! ```text
//! StageSpec ──► Supervisor::run(vec![spec, ...]) ──► StageActor (one per spec)
//! ```

use std::fmt;
use std::sync::Arc;

use super::config::Config;
use super::stage::Stage;
use crate::policies::{BackoffPolicy, RestartPolicy};

/// Specification for running a stage under supervision.
pub struct StageSpec {
    /// Stage name used in events (unique names keep the alive tracker accurate).
    pub name: Arc<str>,
    /// The stage itself.
    pub stage: Box<dyn Stage>,
    /// Whether a tripped stage runs again.
    pub restart: RestartPolicy,
    /// Delay before each rerun.
    pub backoff: BackoffPolicy,
}

impl StageSpec {
    /// Creates a specification with explicit policies.
    pub fn new(
        name: impl Into<Arc<str>>,
        stage: impl Stage,
        restart: RestartPolicy,
        backoff: BackoffPolicy,
    ) -> Self {
        Self {
            name: name.into(),
            stage: Box::new(stage),
            restart,
            backoff,
        }
    }

    /// Creates a specification inheriting policies from global config.
    pub fn with_defaults(name: impl Into<Arc<str>>, stage: impl Stage, cfg: &Config) -> Self {
        Self::new(name, stage, cfg.restart, cfg.backoff)
    }
}

impl fmt::Debug for StageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageSpec")
            .field("name", &self.name)
            .field("restart", &self.restart)
            .field("backoff", &self.backoff)
            .finish()
    }
}
