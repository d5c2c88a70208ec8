//! Runtime core: stages, supervision and lifecycle.
//!
//! Internal modules:
//! - [`stage`]: the [`Stage`] contract and the [`Interrupter`] handle;
//! - [`spec`]: [`StageSpec`], a named stage with its restart policies;
//! - [`actor`]: runs one stage with restart policy and backoff;
//! - [`alive`]: sequence-ordered tracker of executing stages;
//! - [`supervisor`]: orchestrates actors, handles shutdown and grace;
//! - [`shutdown`]: cross-platform shutdown signal handling;
//! - [`config`]: global runtime configuration.

mod actor;
mod alive;
mod config;
mod shutdown;
mod spec;
mod stage;
mod supervisor;

pub use actor::StageActor;
pub use alive::AliveTracker;
pub use config::Config;
pub use spec::StageSpec;
pub use stage::{Interrupter, Stage};
pub use supervisor::Supervisor;
