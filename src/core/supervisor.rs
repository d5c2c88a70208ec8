//! # Supervisor: orchestrates stage actors, event fan-out, and graceful shutdown.
//!
//! The [`Supervisor`] owns the event bus, a [`SubscriberSet`] (held by the
//! listener task), the [`AliveTracker`] and the global [`Config`]. It spawns one
//! [`StageActor`] per [`StageSpec`], listens for a shutdown request and
//! enforces the grace period.
//!
//! ## High-level architecture
//! ```text
//! Supervisor::new(cfg, subscribers)
//!   └─► listener: Bus.subscribe() ─► AliveTracker::update ─► SubscriberSet::emit
//!
//! run(stages) / run_until(stages, shutdown)
//!   for each StageSpec:
//!     ├─ !is_functional() ─► publish StageUnavailable (not spawned)
//!     └─ StageActor::new(spec, bus) ─► set.spawn(actor.run(child_token))
//!
//!   select {
//!     all actors joined      ─► Ok(())
//!     shutdown requested     ─► publish ShutdownRequested
//!                               runtime_token.cancel()   (actors interrupt their monitors)
//!                               wait_all_with_grace(cfg.grace):
//!                                 ├─ all joined ─► publish AllStoppedWithin
//!                                 └─ timeout    ─► publish GraceExceeded,
//!                                                  RuntimeError::GraceExceeded { stuck }
//!   }
//!   close():
//!     cancel listener ─► forward events still queued on the bus
//!                     ─► SubscriberSet::shutdown (drain every subscriber queue)
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use pipevisor::{
//!     BreakerMonitor, Config, DeliveryTask, EmptyItemDestination, Owner, SimpleItemSource,
//!     StageSpec, Supervisor,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), pipevisor::RuntimeError> {
//! let mut cfg = Config::default();
//! cfg.grace = Duration::from_secs(1);
//!
//! let source = Owner::new(SimpleItemSource::new(1_u32));
//! let sink = Owner::new(EmptyItemDestination::<u32>::default());
//! let monitor = Owner::new(BreakerMonitor::from_config(&cfg.monitor()));
//!
//! let task = DeliveryTask::new(
//!     source.authorize().unwrap(),
//!     sink.authorize().unwrap(),
//!     monitor.authorize().unwrap(),
//!     cfg.min_interval,
//! );
//!
//! let sup = Supervisor::new(cfg.clone(), Vec::new());
//! let stop = tokio::time::sleep(Duration::from_millis(250));
//! sup.run_until(vec![StageSpec::with_defaults("ticker", task, &cfg)], stop).await?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::warn;

use super::actor::StageActor;
use super::alive::AliveTracker;
use super::config::Config;
use super::shutdown;
use super::spec::StageSpec;
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Coordinates stage actors, event delivery (via [`SubscriberSet`]), and graceful shutdown.
pub struct Supervisor {
    /// Global runtime configuration.
    pub cfg: Config,
    /// Event bus shared with all actors.
    pub bus: Bus,
    /// Stages currently executing, fed by the listener.
    pub alive: Arc<AliveTracker>,
    listener: JoinHandle<SubscriberSet>,
    stop_listener: DropGuard,
}

impl Supervisor {
    /// Creates a new supervisor with the given config and subscribers.
    ///
    /// Must be called within a tokio runtime: subscriber workers and the bus
    /// listener are spawned here. Dropping the supervisor without running it
    /// stops the listener and releases the subscribers.
    pub fn new(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(subscribers, bus.clone());
        let alive = Arc::new(AliveTracker::new());
        let stop = CancellationToken::new();

        let listener = subscriber_listener(bus.subscribe(), subs, Arc::clone(&alive), stop.clone());
        Self {
            cfg,
            bus,
            alive,
            listener,
            stop_listener: stop.drop_guard(),
        }
    }

    /// Runs the stages until they all exit on their own, or an OS termination
    /// signal arrives and graceful shutdown completes.
    ///
    /// Every event published during the run reaches the subscribers before
    /// this returns; the subscribers are shut down afterwards.
    pub async fn run(self, stages: Vec<StageSpec>) -> Result<(), RuntimeError> {
        let res = self.drive(stages, shutdown::wait_for_shutdown_signal()).await;
        self.close().await;
        res
    }

    /// Like [`run`](Self::run), with `shutdown` completing in place of an OS signal.
    pub async fn run_until<F>(self, stages: Vec<StageSpec>, shutdown: F) -> Result<(), RuntimeError>
    where
        F: Future<Output = ()>,
    {
        let res = self
            .drive(stages, async {
                shutdown.await;
                Ok(())
            })
            .await;
        self.close().await;
        res
    }

    async fn drive<F>(&self, stages: Vec<StageSpec>, shutdown: F) -> Result<(), RuntimeError>
    where
        F: Future<Output = Result<(), RuntimeError>>,
    {
        let token = CancellationToken::new();
        let mut set = JoinSet::new();
        self.spawn_stage_actors(&mut set, &token, stages);

        let requested = {
            let all_done = join_all(&mut set);
            tokio::select! {
                res = shutdown => Some(res),
                _ = all_done => None,
            }
        };

        let Some(requested) = requested else {
            return Ok(());
        };
        if let Err(e) = &requested {
            warn!(error = %e, "shutdown signal listener failed; stopping stages");
        }

        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        token.cancel();
        let stopped = self.wait_all_with_grace(&mut set).await;
        requested.and(stopped)
    }

    /// Stops the listener once it has forwarded everything published so far,
    /// then drains and shuts down the subscriber set.
    async fn close(self) {
        let Self {
            listener,
            stop_listener,
            ..
        } = self;
        drop(stop_listener);
        match listener.await {
            Ok(subs) => subs.shutdown().await,
            Err(e) => warn!(error = %e, "event listener failed"),
        }
    }

    /// Spawns one actor per functional stage; reports the others unavailable.
    fn spawn_stage_actors(
        &self,
        set: &mut JoinSet<()>,
        runtime_token: &CancellationToken,
        stages: Vec<StageSpec>,
    ) {
        for spec in stages {
            if !spec.stage.is_functional() {
                self.bus.publish(
                    Event::new(EventKind::StageUnavailable).with_stage(spec.name.clone()),
                );
                continue;
            }
            let actor = StageActor::new(spec, self.bus.clone());
            set.spawn(actor.run(runtime_token.child_token()));
        }
    }

    /// Waits for all actors to finish within the configured grace period.
    async fn wait_all_with_grace(&self, set: &mut JoinSet<()>) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace;
        match tokio::time::timeout(grace, join_all(set)).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                let stuck = self.alive.snapshot().await;
                self.bus
                    .publish(Event::new(EventKind::GraceExceeded).with_reason(stuck.join(",")));
                set.abort_all();
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }
}

async fn join_all(set: &mut JoinSet<()>) {
    while let Some(res) = set.join_next().await {
        if let Err(e) = res {
            if e.is_panic() {
                warn!("stage actor panicked");
            }
        }
    }
}

/// Forwards bus events to the tracker and subscriber set until `stop` fires
/// or the bus closes. Hands the set back for shutdown.
fn subscriber_listener(
    mut rx: broadcast::Receiver<Event>,
    subs: SubscriberSet,
    alive: Arc<AliveTracker>,
    stop: CancellationToken,
) -> JoinHandle<SubscriberSet> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                res = rx.recv() => match res {
                    Ok(ev) => {
                        alive.update(&ev).await;
                        subs.emit(&ev);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event listener lagged behind the bus");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = stop.cancelled() => {
                    loop {
                        match rx.try_recv() {
                            Ok(ev) => {
                                alive.update(&ev).await;
                                subs.emit(&ev);
                            }
                            Err(TryRecvError::Lagged(skipped)) => {
                                warn!(skipped, "event listener lagged behind the bus");
                            }
                            Err(_) => break,
                        }
                    }
                    break;
                }
            }
        }
        subs
    })
}
