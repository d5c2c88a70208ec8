//! # Example: pipeline
//!
//! A flaky sensor feeds a fan-out consumer under supervision. The sensor drops
//! out every so often; after `failure_threshold` empty reads in a row the
//! breaker trips, the actor backs off, resets the monitor and runs the stage
//! again.
//!
//! ## Flow
//! ```text
//! StageActor::run()
//!   ├─► publish(StageStarting, attempt=1)
//!   ├─► DeliveryTask::execute()
//!   │     ├─ Sensor::get_item() → Some(reading) ─► NonBlockingConsumer::dispatch()
//!   │     └─ Sensor::get_item() → None ×3       ─► breaker trips
//!   ├─► publish(StageStopped{exit=done})
//!   ├─► publish(RestartScheduled{delay=200ms})
//!   ├─► sleep(delay), reset monitor
//!   └─► attempt=2 ...
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example pipeline --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pipevisor::{
    BackoffPolicy, BreakerMonitor, Config, DeliveryTask, Functional, ItemDestination, ItemSource,
    JitterPolicy, LogWriter, NonBlockingConsumer, Owner, RestartPolicy, StageSpec, Subscribe,
    Supervisor,
};
use tracing_subscriber::EnvFilter;

/// Sensor that goes quiet for a few reads on every tenth tick.
#[derive(Default)]
struct Sensor {
    tick: AtomicU64,
}

#[async_trait]
impl ItemSource for Sensor {
    type Item = u64;

    async fn get_item(&self) -> Option<u64> {
        let n = self.tick.fetch_add(1, Ordering::Relaxed);
        (n % 10 < 7).then_some(n * 3)
    }
}

/// Slow consumer; each clone handles one reading.
#[derive(Clone, Default)]
struct Archive {
    stored: Arc<AtomicU64>,
}

#[async_trait]
impl ItemDestination for Archive {
    type Item = u64;

    async fn set_item(&self, reading: u64) {
        tokio::time::sleep(Duration::from_millis(120)).await;
        self.stored.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(reading, "archived");
    }
}

impl Functional for Archive {
    fn is_functional(&self) -> bool {
        true
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut cfg = Config::default();
    cfg.grace = Duration::from_secs(2);
    cfg.min_interval = Duration::from_millis(50);
    cfg.failure_threshold = 3;
    cfg.restart = RestartPolicy::OnTripLimited { max_restarts: 5 };
    cfg.backoff = BackoffPolicy {
        first: Duration::from_millis(200),
        max: Duration::from_secs(2),
        factor: 2.0,
        jitter: JitterPolicy::Equal,
    };

    let archive = Archive::default();
    let stored = archive.stored.clone();

    let sensor = Owner::new(Sensor::default());
    let consumer = Owner::new(NonBlockingConsumer::new(archive));
    let monitor = Owner::new(BreakerMonitor::from_config(&cfg.monitor()));

    let mut task = DeliveryTask::default();
    {
        let wiring = task.configure();
        *wiring.actors.source = sensor.authorize().ok_or("sensor")?;
        *wiring.actors.destination = consumer.authorize().ok_or("consumer")?;
        *wiring.actors.monitor = monitor.authorize().ok_or("monitor")?;
        *wiring.options.min_interval = cfg.min_interval;
    }

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let sup = Supervisor::new(cfg.clone(), subs);

    let stages = vec![StageSpec::with_defaults("sensor", task, &cfg)];
    let stop = async {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = tokio::time::sleep(Duration::from_secs(5)) => {},
        }
    };
    sup.run_until(stages, stop).await?;

    let drained = consumer.drain().await;
    tracing::info!(
        drained,
        stored = stored.load(Ordering::Relaxed),
        stats = ?consumer.stats(),
        "pipeline finished"
    );
    Ok(())
}
