//! # Example: fanout
//!
//! Shows how [`NonBlockingConsumer`] grows worker slots while handling is slow
//! and reuses them once it catches up. No supervisor involved: the delivery
//! task is executed directly and stopped from a timer through its monitor
//! credential.
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example fanout
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pipevisor::{
    BreakerMonitor, DeliveryTask, DoneSignal, Functional, ItemDestination, NonBlockingConsumer,
    Owner, SimpleItemSource,
};
use tracing_subscriber::EnvFilter;

/// Handler whose latency drops after the first few items.
#[derive(Clone, Default)]
struct Printer {
    handled: Arc<AtomicU32>,
}

#[async_trait]
impl ItemDestination for Printer {
    type Item = &'static str;

    async fn set_item(&self, item: &'static str) {
        let n = self.handled.fetch_add(1, Ordering::Relaxed);
        let latency = if n < 8 { 200 } else { 5 };
        tokio::time::sleep(Duration::from_millis(latency)).await;
        tracing::info!(n, item, latency_ms = latency, "handled");
    }
}

impl Functional for Printer {
    fn is_functional(&self) -> bool {
        true
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    let source = Owner::new(SimpleItemSource::new("ping"));
    let consumer = Owner::new(NonBlockingConsumer::new(Printer::default()));
    let monitor = Owner::new(BreakerMonitor::new(1));

    let (Some(src), Some(dst), Some(mon)) = (source.authorize(), consumer.authorize(), monitor.authorize())
    else {
        return;
    };
    let mut task = DeliveryTask::new(src, dst, mon, Duration::from_millis(25));

    let stopper = task.monitor_credential();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        if let Some(m) = stopper.acquire() {
            m.interrupt();
        }
    });

    let summary = task.execute().await;
    consumer.drain().await;
    tracing::info!(?summary, stats = ?consumer.stats(), "done");
}
