use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use pipevisor::{
    BackoffPolicy, BreakerMonitor, Config, DeliveryTask, Event, EventKind, ExitReason, Functional,
    ItemDestination, ItemSource, NonBlockingConsumer, Owner, RestartPolicy, StageSpec, Supervisor,
};
use tokio::sync::broadcast;
use tokio::time::Instant;

/// Replays a script of pull outcomes, then produces nothing.
struct Script {
    outcomes: Mutex<VecDeque<Option<u32>>>,
    pulls: AtomicU64,
}

impl Script {
    fn new(outcomes: impl IntoIterator<Item = Option<u32>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            pulls: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl ItemSource for Script {
    type Item = u32;

    async fn get_item(&self) -> Option<u32> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        self.outcomes.lock().pop_front().flatten()
    }
}

/// Endless source of increasing numbers.
#[derive(Default)]
struct Counter {
    pulls: AtomicU64,
}

#[async_trait]
impl ItemSource for Counter {
    type Item = u32;

    async fn get_item(&self) -> Option<u32> {
        Some(self.pulls.fetch_add(1, Ordering::SeqCst) as u32)
    }
}

#[derive(Clone, Default)]
struct Collector {
    items: Arc<Mutex<Vec<u32>>>,
}

#[async_trait]
impl ItemDestination for Collector {
    type Item = u32;

    async fn set_item(&self, item: u32) {
        tokio::time::sleep(Duration::from_millis(3)).await;
        self.items.lock().push(item);
    }
}

impl Functional for Collector {
    fn is_functional(&self) -> bool {
        true
    }
}

/// Never produces; stamps every pull.
#[derive(Default)]
struct Stamped {
    at: Mutex<Vec<Instant>>,
}

#[async_trait]
impl ItemSource for Stamped {
    type Item = u32;

    async fn get_item(&self) -> Option<u32> {
        self.at.lock().push(Instant::now());
        None
    }
}

fn collect(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

fn count(events: &[Event], kind: EventKind) -> usize {
    events.iter().filter(|e| e.kind == kind).count()
}

#[tokio::test(start_paused = true)]
async fn tripped_stage_is_restarted_then_exhausted() {
    let cfg = Config {
        failure_threshold: 2,
        restart: RestartPolicy::OnTripLimited { max_restarts: 1 },
        backoff: BackoffPolicy::constant(Duration::from_millis(10)),
        min_interval: Duration::from_millis(5),
        ..Config::default()
    };

    let collector = Collector::default();
    let items = collector.items.clone();
    let source = Owner::new(Script::new([Some(1), Some(2), None, None, Some(3), None, None]));
    let consumer = Owner::new(NonBlockingConsumer::new(collector));
    let monitor = Owner::new(BreakerMonitor::from_config(&cfg.monitor()));

    let task = DeliveryTask::new(
        source.authorize().unwrap(),
        consumer.authorize().unwrap(),
        monitor.authorize().unwrap(),
        cfg.min_interval,
    );

    let sup = Supervisor::new(cfg.clone(), Vec::new());
    let mut rx = sup.bus.subscribe();
    sup.run_until(
        vec![StageSpec::with_defaults("script", task, &cfg)],
        std::future::pending(),
    )
    .await
    .unwrap();
    consumer.drain().await;

    let mut delivered = items.lock().clone();
    delivered.sort_unstable();
    assert_eq!(delivered, vec![1, 2, 3]);
    assert_eq!(source.pulls.load(Ordering::SeqCst), 7);

    let events = collect(&mut rx);
    assert_eq!(count(&events, EventKind::StageStarting), 2);
    assert_eq!(count(&events, EventKind::StageStopped), 2);
    assert_eq!(count(&events, EventKind::RestartScheduled), 1);
    let last = events.last().unwrap();
    assert_eq!(last.kind, EventKind::StageExhausted);
    assert_eq!(last.reason.as_deref(), Some("restart policy exhausted"));
    assert!(
        events
            .iter()
            .filter_map(Event::exit)
            .all(|exit| exit == ExitReason::Done)
    );
}

#[tokio::test(start_paused = true)]
async fn breaker_gates_the_pull_after_tripping() {
    let source = Owner::new(Script::new([None, None, None]));
    let sink = Owner::new(Collector::default());
    let monitor = Owner::new(BreakerMonitor::new(2));

    let mut task = DeliveryTask::new(
        source.authorize().unwrap(),
        sink.authorize().unwrap(),
        monitor.authorize().unwrap(),
        Duration::from_millis(20),
    );
    let summary = task.execute().await;

    assert_eq!(summary.exit, ExitReason::Done);
    assert_eq!(source.pulls.load(Ordering::SeqCst), 2);
    assert!(sink.items.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn tearing_down_a_collaborator_ends_the_stage() {
    let cfg = Config {
        restart: RestartPolicy::OnTrip,
        ..Config::default()
    };
    let source = Owner::new(Counter::default());
    let sink = Owner::new(Collector::default());
    let items = sink.items.clone();
    let monitor = Owner::new(BreakerMonitor::default());

    let task = DeliveryTask::new(
        source.authorize().unwrap(),
        sink.authorize().unwrap(),
        monitor.authorize().unwrap(),
        Duration::from_millis(10),
    );

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(105)).await;
        drop(sink);
    });

    let sup = Supervisor::new(cfg.clone(), Vec::new());
    let mut rx = sup.bus.subscribe();
    sup.run_until(
        vec![StageSpec::with_defaults("counter", task, &cfg)],
        std::future::pending(),
    )
    .await
    .unwrap();

    let events = collect(&mut rx);
    let stopped = events
        .iter()
        .find(|e| e.kind == EventKind::StageStopped)
        .unwrap();
    assert_eq!(stopped.exit(), Some(ExitReason::CollaboratorLost));
    assert_eq!(events.last().unwrap().reason.as_deref(), Some("collaborator lost"));

    let summary = stopped.summary.unwrap();
    assert_eq!(summary.delivered, items.lock().len() as u64);
    assert_eq!(summary.delivered, source.pulls.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn shutdown_lets_the_current_iteration_finish() {
    let cfg = Config {
        grace: Duration::from_secs(1),
        ..Config::default()
    };
    let source = Owner::new(Counter::default());
    let sink = Owner::new(Collector::default());
    let monitor = Owner::new(BreakerMonitor::default());

    let task = DeliveryTask::new(
        source.authorize().unwrap(),
        sink.authorize().unwrap(),
        monitor.authorize().unwrap(),
        Duration::from_millis(1),
    );

    let sup = Supervisor::new(cfg.clone(), Vec::new());
    let mut rx = sup.bus.subscribe();
    let stop = tokio::time::sleep(Duration::from_millis(200));
    sup.run_until(vec![StageSpec::with_defaults("counter", task, &cfg)], stop)
        .await
        .unwrap();

    let pulled = source.pulls.load(Ordering::SeqCst);
    assert!(pulled > 0);
    assert_eq!(sink.items.lock().len() as u64, pulled);

    let events = collect(&mut rx);
    assert!(events.iter().any(|e| e.kind == EventKind::ShutdownRequested));
    assert_eq!(events.last().map(|e| e.kind), Some(EventKind::AllStoppedWithin));
    assert_eq!(count(&events, EventKind::StageStopped), 1);
    assert_eq!(count(&events, EventKind::RestartScheduled), 0);
}

#[tokio::test(start_paused = true)]
async fn dead_collaborator_at_start_is_reported_unavailable() {
    let cfg = Config::default();
    let source = Owner::new(Counter::default());
    let sink = Owner::new(Collector::default());
    let monitor = Owner::new(BreakerMonitor::default());

    let task = DeliveryTask::new(
        source.authorize().unwrap(),
        sink.authorize().unwrap(),
        monitor.authorize().unwrap(),
        Duration::from_millis(1),
    );
    drop(monitor);

    let sup = Supervisor::new(cfg.clone(), Vec::new());
    let mut rx = sup.bus.subscribe();
    sup.run_until(
        vec![StageSpec::with_defaults("orphan", task, &cfg)],
        std::future::pending(),
    )
    .await
    .unwrap();

    let events = collect(&mut rx);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::StageUnavailable);
    assert_eq!(source.pulls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn restart_does_not_bypass_the_interval() {
    let interval = Duration::from_millis(100);
    let cfg = Config {
        failure_threshold: 1,
        restart: RestartPolicy::OnTripLimited { max_restarts: 3 },
        backoff: BackoffPolicy::constant(Duration::from_millis(10)),
        min_interval: interval,
        ..Config::default()
    };
    let source = Owner::new(Stamped::default());
    let sink = Owner::new(Collector::default());
    let monitor = Owner::new(BreakerMonitor::from_config(&cfg.monitor()));

    let task = DeliveryTask::new(
        source.authorize().unwrap(),
        sink.authorize().unwrap(),
        monitor.authorize().unwrap(),
        cfg.min_interval,
    );

    let sup = Supervisor::new(cfg.clone(), Vec::new());
    sup.run_until(
        vec![StageSpec::with_defaults("stamped", task, &cfg)],
        std::future::pending(),
    )
    .await
    .unwrap();

    let at = source.at.lock();
    assert_eq!(at.len(), 4);
    for pair in at.windows(2) {
        assert!(pair[1] - pair[0] >= interval, "gap {:?}", pair[1] - pair[0]);
    }
}
