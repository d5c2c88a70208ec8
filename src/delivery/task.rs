//! # DeliveryTask: the generic pull → push loop.
//!
//! A [`DeliveryTask`] repeatedly pulls one item from its source and pushes it to
//! its destination, paced by an [`IntervalSleeper`] and stopped by its monitor.
//! The three collaborators are held as [`Credential`]s only; the task never keeps
//! any of them alive between iterations.
//!
//! ## Iteration
//! ```text
//! execute()
//!   ├─► acquire(source, destination, monitor) ── any gone ─► return Unavailable
//!   loop {
//!     ├─► monitor.is_done()? ───────────────────── yes ─► return Done
//!     ├─► sleeper.sleep()            (>= min_interval since previous iteration)
//!     ├─► source.get_item()
//!     │      ├─ Some(item) ─► destination.set_item(item) ─► monitor.success()
//!     │      └─ None       ─► monitor.error()             (no push)
//!     └─► release users, re-acquire all three ── any gone ─► return CollaboratorLost
//!   }
//! ```
//!
//! ## Rules
//! - iterations are strictly sequential: push and notify of iteration N finish
//!   before the pull of N+1 starts;
//! - exactly one monitor notification per iteration, matching the pull outcome;
//! - the done flag is read only at iteration boundaries, so no item is ever
//!   half-delivered after done is observed;
//! - users acquired at a boundary are held for the whole iteration, so a
//!   collaborator torn down mid-iteration finishes that iteration and the task
//!   exits at the next boundary;
//! - cancellation is cooperative only. A pull that never completes keeps the
//!   task from observing an interrupt.

use std::fmt;
use std::time::Duration;

use tracing::{debug, trace};

use super::item::{ItemDestination, ItemSource};
use super::monitor::DeliveryTaskMonitor;
use crate::ownership::{Credential, User};
use crate::policies::IntervalSleeper;
use crate::validate_all;

/// Why [`DeliveryTask::execute`] returned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExitReason {
    /// A collaborator was gone when the run began; no iteration happened.
    #[default]
    Unavailable,
    /// The monitor signalled done.
    Done,
    /// A collaborator went away between two iterations.
    CollaboratorLost,
}

impl ExitReason {
    /// Returns a short stable label (snake_case) for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ExitReason::Unavailable => "unavailable",
            ExitReason::Done => "done",
            ExitReason::CollaboratorLost => "collaborator_lost",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Counters of one [`DeliveryTask::execute`] run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    /// Iterations started (each one pulled exactly once).
    pub iterations: u64,
    /// Items pushed to the destination.
    pub delivered: u64,
    /// Pulls that produced nothing.
    pub failures: u64,
    /// Why the run ended.
    pub exit: ExitReason,
}

/// Collaborator credentials exposed by [`DeliveryTask::configure`].
pub struct Actors<'a, S, D, M> {
    pub source: &'a mut Credential<S>,
    pub destination: &'a mut Credential<D>,
    pub monitor: &'a mut Credential<M>,
}

/// Tunables exposed by [`DeliveryTask::configure`].
pub struct Options<'a> {
    /// Minimum interval between the starts of consecutive iterations.
    pub min_interval: &'a mut Duration,
}

/// Mutable wiring view of a [`DeliveryTask`].
///
/// Borrowing the task exclusively, it cannot coexist with a running `execute`.
pub struct Configuration<'a, S, D, M> {
    pub actors: Actors<'a, S, D, M>,
    pub options: Options<'a>,
}

/// Users held for the duration of one iteration.
struct Resolved<S, D, M> {
    source: User<S>,
    destination: User<D>,
    monitor: User<M>,
}

/// Generic rate-limited delivery loop over a source, a destination and a monitor.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use pipevisor::{
///     BreakerMonitor, DeliveryTask, EmptyItemDestination, ExitReason, Owner, SimpleItemSource,
/// };
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let source = Owner::new(SimpleItemSource::new(7_u32));
/// let sink = Owner::new(EmptyItemDestination::<u32>::default());
/// let monitor = Owner::new(BreakerMonitor::new(3));
///
/// let mut task = DeliveryTask::default();
/// {
///     let cfg = task.configure();
///     *cfg.actors.source = source.authorize().unwrap();
///     *cfg.actors.destination = sink.authorize().unwrap();
///     *cfg.actors.monitor = monitor.authorize().unwrap();
///     *cfg.options.min_interval = Duration::from_millis(1);
/// }
/// assert!(task.is_functional());
///
/// drop(sink);
/// let summary = task.execute().await;
/// assert_eq!(summary.exit, ExitReason::Unavailable);
/// assert_eq!(summary.iterations, 0);
/// # }
/// ```
pub struct DeliveryTask<S, D, M> {
    source: Credential<S>,
    destination: Credential<D>,
    monitor: Credential<M>,
    sleeper: IntervalSleeper,
}

impl<S, D, M> Default for DeliveryTask<S, D, M> {
    fn default() -> Self {
        Self {
            source: Credential::default(),
            destination: Credential::default(),
            monitor: Credential::default(),
            sleeper: IntervalSleeper::default(),
        }
    }
}

impl<S, D, M> DeliveryTask<S, D, M>
where
    S: ItemSource,
    D: ItemDestination<Item = S::Item>,
    M: DeliveryTaskMonitor,
{
    /// Creates a fully wired task.
    pub fn new(
        source: Credential<S>,
        destination: Credential<D>,
        monitor: Credential<M>,
        min_interval: Duration,
    ) -> Self {
        Self {
            source,
            destination,
            monitor,
            sleeper: IntervalSleeper::new(min_interval),
        }
    }

    /// Pre-run mutable view for wiring collaborators and options.
    pub fn configure(&mut self) -> Configuration<'_, S, D, M> {
        Configuration {
            actors: Actors {
                source: &mut self.source,
                destination: &mut self.destination,
                monitor: &mut self.monitor,
            },
            options: Options {
                min_interval: &mut self.sleeper.interval,
            },
        }
    }

    /// Returns `true` if all three collaborators currently resolve.
    ///
    /// Advisory: a collaborator may go away before the next `execute`.
    pub fn is_functional(&self) -> bool {
        validate_all!(self.source, self.destination, self.monitor)
    }

    /// Clone of the monitor credential, for interrupting or resetting from outside.
    pub fn monitor_credential(&self) -> Credential<M> {
        self.monitor.clone()
    }

    /// Configured minimum interval between iterations.
    pub fn min_interval(&self) -> Duration {
        self.sleeper.interval
    }

    /// Runs the loop until the monitor is done or a collaborator disappears.
    ///
    /// Pacing carries over between calls: the first pull of a rerun still
    /// waits out `min_interval` since the previous run's last pull.
    ///
    /// Never fails: a dead collaborator at start is a no-op run, and all pull
    /// failures go to the monitor.
    pub async fn execute(&mut self) -> ExecutionSummary {
        let mut summary = ExecutionSummary::default();

        let Some(mut actors) = self.resolve() else {
            debug!("delivery task has an unavailable collaborator; not starting");
            return summary;
        };

        loop {
            if actors.monitor.is_done() {
                summary.exit = ExitReason::Done;
                break;
            }

            self.sleeper.sleep().await;
            summary.iterations += 1;

            match actors.source.get_item().await {
                Some(item) => {
                    actors.destination.set_item(item).await;
                    actors.monitor.handle_item_source_success();
                    summary.delivered += 1;
                }
                None => {
                    actors.monitor.handle_item_source_error();
                    summary.failures += 1;
                    trace!(iteration = summary.iterations, "source produced no item");
                }
            }

            drop(actors);
            actors = match self.resolve() {
                Some(next) => next,
                None => {
                    summary.exit = ExitReason::CollaboratorLost;
                    break;
                }
            };
        }

        debug!(
            iterations = summary.iterations,
            delivered = summary.delivered,
            failures = summary.failures,
            exit = %summary.exit,
            "delivery task finished"
        );
        summary
    }

    fn resolve(&self) -> Option<Resolved<S, D, M>> {
        Some(Resolved {
            source: self.source.acquire()?,
            destination: self.destination.acquire()?,
            monitor: self.monitor.acquire()?,
        })
    }
}

impl<S, D, M> fmt::Debug for DeliveryTask<S, D, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use crate::ownership::Validate;

        f.debug_struct("DeliveryTask")
            .field("source", &self.source.is_valid())
            .field("destination", &self.destination.is_valid())
            .field("monitor", &self.monitor.is_valid())
            .field("min_interval", &self.sleeper.interval)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::monitor::BreakerMonitor;
    use crate::delivery::signal::DoneSignal;
    use crate::ownership::Owner;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::time::Instant;

    /// Replays a script of outcomes, then produces nothing.
    #[derive(Default)]
    struct ScriptedSource {
        script: Mutex<VecDeque<Option<u32>>>,
        pulls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(script: impl IntoIterator<Item = Option<u32>>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                pulls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ItemSource for ScriptedSource {
        type Item = u32;

        async fn get_item(&self) -> Option<u32> {
            self.pulls.fetch_add(1, Ordering::SeqCst);
            self.script.lock().pop_front().flatten()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        items: Mutex<Vec<u32>>,
    }

    #[async_trait]
    impl ItemDestination for RecordingSink {
        type Item = u32;

        async fn set_item(&self, item: u32) {
            self.items.lock().push(item);
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Note {
        Success,
        Error,
    }

    /// Records notifications and stops after a fixed number of them.
    struct RecordingMonitor {
        done: AtomicBool,
        notes: Mutex<Vec<Note>>,
        stop_after: usize,
    }

    impl RecordingMonitor {
        fn stopping_after(stop_after: usize) -> Self {
            Self {
                done: AtomicBool::new(false),
                notes: Mutex::new(Vec::new()),
                stop_after,
            }
        }

        fn note(&self, note: Note) {
            let mut notes = self.notes.lock();
            notes.push(note);
            if notes.len() >= self.stop_after {
                self.interrupt();
            }
        }
    }

    impl DoneSignal for RecordingMonitor {
        fn is_done(&self) -> bool {
            self.done.load(Ordering::SeqCst)
        }
        fn interrupt(&self) {
            self.done.store(true, Ordering::SeqCst);
        }
        fn reset(&self) {
            self.done.store(false, Ordering::SeqCst);
        }
    }

    impl DeliveryTaskMonitor for RecordingMonitor {
        fn handle_item_source_error(&self) {
            self.note(Note::Error);
        }
        fn handle_item_source_success(&self) {
            self.note(Note::Success);
        }
    }

    fn wire<M: DeliveryTaskMonitor>(
        source: &Owner<ScriptedSource>,
        sink: &Owner<RecordingSink>,
        monitor: &Owner<M>,
        interval: Duration,
    ) -> DeliveryTask<ScriptedSource, RecordingSink, M> {
        let mut task = DeliveryTask::default();
        let cfg = task.configure();
        *cfg.actors.source = source.authorize().unwrap();
        *cfg.actors.destination = sink.authorize().unwrap();
        *cfg.actors.monitor = monitor.authorize().unwrap();
        *cfg.options.min_interval = interval;
        task
    }

    #[tokio::test(start_paused = true)]
    async fn destination_receives_exactly_the_produced_items_in_order() {
        let script = [Some(1), None, Some(2), Some(3), None, None, Some(4)];
        let source = Owner::new(ScriptedSource::new(script));
        let sink = Owner::new(RecordingSink::default());
        let monitor = Owner::new(RecordingMonitor::stopping_after(script.len()));

        let mut task = wire(&source, &sink, &monitor, Duration::from_millis(1));
        let summary = task.execute().await;

        assert_eq!(*sink.items.lock(), vec![1, 2, 3, 4]);
        let expected: Vec<Note> = script
            .iter()
            .map(|o| if o.is_some() { Note::Success } else { Note::Error })
            .collect();
        assert_eq!(*monitor.notes.lock(), expected);
        assert_eq!(
            summary,
            ExecutionSummary {
                iterations: 7,
                delivered: 4,
                failures: 3,
                exit: ExitReason::Done,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn dead_collaborator_at_start_is_a_no_op() {
        let source = Owner::new(ScriptedSource::new([Some(1)]));
        let sink = Owner::new(RecordingSink::default());
        let monitor = Owner::new(RecordingMonitor::stopping_after(1));
        let mut task = wire(&source, &sink, &monitor, Duration::ZERO);

        drop(sink);
        assert!(!task.is_functional());
        let summary = task.execute().await;

        assert_eq!(summary, ExecutionSummary::default());
        assert_eq!(source.pulls.load(Ordering::SeqCst), 0);
        assert!(monitor.notes.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unwired_task_is_not_functional() {
        let mut task: DeliveryTask<ScriptedSource, RecordingSink, BreakerMonitor> =
            DeliveryTask::default();
        assert!(!task.is_functional());
        assert_eq!(task.execute().await.exit, ExitReason::Unavailable);
    }

    #[tokio::test(start_paused = true)]
    async fn breaker_stops_before_third_pull() {
        let source = Owner::new(ScriptedSource::new([None, None, None]));
        let sink = Owner::new(RecordingSink::default());
        let monitor = Owner::new(BreakerMonitor::new(2));

        let mut task = wire(&source, &sink, &monitor, Duration::from_millis(10));
        let summary = task.execute().await;

        assert_eq!(summary.exit, ExitReason::Done);
        assert_eq!(summary.iterations, 2);
        assert_eq!(source.pulls.load(Ordering::SeqCst), 2);
        assert!(sink.items.lock().is_empty());
        assert!(monitor.is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn already_done_monitor_runs_zero_iterations() {
        let source = Owner::new(ScriptedSource::new([Some(1)]));
        let sink = Owner::new(RecordingSink::default());
        let monitor = Owner::new(BreakerMonitor::new(2));
        monitor.interrupt();

        let mut task = wire(&source, &sink, &monitor, Duration::ZERO);
        let summary = task.execute().await;
        assert_eq!(summary.exit, ExitReason::Done);
        assert_eq!(summary.iterations, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fast_failures_are_still_rate_limited() {
        let source = Owner::new(ScriptedSource::new(std::iter::repeat_n(None, 5)));
        let sink = Owner::new(RecordingSink::default());
        let monitor = Owner::new(BreakerMonitor::new(5));

        let mut task = wire(&source, &sink, &monitor, Duration::from_millis(100));
        let start = Instant::now();
        let summary = task.execute().await;

        assert_eq!(summary.iterations, 5);
        assert!(start.elapsed() >= Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_allows_a_second_run() {
        let source = Owner::new(ScriptedSource::new([None, None, Some(9), None, None]));
        let sink = Owner::new(RecordingSink::default());
        let monitor = Owner::new(BreakerMonitor::new(2));
        let mut task = wire(&source, &sink, &monitor, Duration::ZERO);

        assert_eq!(task.execute().await.iterations, 2);
        monitor.reset();
        let second = task.execute().await;
        assert_eq!(second.iterations, 3);
        assert_eq!(second.delivered, 1);
        assert_eq!(*sink.items.lock(), vec![9]);
    }

    /// Source that stamps every pull and never produces.
    #[derive(Default)]
    struct StampedSource {
        stamps: Mutex<Vec<Instant>>,
    }

    #[async_trait]
    impl ItemSource for StampedSource {
        type Item = u32;

        async fn get_item(&self) -> Option<u32> {
            self.stamps.lock().push(Instant::now());
            None
        }
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_carries_over_across_reset_and_rerun() {
        let interval = Duration::from_millis(100);
        let source = Owner::new(StampedSource::default());
        let sink = Owner::new(RecordingSink::default());
        let monitor = Owner::new(BreakerMonitor::new(1));
        let mut task = DeliveryTask::new(
            source.authorize().unwrap(),
            sink.authorize().unwrap(),
            monitor.authorize().unwrap(),
            interval,
        );

        for _ in 0..3 {
            assert_eq!(task.execute().await.iterations, 1);
            monitor.reset();
        }

        let stamps = source.stamps.lock();
        assert_eq!(stamps.len(), 3);
        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= interval, "gap {:?}", pair[1] - pair[0]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn success_after_short_streak_keeps_the_loop_running() {
        let script = [None, Some(1), None, Some(2), None, Some(3)];
        let source = Owner::new(ScriptedSource::new(script));
        let sink = Owner::new(RecordingSink::default());
        let monitor = Owner::new(BreakerMonitor::new(2));

        let mut task = wire(&source, &sink, &monitor, Duration::from_millis(1));
        let summary = task.execute().await;

        // Only the two empty pulls after the script runs out trip the breaker.
        assert_eq!(summary.exit, ExitReason::Done);
        assert_eq!(summary.iterations, script.len() as u64 + 2);
        assert_eq!(summary.failures, 5);
        assert_eq!(source.pulls.load(Ordering::SeqCst), script.len() + 2);
        assert_eq!(*sink.items.lock(), vec![1, 2, 3]);
    }

    /// Sink whose log outlives the sink itself.
    struct SharedSink {
        log: Arc<Mutex<Vec<u32>>>,
    }

    #[async_trait]
    impl ItemDestination for SharedSink {
        type Item = u32;

        async fn set_item(&self, item: u32) {
            self.log.lock().push(item);
        }
    }

    /// Source that drops the sink's owner on the first pull.
    struct SelfDestructing {
        owner_slot: Mutex<Option<Owner<SharedSink>>>,
    }

    #[async_trait]
    impl ItemSource for SelfDestructing {
        type Item = u32;

        async fn get_item(&self) -> Option<u32> {
            drop(self.owner_slot.lock().take());
            Some(5)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn collaborator_torn_down_mid_iteration_finishes_that_iteration() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Owner::new(SharedSink { log: log.clone() });
        let sink_credential = sink.authorize().unwrap();

        let source = Owner::new(SelfDestructing {
            owner_slot: Mutex::new(Some(sink)),
        });
        let monitor = Owner::new(BreakerMonitor::new(10));

        let mut task = DeliveryTask::new(
            source.authorize().unwrap(),
            sink_credential,
            monitor.authorize().unwrap(),
            Duration::ZERO,
        );
        let summary = task.execute().await;

        assert_eq!(summary.exit, ExitReason::CollaboratorLost);
        assert_eq!(summary.delivered, 1);
        assert!(!task.is_functional());
        assert_eq!(*log.lock(), vec![5]);
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_from_another_task_stops_the_loop() {
        let source = Owner::new(ScriptedSource::new(std::iter::repeat_n(Some(1), 10_000)));
        let sink = Owner::new(RecordingSink::default());
        let monitor = Owner::new(BreakerMonitor::new(3));
        let mut task = wire(&source, &sink, &monitor, Duration::from_millis(10));

        let credential = task.monitor_credential();
        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(95)).await;
            if let Some(m) = credential.acquire() {
                m.interrupt();
            }
        });

        let summary = task.execute().await;
        stopper.await.unwrap();
        assert_eq!(summary.exit, ExitReason::Done);
        assert_eq!(summary.iterations, sink.items.lock().len() as u64);
        assert!(summary.iterations <= 11);
    }

    #[test]
    fn configure_exposes_interval() {
        let mut task: DeliveryTask<ScriptedSource, RecordingSink, BreakerMonitor> =
            DeliveryTask::default();
        *task.configure().options.min_interval = Duration::from_millis(42);
        assert_eq!(task.min_interval(), Duration::from_millis(42));
    }

    #[test]
    fn debug_reports_wiring() {
        let monitor = Owner::new(BreakerMonitor::default());
        let mut task: DeliveryTask<ScriptedSource, RecordingSink, BreakerMonitor> =
            DeliveryTask::default();
        *task.configure().actors.monitor = monitor.authorize().unwrap();
        let shown = format!("{task:?}");
        assert!(shown.contains("monitor: true"));
        assert!(shown.contains("source: false"));
    }
}
