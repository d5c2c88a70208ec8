//! # Stage: what a supervising actor runs.
//!
//! A [`Stage`] is a long-running unit with a monitor: it can be asked whether
//! it is able to run, executed until its monitor says done, interrupted from
//! another task through an [`Interrupter`], and reset for another run.
//!
//! [`DeliveryTask`] is the stage implementation shipped with the crate.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::delivery::{
    DeliveryTask, DeliveryTaskMonitor, DoneSignal, ExecutionSummary, ItemDestination, ItemSource,
};
use crate::ownership::Credential;

/// Contract between a stage and its actor.
#[async_trait]
pub trait Stage: Send + 'static {
    /// Returns `true` if the stage could run now.
    fn is_functional(&self) -> bool;

    /// Runs until the stage's monitor is done or its collaborators are gone.
    async fn execute(&mut self) -> ExecutionSummary;

    /// Handle that stops a running `execute` at its next iteration boundary.
    fn interrupter(&self) -> Interrupter;

    /// Re-arms the stage after a trip.
    fn reset(&self);
}

/// Cloneable, thread-safe handle asking a stage to stop.
#[derive(Clone)]
pub struct Interrupter(Arc<dyn Fn() + Send + Sync>);

impl Interrupter {
    /// Wraps an arbitrary interrupt action.
    pub fn new(f: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Interrupts whatever monitor the credential still resolves to.
    ///
    /// A no-op once the monitor is gone.
    pub fn from_credential<M: DoneSignal>(monitor: Credential<M>) -> Self {
        Self::new(move || {
            if let Some(m) = monitor.acquire() {
                m.interrupt();
            }
        })
    }

    /// Requests the stage to stop.
    pub fn interrupt(&self) {
        (self.0)()
    }
}

impl fmt::Debug for Interrupter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Interrupter")
    }
}

#[async_trait]
impl<S, D, M> Stage for DeliveryTask<S, D, M>
where
    S: ItemSource,
    D: ItemDestination<Item = S::Item>,
    M: DeliveryTaskMonitor,
{
    fn is_functional(&self) -> bool {
        DeliveryTask::is_functional(self)
    }

    async fn execute(&mut self) -> ExecutionSummary {
        DeliveryTask::execute(self).await
    }

    fn interrupter(&self) -> Interrupter {
        Interrupter::from_credential(self.monitor_credential())
    }

    fn reset(&self) {
        if let Some(monitor) = self.monitor_credential().acquire() {
            monitor.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::{BreakerMonitor, EmptyItemDestination, EmptyItemSource, ExitReason};
    use crate::ownership::Owner;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn delivery_task_is_a_stage() {
        let source = Owner::new(EmptyItemSource::<u8>::default());
        let sink = Owner::new(EmptyItemDestination::<u8>::default());
        let monitor = Owner::new(BreakerMonitor::new(2));

        let mut stage: Box<dyn Stage> = Box::new(DeliveryTask::new(
            source.authorize().unwrap(),
            sink.authorize().unwrap(),
            monitor.authorize().unwrap(),
            Duration::from_millis(5),
        ));
        assert!(stage.is_functional());

        let first = stage.execute().await;
        assert_eq!(first.exit, ExitReason::Done);
        assert_eq!(first.failures, 2);

        stage.reset();
        assert!(!monitor.is_done());

        stage.interrupter().interrupt();
        assert_eq!(stage.execute().await.iterations, 0);
    }

    #[test]
    fn interrupter_outliving_monitor_is_harmless() {
        let monitor = Owner::new(BreakerMonitor::default());
        let interrupter = Interrupter::from_credential(monitor.authorize().unwrap());
        drop(monitor);
        interrupter.clone().interrupt();
    }
}
