//! # NonBlockingConsumer: fire-and-forget fan-out destination.
//!
//! [`NonBlockingConsumer`] is an [`ItemDestination`] that never waits on the
//! handling of an item. Each item is handed to a fresh clone of a prototype
//! destination running on its own tokio task, so a slow consumer does not slow
//! the delivery loop that feeds it.
//!
//! ## Slots
//! ```text
//! dispatch(item)
//!   ├─► scan slots, claim the first idle one (busy: false → true)
//!   │      └─ none idle ─► push a new slot (busy = true)
//!   ├─► clone prototype
//!   └─► tokio::spawn {
//!          clone.set_item(item)   (panic caught)
//!          busy = false
//!       }
//! ```
//!
//! ## Rules
//! - `dispatch` returns as soon as the worker is spawned;
//! - a slot is reused only when idle, so at most one worker runs per slot;
//! - the pool keeps every slot it ever created and has no upper bound; under a
//!   sustained overload it grows with the backlog (watch [`FanoutStats::slots`]);
//! - a panicking worker is counted and logged, and its slot returns to idle;
//! - each worker owns its own clone, so the destination type needs no locking
//!   of its own beyond what its clones share.
//!
//! Must be used from within a tokio runtime.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::item::ItemDestination;
use super::signal::Functional;

/// Point-in-time counters of a [`NonBlockingConsumer`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FanoutStats {
    /// Slots ever created.
    pub slots: usize,
    /// Slots currently running a worker.
    pub busy: usize,
    /// Items handed to a worker.
    pub dispatched: u64,
    /// Workers that finished normally.
    pub completed: u64,
    /// Workers that panicked.
    pub panicked: u64,
}

struct Slot {
    busy: AtomicBool,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Slot {
    fn claimed() -> Self {
        Self {
            busy: AtomicBool::new(true),
            handle: Mutex::new(None),
        }
    }

    fn try_claim(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

#[derive(Default)]
struct Counters {
    dispatched: AtomicU64,
    completed: AtomicU64,
    panicked: AtomicU64,
}

/// Destination that hands every item to a clone of `C` on its own task.
pub struct NonBlockingConsumer<C> {
    prototype: C,
    slots: Mutex<Vec<Arc<Slot>>>,
    counters: Arc<Counters>,
}

impl<C: Default> Default for NonBlockingConsumer<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<C> NonBlockingConsumer<C> {
    /// Creates a consumer around a prototype destination.
    pub fn new(prototype: C) -> Self {
        Self {
            prototype,
            slots: Mutex::new(Vec::new()),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Mutable access to the prototype. Later dispatches clone the updated value.
    pub fn configure(&mut self) -> &mut C {
        &mut self.prototype
    }

    /// Current counters.
    pub fn stats(&self) -> FanoutStats {
        let slots = self.slots.lock();
        FanoutStats {
            slots: slots.len(),
            busy: slots
                .iter()
                .filter(|s| s.busy.load(Ordering::Acquire))
                .count(),
            dispatched: self.counters.dispatched.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            panicked: self.counters.panicked.load(Ordering::Relaxed),
        }
    }

    /// Waits for every in-flight worker and returns how many were awaited.
    ///
    /// Items dispatched while draining may or may not be included.
    pub async fn drain(&self) -> usize {
        let handles: Vec<JoinHandle<()>> = {
            let slots = self.slots.lock();
            slots.iter().filter_map(|s| s.handle.lock().take()).collect()
        };

        let mut awaited = 0;
        for handle in handles {
            // Workers catch their own panics; a join error means the runtime
            // is shutting the task down.
            let _ = handle.await;
            awaited += 1;
        }
        awaited
    }

    fn claim_slot(&self) -> Arc<Slot> {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.iter().find(|s| s.try_claim()) {
            return Arc::clone(slot);
        }

        let slot = Arc::new(Slot::claimed());
        slots.push(Arc::clone(&slot));
        debug!(slots = slots.len(), "fan-out grew a worker slot");
        slot
    }
}

impl<C> NonBlockingConsumer<C>
where
    C: ItemDestination + Clone,
{
    /// Hands `item` to a new worker and returns without waiting for it.
    pub fn dispatch(&self, item: C::Item) {
        let slot = self.claim_slot();
        let worker = self.prototype.clone();
        let counters = Arc::clone(&self.counters);
        let release = Arc::clone(&slot);

        counters.dispatched.fetch_add(1, Ordering::Relaxed);

        let mut handle = slot.handle.lock();
        *handle = Some(tokio::spawn(async move {
            match AssertUnwindSafe(worker.set_item(item)).catch_unwind().await {
                Ok(()) => {
                    counters.completed.fetch_add(1, Ordering::Relaxed);
                }
                Err(payload) => {
                    counters.panicked.fetch_add(1, Ordering::Relaxed);
                    warn!(panic = %panic_message(payload.as_ref()), "fan-out worker panicked");
                }
            }
            release.busy.store(false, Ordering::Release);
        }));
    }
}

impl<C: Functional> Functional for NonBlockingConsumer<C> {
    fn is_functional(&self) -> bool {
        self.prototype.is_functional()
    }
}

#[async_trait]
impl<C> ItemDestination for NonBlockingConsumer<C>
where
    C: ItemDestination + Functional + Clone,
{
    type Item = C::Item;

    async fn set_item(&self, item: C::Item) {
        self.dispatch(item);
    }
}

impl<C> fmt::Debug for NonBlockingConsumer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonBlockingConsumer")
            .field("stats", &self.stats())
            .finish()
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
