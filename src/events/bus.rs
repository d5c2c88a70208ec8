//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`] so stage actors, the supervisor and
//! subscriber workers can publish without blocking.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                 Listener (one):
//!   StageActor 1 ──┐
//!   StageActor 2 ──┼──► Bus ──► Supervisor listener ──► SubscriberSet
//!   Supervisor   ──┤  (broadcast)
//!   Sub workers  ──┘
//! ```
//!
//! ## Rules
//! - `publish()` never blocks;
//! - one ring buffer of `capacity` events is shared by all receivers;
//! - a receiver that falls behind observes `RecvError::Lagged(n)` and skips `n` events;
//! - events sent while nobody listens are lost.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers; dropped if there are none.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates an independent receiver for events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
