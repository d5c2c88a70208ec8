//! # Stage lifecycle tracker with sequence-based ordering.
//!
//! Maintains authoritative state of which stages are currently executing,
//! using event sequence numbers to handle out-of-order delivery.
//!
//! ## Architecture
//! ```text
//! StageActor ──► Bus ──► Supervisor listener ──► AliveTracker::update()
//!                                                        │
//!                                                        ▼
//!                                             HashMap<String, StageState>
//!                                                 (name → {seq, alive})
//! ```
//!
//! ## Rules
//! - Only `StageStarting` / `StageStopped` / `StageUnavailable` change alive state
//! - Other events **update seq** but don't affect alive status
//! - Events with `seq <= last_seq` are **rejected** (stale)

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::events::{Event, EventKind};

/// Per-stage state for ordering validation.
#[derive(Debug, Clone)]
struct StageState {
    last_seq: u64,
    alive: bool,
}

/// Thread-safe tracker of executing stages.
///
/// Provides the stuck-stage list for graceful shutdown.
#[derive(Default)]
pub struct AliveTracker {
    state: RwLock<HashMap<String, StageState>>,
}

impl AliveTracker {
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `ev` if it is newer than the last event seen for its stage.
    ///
    /// Returns `true` if the alive state changed.
    ///
    /// ```text
    /// update(StageStopped,  seq=100)  → alive=false, last_seq=100
    /// update(StageStarting, seq=99)   → rejected (stale)
    /// ```
    pub async fn update(&self, ev: &Event) -> bool {
        if ev.is_subscriber_event() {
            return false;
        }
        let Some(name) = ev.stage.as_deref() else {
            return false;
        };

        let mut state = self.state.write().await;
        let entry = state.entry(name.to_string()).or_insert(StageState {
            last_seq: 0,
            alive: false,
        });

        if entry.last_seq != 0 && ev.seq <= entry.last_seq {
            return false;
        }
        entry.last_seq = ev.seq;

        let alive = match ev.kind {
            EventKind::StageStarting => true,
            EventKind::StageStopped | EventKind::StageUnavailable => false,
            _ => return false,
        };
        let changed = entry.alive != alive;
        entry.alive = alive;
        changed
    }

    /// Returns sorted list of currently executing stage names.
    pub async fn snapshot(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut alive: Vec<String> = state
            .iter()
            .filter(|(_, s)| s.alive)
            .map(|(name, _)| name.clone())
            .collect();
        alive.sort_unstable();
        alive
    }

    /// Returns true if the stage is currently executing.
    pub async fn is_alive(&self, name: &str) -> bool {
        self.state
            .read()
            .await
            .get(name)
            .map(|s| s.alive)
            .unwrap_or(false)
    }
}
