//! Development-only action log
//!
//! [`ActionLogEnhancer`] installs a monitor that numbers, timestamps, and
//! traces every reduced action. Window stores only accept it in development
//! builds.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::store::{Monitor, StoreBuilder, StoreEnhancer};

/// Default number of entries kept by an action log
pub const DEFAULT_LOG_CAPACITY: usize = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionLogEntry {
    pub seq: u64,
    /// `Debug` rendering of the action
    pub action: String,
    pub at: DateTime<Utc>,
}

/// Bounded, shareable log of reduced actions
#[derive(Debug)]
pub struct ActionLog {
    entries: Mutex<Vec<ActionLogEntry>>,
    next_seq: AtomicU64,
    capacity: usize,
}

impl ActionLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_seq: AtomicU64::new(1),
            capacity,
        }
    }

    fn record(&self, action: String) {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        debug!(seq, %action, "ActionLog: reduced");
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.push(ActionLogEntry {
            seq,
            action,
            at: Utc::now(),
        });
        if entries.len() > self.capacity {
            let excess = entries.len() - self.capacity;
            entries.drain(..excess);
        }
    }

    pub fn entries(&self) -> Vec<ActionLogEntry> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of logged actions whose rendering is exactly `action`
    pub fn count(&self, action: &str) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|entry| entry.action == action)
            .count()
    }
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

struct ActionLogMonitor(Arc<ActionLog>);

impl<S, A: Debug> Monitor<S, A> for ActionLogMonitor {
    fn observe(&self, action: &A, _state: &S) {
        self.0.record(format!("{action:?}"));
    }
}

/// Enhancer that records every reduced action into an [`ActionLog`]
#[derive(Clone, Default)]
pub struct ActionLogEnhancer {
    log: Arc<ActionLog>,
}

impl ActionLogEnhancer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> Arc<ActionLog> {
        Arc::clone(&self.log)
    }
}

impl<S, A> StoreEnhancer<S, A> for ActionLogEnhancer
where
    S: Clone + Send + Sync + 'static,
    A: Debug + Send + 'static,
{
    fn enhance(&self, builder: StoreBuilder<S, A>) -> StoreBuilder<S, A> {
        debug!("ActionLogEnhancer::enhance: installing monitor");
        builder.monitor(Arc::new(ActionLogMonitor(Arc::clone(&self.log))))
    }
}
