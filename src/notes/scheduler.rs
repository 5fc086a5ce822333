//! Per-note retry timers with fixed exponential backoff.
//!
//! The backoff schedule is a capped table lookup, not a multiplicative
//! formula: failure 1 waits 2s, failure 2 waits 5s, failure 3 and beyond
//! wait 10s. The lookup is side-effect-free; only `RetryScheduler` touches
//! the timer mechanism.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use uuid::Uuid;

/// Boxed retry task; erased so the processor can schedule itself
pub type RetryTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Retry behavior for the transcription queue
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum automatic attempts before a note fails terminally
    pub max_attempts: u32,

    /// Backoff table, indexed by failure count; last entry repeats
    pub delays: Vec<Duration>,

    /// Pause between sequential attempts during a queue drain
    pub queue_gap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delays: vec![
                Duration::from_millis(2000),
                Duration::from_millis(5000),
                Duration::from_millis(10000),
            ],
            queue_gap: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay after the given failure count (1-based).
    ///
    /// Counts past the end of the table repeat the last entry.
    pub fn delay_for(&self, failure_count: u32) -> Duration {
        let idx = failure_count.saturating_sub(1) as usize;
        self.delays
            .get(idx)
            .or_else(|| self.delays.last())
            .copied()
            .unwrap_or(Duration::from_millis(2000))
    }
}

/// Timer management keyed by note id: at most one pending timer per note.
///
/// The scheduler never mutates note data; it only runs the task it was
/// armed with. A firing timer removes itself from the map before running,
/// so the task may legitimately re-arm without colliding with stale state.
#[derive(Default)]
pub struct RetryScheduler {
    timers: Arc<Mutex<HashMap<Uuid, JoinHandle<()>>>>,
}

impl RetryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a timer for a note, replacing any existing one.
    pub fn arm(&self, id: Uuid, delay: Duration, task: impl Future<Output = ()> + Send + 'static) {
        // Clear any previous timer for this id first
        if let Some(old) = self.timers.lock().unwrap().remove(&id) {
            old.abort();
        }

        let timers = Arc::clone(&self.timers);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Remove before running so the task can re-arm
            timers.lock().unwrap().remove(&id);
            task.await;
        });

        self.timers.lock().unwrap().insert(id, handle);
    }

    /// Cancel the pending timer for a note, if any. Safe when none exists.
    pub fn cancel(&self, id: Uuid) -> bool {
        match self.timers.lock().unwrap().remove(&id) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Whether a timer is currently armed for this note
    pub fn is_armed(&self, id: Uuid) -> bool {
        self.timers.lock().unwrap().contains_key(&id)
    }

    /// Number of armed timers
    pub fn armed_count(&self) -> usize {
        self.timers.lock().unwrap().len()
    }
}
