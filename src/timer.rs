//! Coarse wake-ups for the scheduler.
//!
//! The UI loop is the only timer we have: it comes around every frame, maybe
//! late, never early. `RecurringTask` turns that into a cancellable
//! "every `interval`" signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared stop flag. Every clone sees the cancellation.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct RecurringTask {
    interval: Duration,
    next_due: Instant,
    token: CancelToken,
}

impl RecurringTask {
    /// First wake is due immediately.
    pub fn new(interval: Duration, now: Instant, token: CancelToken) -> Self {
        Self {
            interval,
            next_due: now,
            token,
        }
    }

    /// True when the task should run now. Re-arms relative to `now`, so a
    /// stalled loop gets one wake, not a backlog of them.
    pub fn due(&mut self, now: Instant) -> bool {
        if self.token.is_cancelled() || now < self.next_due {
            return false;
        }
        self.next_due = now + self.interval;
        true
    }

    /// How long the host loop may sleep before this task wants to run.
    pub fn time_until_due(&self, now: Instant) -> Duration {
        self.next_due.saturating_duration_since(now)
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }
}
