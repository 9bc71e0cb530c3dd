//! Deadline, cancellation, and the retry decision for contended locks.
//!
//! The driver never blocks inside the kernel. After a conflicting attempt it
//! asks [`RetryPolicy::decide`] what to do next; the decision depends only on
//! the attempt outcome, the current instant, and the [`Cancellation`] state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Interval between lock attempts while another process holds a conflicting lock.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Deadline plus a cancellation flag shared with whoever may abort the run.
///
/// Clones share the same flag, so a clone handed to another thread can
/// cancel a wait in progress.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl Cancellation {
    /// Wait forever unless cancelled.
    pub fn none() -> Self {
        Self::default()
    }

    /// Give up `timeout` from now.
    ///
    /// A zero timeout, or one too large to land on a representable instant,
    /// means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        if timeout.is_zero() {
            return Self::none();
        }
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::none(),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: Arc::default(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Abort any wait using this token at its next poll.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Outcome of one non-blocking lock attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Granted,
    Conflict,
}

/// What the driver should do after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The lock is held; stop.
    Done,
    /// Sleep for the given duration, then attempt again.
    Retry(Duration),
    TimedOut,
    Cancelled,
}

/// Fixed-interval polling bounded by a [`Cancellation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
        }
    }
}

impl RetryPolicy {
    /// Decide the next step after `attempt` completed at `now`.
    ///
    /// Cancellation wins over an expired deadline. The retry wait is clamped
    /// so the final attempt lands on the deadline rather than past it.
    pub fn decide(&self, attempt: Attempt, now: Instant, cancellation: &Cancellation) -> Decision {
        if attempt == Attempt::Granted {
            return Decision::Done;
        }
        if cancellation.is_cancelled() {
            return Decision::Cancelled;
        }
        match cancellation.deadline() {
            Some(deadline) if now >= deadline => Decision::TimedOut,
            Some(deadline) => Decision::Retry(self.interval.min(deadline - now)),
            None => Decision::Retry(self.interval),
        }
    }
}
