use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cooperative cancellation flag for anytime computations.
///
/// Clones share the same flag, so one handle can be moved to another thread
/// (or a signal handler) while the engine polls the other between offsets.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the computation stop at the next iteration boundary.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Why an anytime loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Completion {
    /// Every candidate offset was processed.
    Exhausted,
    /// The sample budget truncated the offset list and all sampled offsets ran.
    BudgetReached,
    /// The cancellation token fired.
    Cancelled,
    /// The configured time limit elapsed.
    TimedOut,
}

/// Polls the token and the optional deadline.
pub(crate) struct StopCheck<'a> {
    token: &'a CancellationToken,
    deadline: Option<Instant>,
}

impl<'a> StopCheck<'a> {
    pub fn new(token: &'a CancellationToken, time_limit: Option<Duration>) -> Self {
        Self {
            token,
            deadline: time_limit.map(|limit| Instant::now() + limit),
        }
    }

    /// Returns the stop reason if the loop must exit now.
    #[inline]
    pub fn poll(&self) -> Option<Completion> {
        if self.token.is_cancelled() {
            return Some(Completion::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Completion::TimedOut),
            _ => None,
        }
    }
}
