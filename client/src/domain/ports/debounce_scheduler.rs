//! Port for cancellable delayed work.
//!
//! The search synchronizer owns at most one pending handle at a time and
//! cancels it before scheduling the next, giving trailing-edge debounce.

use std::time::Duration;

use futures_util::future::BoxFuture;

/// Opaque handle to a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Wrap a scheduler-assigned identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Scheduler-assigned identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Runs a task once after a delay unless cancelled first.
pub trait DebounceScheduler: Send + Sync {
    /// Arm `task` to run after `delay`.
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) -> TimerHandle;

    /// Disarm a pending task. Cancelling a fired or unknown handle is a no-op.
    fn cancel(&self, handle: TimerHandle);
}
