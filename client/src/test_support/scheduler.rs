//! Debounce scheduler driven by the test instead of a clock.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::future::BoxFuture;

use crate::domain::ports::{DebounceScheduler, TimerHandle};

#[derive(Default)]
struct ManualState {
    next_id: u64,
    pending: BTreeMap<u64, (Duration, BoxFuture<'static, ()>)>,
    scheduled: usize,
    cancelled: usize,
}

/// Holds scheduled tasks until [`ManualScheduler::fire_all`] runs them.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
    ignore_cancel: bool,
}

impl ManualScheduler {
    /// Scheduler whose `cancel` disarms the task.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A scheduler whose `cancel` records the call but keeps the task armed,
    /// for exercising stale-countdown handling.
    #[must_use]
    pub fn ignoring_cancel() -> Self {
        Self {
            state: Mutex::default(),
            ignore_cancel: true,
        }
    }

    /// Tasks still armed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Delays of armed tasks, oldest first.
    #[must_use]
    pub fn pending_delays(&self) -> Vec<Duration> {
        self.lock().pending.values().map(|(delay, _)| *delay).collect()
    }

    /// Tasks scheduled so far, fired or not.
    #[must_use]
    pub fn scheduled(&self) -> usize {
        self.lock().scheduled
    }

    /// Calls to `cancel` so far.
    #[must_use]
    pub fn cancelled(&self) -> usize {
        self.lock().cancelled
    }

    /// Run every armed task to completion, oldest first.
    pub async fn fire_all(&self) -> usize {
        let tasks = std::mem::take(&mut self.lock().pending);
        let fired = tasks.len();
        for (_, (_, task)) in tasks {
            task.await;
        }
        fired
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DebounceScheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) -> TimerHandle {
        let mut state = self.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.pending.insert(id, (delay, task));
        state.scheduled += 1;
        TimerHandle::new(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        let mut state = self.lock();
        state.cancelled += 1;
        if !self.ignore_cancel {
            state.pending.remove(&handle.id());
        }
    }
}
