//! Tokio-backed debounce scheduler.
//!
//! Each scheduled task is a spawned sleep followed by the task itself. A
//! countdown can be aborted only while it is still sleeping; once it wakes it
//! disarms itself and runs to completion.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::runtime::{Handle, TryCurrentError};
use tokio::task::AbortHandle;
use tracing::trace;

use crate::domain::ports::{DebounceScheduler, TimerHandle};

type Armed = Arc<Mutex<HashMap<u64, AbortHandle>>>;

/// Debounce scheduler that runs tasks on a tokio runtime.
pub struct TokioDebounceScheduler {
    runtime: Handle,
    next_id: AtomicU64,
    armed: Armed,
}

impl TokioDebounceScheduler {
    /// Scheduler spawning onto `runtime`.
    #[must_use]
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            next_id: AtomicU64::new(1),
            armed: Arc::default(),
        }
    }

    /// Scheduler spawning onto the runtime this is called from.
    ///
    /// # Errors
    ///
    /// Fails when called outside a tokio runtime.
    pub fn current() -> Result<Self, TryCurrentError> {
        Handle::try_current().map(Self::new)
    }

    /// Countdowns still sleeping.
    #[must_use]
    pub fn armed(&self) -> usize {
        self.armed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl DebounceScheduler for TokioDebounceScheduler {
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) -> TimerHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let registry = Arc::clone(&self.armed);
        // The entry is inserted before the countdown can observe the map.
        let mut armed = self.armed.lock().unwrap_or_else(PoisonError::into_inner);
        let join = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let still_armed = registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&id)
                .is_some();
            if still_armed {
                trace!(timer = id, "debounce fired");
                task.await;
            }
        });
        armed.insert(id, join.abort_handle());
        TimerHandle::new(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        let removed = self
            .armed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle.id());
        if let Some(countdown) = removed {
            countdown.abort();
            trace!(timer = handle.id(), "debounce cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    //! Paused-clock coverage for the tokio scheduler.
    use super::*;
    use futures_util::FutureExt;
    use std::sync::atomic::AtomicUsize;

    fn counting_task(fired: &Arc<AtomicUsize>) -> BoxFuture<'static, ()> {
        let counter = Arc::clone(fired);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
        .boxed()
    }

    #[tokio::test(start_paused = true)]
    async fn burst_with_cancellation_fires_once() {
        let scheduler = TokioDebounceScheduler::current().expect("runtime");
        let fired = Arc::new(AtomicUsize::new(0));
        let delay = Duration::from_millis(350);

        let mut pending = scheduler.schedule(delay, counting_task(&fired));
        for _ in 0..4 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            scheduler.cancel(pending);
            pending = scheduler.schedule(delay, counting_task(&fired));
        }
        assert_eq!(scheduler.armed(), 1);

        tokio::time::sleep(Duration::from_millis(349)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.armed(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_a_fired_handle_is_a_no_op() {
        let scheduler = TokioDebounceScheduler::current().expect("runtime");
        let fired = Arc::new(AtomicUsize::new(0));

        let handle = scheduler.schedule(Duration::from_millis(5), counting_task(&fired));
        tokio::time::sleep(Duration::from_millis(10)).await;
        scheduler.cancel(handle);
        scheduler.cancel(TimerHandle::new(999));

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn requires_a_runtime() {
        assert!(TokioDebounceScheduler::current().is_err());
    }
}
