//! Keeps the filter inputs, the shareable location and the displayed
//! collection consistent.
//!
//! Local edits restart a single trailing-edge countdown. When it expires the
//! canonical query is pushed to the location and the storefront is fetched.
//! External navigation replaces every field from the location query. Each
//! countdown carries a generation number, so a countdown that fires after
//! being superseded does nothing even if the scheduler could not cancel it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use tracing::{debug, warn};

use super::catalogue::{Catalogue, RefreshOutcome};
use super::ports::{DebounceScheduler, Location, TimerHandle};
use super::route_guard::RouteTarget;
use super::{CanonicalQuery, CollectionQuery, Error, SearchField, SearchFilter};

/// Default quiet period before a local edit triggers a fetch.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(350);

#[derive(Debug, Default)]
struct SyncState {
    filter: SearchFilter,
    pending: Option<TimerHandle>,
    generation: u64,
    last_pushed: Option<CanonicalQuery>,
}

struct SyncInner {
    location: Arc<dyn Location>,
    scheduler: Arc<dyn DebounceScheduler>,
    catalogue: Catalogue,
    delay: Duration,
    state: Mutex<SyncState>,
}

/// Search filter synchronizer.
///
/// Clones share state, which lets scheduled countdowns call back into the
/// same instance.
#[derive(Clone)]
pub struct SearchQuerySynchronizer {
    inner: Arc<SyncInner>,
}

impl SearchQuerySynchronizer {
    /// Build a synchronizer hydrated from the current location query.
    #[must_use]
    pub fn new(
        location: Arc<dyn Location>,
        scheduler: Arc<dyn DebounceScheduler>,
        catalogue: Catalogue,
        delay: Duration,
    ) -> Self {
        let filter = SearchFilter::from_query(&location.current_query());
        Self {
            inner: Arc::new(SyncInner {
                location,
                scheduler,
                catalogue,
                delay,
                state: Mutex::new(SyncState {
                    filter,
                    ..SyncState::default()
                }),
            }),
        }
    }

    /// Current filter contents.
    #[must_use]
    pub fn filter(&self) -> SearchFilter {
        self.inner.state().filter.clone()
    }

    /// Whether a countdown is armed.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.inner.state().pending.is_some()
    }

    /// Quiet period applied to local edits.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Record a local edit and restart the countdown.
    pub fn on_field_edit(&self, field: SearchField, value: impl Into<String>) {
        let mut state = self.inner.state();
        state.filter.set(field, value);
        state.last_pushed = None;
        state.generation += 1;
        let generation = state.generation;
        if let Some(previous) = state.pending.take() {
            self.inner.scheduler.cancel(previous);
        }
        let this = self.clone();
        let task = async move { this.expire(generation).await }.boxed();
        state.pending = Some(self.inner.scheduler.schedule(self.inner.delay, task));
        debug!(%field, generation, "search countdown restarted");
    }

    /// Skip the countdown and reconcile now.
    pub async fn submit(&self) -> Result<RefreshOutcome, Error> {
        {
            let mut state = self.inner.state();
            state.generation += 1;
            if let Some(previous) = state.pending.take() {
                self.inner.scheduler.cancel(previous);
            }
        }
        self.reconcile().await
    }

    /// Drop the record of this synchronizer's last push.
    ///
    /// Call whenever something else moves the location, so a later change
    /// back to the same query is treated as external navigation.
    pub fn forget_push(&self) {
        self.inner.state().last_pushed = None;
    }

    /// React to the location changing underneath the synchronizer.
    ///
    /// Returns `None` when the change was the echo of this synchronizer's own
    /// push, or when the location is not the storefront.
    pub async fn on_location_changed(&self) -> Option<Result<RefreshOutcome, Error>> {
        let query = self.inner.location.current_query();
        let fetch = {
            let mut state = self.inner.state();
            if state
                .last_pushed
                .take()
                .is_some_and(|pushed| pushed.as_str() == query)
            {
                debug!("ignoring echo of own location push");
                return None;
            }
            state.filter = SearchFilter::from_query(&query);
            state.generation += 1;
            if let Some(previous) = state.pending.take() {
                self.inner.scheduler.cancel(previous);
            }
            if self.inner.location.current_path() != RouteTarget::Home.path() {
                return None;
            }
            self.inner
                .catalogue
                .refresh(CollectionQuery::Storefront(state.filter.canonical_query()))
        };
        Some(fetch.await)
    }

    async fn expire(&self, generation: u64) {
        {
            let mut state = self.inner.state();
            if state.generation != generation {
                debug!(generation, current = state.generation, "stale search countdown ignored");
                return;
            }
            state.pending = None;
        }
        if let Err(err) = self.reconcile().await {
            warn!(error = %err, "debounced search failed");
        }
    }

    async fn reconcile(&self) -> Result<RefreshOutcome, Error> {
        let fetch = {
            let mut state = self.inner.state();
            let query = state.filter.canonical_query();
            state.last_pushed = Some(query.clone());
            self.inner
                .location
                .push(RouteTarget::Home.path(), query.as_str());
            debug!(%query, "search reconciled");
            self.inner.catalogue.refresh(CollectionQuery::Storefront(query))
        };
        fetch.await
    }
}

impl SyncInner {
    // Field assignments cannot panic midway, so recover a poisoned guard.
    fn state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests;
