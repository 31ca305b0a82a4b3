//! The displayed item collection and its fetch ordering.
//!
//! Every fetch takes a sequence number at the moment it is requested. A
//! response is committed only while its number is still the newest issued;
//! anything older is dropped, errors included. Filter fetches and
//! post-mutation refreshes share the counter, so the last state-changing
//! event always decides what is shown.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};
use tracing::{debug, warn};

use super::ports::SweetsAuthority;
use super::session_expiry::authority_error;
use super::{CollectionQuery, Error, Identity, Item, ItemId, SessionExpiryPolicy, SessionStore};

const LOAD_FAILED: &str = "Failed to load sweets";

/// What happened to a fetch once it settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The response replaced the displayed collection.
    Applied {
        /// Number of items now displayed.
        count: usize,
    },
    /// A newer fetch was issued first; the response was dropped.
    Superseded,
}

#[derive(Debug, Default)]
struct CatalogueState {
    // `None` means the view has no scope (admin view without an identity).
    scope: Option<CollectionQuery>,
    items: Vec<Item>,
}

struct CatalogueInner {
    authority: Arc<dyn SweetsAuthority>,
    session: Arc<SessionStore>,
    expiry: SessionExpiryPolicy,
    issued: AtomicU64,
    state: Mutex<CatalogueState>,
}

/// Shared handle to the displayed collection.
///
/// Clones refer to the same collection.
#[derive(Clone)]
pub struct Catalogue {
    inner: Arc<CatalogueInner>,
}

impl Catalogue {
    /// Create an empty storefront collection.
    #[must_use]
    pub fn new(
        authority: Arc<dyn SweetsAuthority>,
        session: Arc<SessionStore>,
        expiry: SessionExpiryPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(CatalogueInner {
                authority,
                session,
                expiry,
                issued: AtomicU64::new(0),
                state: Mutex::new(CatalogueState {
                    scope: Some(CollectionQuery::default()),
                    items: Vec::new(),
                }),
            }),
        }
    }

    /// Fetch `query` and display the result if nothing newer was requested
    /// meanwhile.
    ///
    /// The sequence number is taken when this method is called, not when the
    /// returned future is first polled.
    pub fn refresh(
        &self,
        query: CollectionQuery,
    ) -> impl Future<Output = Result<RefreshOutcome, Error>> + Send + 'static {
        let seq = self.issue();
        self.inner.state().scope = Some(query.clone());
        debug!(seq, ?query, "collection fetch issued");
        let inner = Arc::clone(&self.inner);
        async move {
            let bearer = inner.session.token();
            let result = inner.authority.list_items(bearer.as_ref(), &query).await;
            let mut state = inner.state();
            if inner.issued.load(Ordering::SeqCst) != seq {
                debug!(seq, "collection fetch superseded");
                return Ok(RefreshOutcome::Superseded);
            }
            match result {
                Ok(items) => {
                    let count = items.len();
                    state.items = items;
                    debug!(seq, count, "collection fetch committed");
                    Ok(RefreshOutcome::Applied { count })
                }
                Err(err) => {
                    drop(state);
                    warn!(seq, error = %err, kind = err.kind(), "collection fetch failed");
                    inner.expiry.reconcile(&inner.session, &err);
                    Err(authority_error(&err, LOAD_FAILED))
                }
            }
        }
    }

    /// Repeat the most recently requested scope.
    pub fn refresh_current(&self) -> BoxFuture<'static, Result<RefreshOutcome, Error>> {
        let scope = self.inner.state().scope.clone();
        match scope {
            Some(query) => self.refresh(query).boxed(),
            None => future::ready(Ok(self.empty())).boxed(),
        }
    }

    /// Switch to the admin scope for `identity`.
    ///
    /// With no identity the collection is emptied without a request.
    pub fn show_owned_by(
        &self,
        identity: Option<&Identity>,
    ) -> BoxFuture<'static, Result<RefreshOutcome, Error>> {
        match identity {
            Some(owner) => self.refresh(CollectionQuery::OwnedBy(owner.id().clone())).boxed(),
            None => future::ready(Ok(self.empty())).boxed(),
        }
    }

    /// Snapshot of the displayed items.
    #[must_use]
    pub fn items(&self) -> Vec<Item> {
        self.inner.state().items.clone()
    }

    /// Displayed item with `id`.
    #[must_use]
    pub fn find(&self, id: &ItemId) -> Option<Item> {
        self.inner
            .state()
            .items
            .iter()
            .find(|item| &item.id == id)
            .cloned()
    }

    /// Scope of the most recent request.
    #[must_use]
    pub fn scope(&self) -> Option<CollectionQuery> {
        self.inner.state().scope.clone()
    }

    fn empty(&self) -> RefreshOutcome {
        // Supersede anything still in flight before emptying.
        self.issue();
        let mut state = self.inner.state();
        state.scope = None;
        state.items.clear();
        RefreshOutcome::Applied { count: 0 }
    }

    fn issue(&self) -> u64 {
        self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl CatalogueInner {
    // Assignments under this lock never panic midway, so a poisoned guard
    // still holds a coherent collection.
    fn state(&self) -> MutexGuard<'_, CatalogueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests;
