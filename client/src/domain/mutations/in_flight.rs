//! Single-flight bookkeeping for mutation kinds.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Mutation families that may each have one request outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Create or update from the form.
    Save,
    /// Confirmed deletion.
    Delete,
    /// Confirmed restock.
    Restock,
    /// Purchase of one unit.
    Purchase,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Save => "save",
            Self::Delete => "delete",
            Self::Restock => "restock",
            Self::Purchase => "purchase",
        })
    }
}

#[derive(Debug, Default)]
pub(super) struct InFlight {
    active: Mutex<HashSet<MutationKind>>,
}

impl InFlight {
    /// Mark `kind` busy; `None` when it already is.
    pub(super) fn begin(self: &Arc<Self>, kind: MutationKind) -> Option<InFlightGuard> {
        self.active()
            .insert(kind)
            .then(|| InFlightGuard {
                registry: Arc::clone(self),
                kind,
            })
    }

    pub(super) fn is_busy(&self, kind: MutationKind) -> bool {
        self.active().contains(&kind)
    }

    // Set insert/remove cannot leave the set half-updated.
    fn active(&self) -> MutexGuard<'_, HashSet<MutationKind>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases its mutation kind when dropped.
#[derive(Debug)]
pub(super) struct InFlightGuard {
    registry: Arc<InFlight>,
    kind: MutationKind,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.active().remove(&self.kind);
    }
}
