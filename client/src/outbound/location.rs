//! In-process address bar for the terminal shell.
//!
//! Keeps the current path and query plus every entry pushed so far, which
//! the shell prints as the shareable location.

use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::domain::ports::Location;

/// One history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Path, always starting with `/`.
    pub path: String,
    /// Query string without the leading `?`.
    pub query: String,
}

impl Address {
    fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let (path, query) = trimmed.split_once('?').unwrap_or((trimmed, ""));
        Self {
            path: normalise_path(path),
            query: query.to_owned(),
        }
    }

    /// `path?query`, or just the path when the query is empty.
    #[must_use]
    pub fn href(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }
}

fn normalise_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    }
}

/// Location backed by an in-memory history stack.
#[derive(Debug)]
pub struct HistoryLocation {
    history: Mutex<Vec<Address>>,
}

impl HistoryLocation {
    /// Start at `initial`, for example `/?category=cake`.
    #[must_use]
    pub fn starting_at(initial: &str) -> Self {
        Self {
            history: Mutex::new(vec![Address::parse(initial)]),
        }
    }

    /// Replace the address as if the user edited the address bar.
    ///
    /// Returns the new address so the caller can tell the synchronizer.
    pub fn navigate(&self, raw: &str) -> Address {
        let address = Address::parse(raw);
        self.entries().push(address.clone());
        debug!(href = %address.href(), "location navigated");
        address
    }

    /// Current address.
    #[must_use]
    pub fn current(&self) -> Address {
        self.entries()
            .last()
            .cloned()
            .unwrap_or_else(|| Address::parse("/"))
    }

    /// Every address visited, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<Address> {
        self.entries().clone()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, Vec<Address>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for HistoryLocation {
    fn default() -> Self {
        Self::starting_at("/")
    }
}

impl Location for HistoryLocation {
    fn current_path(&self) -> String {
        self.current().path
    }

    fn current_query(&self) -> String {
        self.current().query
    }

    fn push(&self, path: &str, query: &str) {
        let address = Address {
            path: normalise_path(path),
            query: query.to_owned(),
        };
        debug!(href = %address.href(), "location pushed");
        self.entries().push(address);
    }
}
