//! Test doubles shared by unit tests and the behaviour suites.
//!
//! Compiled for `cfg(test)` and for the `test-support` feature so the
//! integration tests under `tests/` can reach them.

mod app;
mod authority;
mod scheduler;

use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::domain::ports::{Notice, NoticeLevel, Notifier};
use crate::domain::{IdentityValidationError, Item, ItemId, ItemIdValidationError, SessionError};

pub use app::{AppFixture, assemble_app, identity};
pub use authority::{AuthorityCall, Endpoint, StubAuthority};
pub use scheduler::ManualScheduler;

/// Fixture data rejected by domain validation.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// The fixture identity did not validate.
    #[error("fixture identity is invalid: {0}")]
    Identity(#[from] IdentityValidationError),
    /// The fixture item id did not validate.
    #[error("fixture item id is invalid: {0}")]
    ItemId(#[from] ItemIdValidationError),
    /// The fixture bearer token was blank.
    #[error("fixture token is blank")]
    Token,
    /// The session store refused to hydrate.
    #[error("fixture client failed to assemble: {0}")]
    Assemble(#[from] SessionError),
}

/// Notifier that keeps every notice for later assertions.
#[derive(Default)]
pub struct RecordingNotifier(Mutex<Vec<Notice>>);

impl RecordingNotifier {
    /// Empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notice so far, oldest first.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.lock().clone()
    }

    /// Messages of every notice so far, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(|n| n.message.clone()).collect()
    }

    /// Most recent notice.
    #[must_use]
    pub fn last(&self) -> Option<Notice> {
        self.lock().last().cloned()
    }

    /// Notices recorded at `level`.
    #[must_use]
    pub fn count(&self, level: NoticeLevel) -> usize {
        self.lock().iter().filter(|n| n.level == level).count()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Notice>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.lock().push(notice);
    }
}

/// Build a candy-category item priced 2.5.
///
/// # Errors
///
/// Returns [`FixtureError::ItemId`] when `id` is not a valid item id.
pub fn item(id: &str, name: &str, quantity: u32) -> Result<Item, FixtureError> {
    Ok(Item {
        id: ItemId::new(id)?,
        name: name.to_owned(),
        category: "candy".to_owned(),
        price: 2.5,
        quantity,
        image: None,
        owners: Vec::new(),
    })
}
