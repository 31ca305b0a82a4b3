//! Port for durable session persistence.
//!
//! Only [`crate::domain::SessionStore`] talks to this port. Adapters persist
//! the token and identity as one record so a reader never sees one without
//! the other.

use std::sync::{Mutex, PoisonError};

use crate::domain::Session;

use super::define_port_error;

define_port_error! {
    /// Errors raised by session storage adapters.
    pub enum SessionStorageError {
        /// The backing store could not be read or written.
        Io { message: String } => "session storage failed: {message}",
        /// A record exists but does not decode into a complete session.
        Corrupt { message: String } => "stored session is unreadable: {message}",
    }
}

/// Durable home for the signed-in session.
#[cfg_attr(test, mockall::automock)]
pub trait SessionStorage: Send + Sync {
    /// Read the stored session; `None` when nothing is stored.
    fn load(&self) -> Result<Option<Session>, SessionStorageError>;

    /// Replace the stored session.
    fn save(&self, session: &Session) -> Result<(), SessionStorageError>;

    /// Remove any stored session. Clearing an empty store succeeds.
    fn clear(&self) -> Result<(), SessionStorageError>;
}

/// In-process storage that forgets everything on exit.
///
/// Backs `--ephemeral-session` runs and behaviour tests that need to inspect
/// what was persisted.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    record: Mutex<Option<Session>>,
}

impl MemorySessionStorage {
    /// Storage pre-populated with `session`.
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self {
            record: Mutex::new(Some(session)),
        }
    }

    /// Copy of the stored record.
    #[must_use]
    pub fn stored(&self) -> Option<Session> {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Result<Option<Session>, SessionStorageError> {
        Ok(self.stored())
    }

    fn save(&self, session: &Session) -> Result<(), SessionStorageError> {
        let mut record = self
            .record
            .lock()
            .map_err(|_| SessionStorageError::io("memory storage lock poisoned"))?;
        *record = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStorageError> {
        let mut record = self
            .record
            .lock()
            .map_err(|_| SessionStorageError::io("memory storage lock poisoned"))?;
        *record = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AuthToken, Identity, Role};
    use rstest::rstest;

    #[rstest]
    fn memory_storage_round_trips() {
        let storage = MemorySessionStorage::default();
        let session = Session::new(
            AuthToken::new("t1").expect("token"),
            Identity::try_new("u1", "Ada", "ada@example.com", Role::User).expect("identity"),
        );

        storage.save(&session).expect("save");
        assert_eq!(storage.load().expect("load"), Some(session));

        storage.clear().expect("clear");
        assert_eq!(storage.stored(), None);
    }

    #[rstest]
    fn corrupt_error_mentions_cause() {
        let err = SessionStorageError::corrupt("missing user");
        assert_eq!(err.kind(), "corrupt");
        assert!(err.to_string().contains("missing user"));
    }
}
