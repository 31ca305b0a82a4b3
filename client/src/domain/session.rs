//! Session state and the store that owns it.
//!
//! The store is the only writer of durable session state. Writes go to
//! storage first and the in-memory copy only changes once storage accepted
//! them, all under one lock, so readers never observe a session that was not
//! persisted.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tracing::{info, warn};
use zeroize::Zeroizing;

use super::Identity;
use super::ports::{SessionStorage, SessionStorageError};
use super::route_guard::{GuardDecision, RequiredAccess, decide};

/// Bearer token issued at login.
///
/// The value is wiped on drop and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(Zeroizing<String>);

impl AuthToken {
    /// Wrap a token, refusing blank input.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return None;
        }
        Some(Self(Zeroizing::new(raw)))
    }

    /// Token text for the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

impl Serialize for AuthToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}

impl<'de> Deserialize<'de> for AuthToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Zeroizing::new(String::deserialize(deserializer)?);
        Self::new(raw.as_str()).ok_or_else(|| serde::de::Error::custom("token must not be empty"))
    }
}

/// A signed-in session: token and identity always travel together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Session {
    token: AuthToken,
    #[serde(rename = "user")]
    identity: Identity,
}

impl Session {
    /// Pair a token with the identity it was issued for.
    #[must_use]
    pub const fn new(token: AuthToken, identity: Identity) -> Self {
        Self { token, identity }
    }

    /// Bearer token.
    #[must_use]
    pub const fn token(&self) -> &AuthToken {
        &self.token
    }

    /// Signed-in identity.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }
}

/// Failures raised by [`SessionStore`] writers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Only one of token and identity was supplied.
    #[error("token and identity must be set or cleared together")]
    Partial,
    /// Durable storage refused the write.
    #[error(transparent)]
    Storage(#[from] SessionStorageError),
    /// A previous writer panicked while holding the lock.
    #[error("session lock poisoned")]
    Poisoned,
}

/// Holder of the current session.
///
/// Cheap to share behind an `Arc`; every accessor is synchronous.
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    current: Mutex<Option<Session>>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Hydrate a store from durable storage.
    ///
    /// A record that cannot be decoded is removed and the store starts empty.
    /// Any other storage failure is returned to the caller.
    pub fn initialize(storage: Arc<dyn SessionStorage>) -> Result<Self, SessionError> {
        let hydrated = match storage.load() {
            Ok(session) => session,
            Err(SessionStorageError::Corrupt { message }) => {
                warn!(%message, "discarding unreadable stored session");
                storage.clear()?;
                None
            }
            Err(err) => return Err(err.into()),
        };
        if let Some(session) = hydrated.as_ref() {
            info!(user_id = %session.identity().id(), "restored stored session");
        }
        Ok(Self {
            storage,
            current: Mutex::new(hydrated),
        })
    }

    /// Replace the session.
    ///
    /// Both present stores a new session; both absent clears it. Anything
    /// else is rejected without touching storage or memory.
    pub fn set_session(
        &self,
        token: Option<AuthToken>,
        identity: Option<Identity>,
    ) -> Result<(), SessionError> {
        match (token, identity) {
            (Some(token), Some(identity)) => self.store(Session::new(token, identity)),
            (None, None) => self.clear(),
            _ => Err(SessionError::Partial),
        }
    }

    /// Persist and hold a complete session.
    pub fn store(&self, session: Session) -> Result<(), SessionError> {
        let mut guard = self.lock()?;
        self.storage.save(&session)?;
        info!(user_id = %session.identity().id(), role = %session.identity().role(), "session started");
        *guard = Some(session);
        Ok(())
    }

    /// Remove the session from storage and memory.
    pub fn clear(&self) -> Result<(), SessionError> {
        let mut guard = self.lock()?;
        self.storage.clear()?;
        if guard.take().is_some() {
            info!("session cleared");
        }
        Ok(())
    }

    /// Copy of the current session, if any.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.read().clone()
    }

    /// Current bearer token.
    #[must_use]
    pub fn token(&self) -> Option<AuthToken> {
        self.read().as_ref().map(|session| session.token().clone())
    }

    /// Current identity.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.read().as_ref().map(|session| session.identity().clone())
    }

    /// Whether a token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    /// Whether the held identity is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.read()
            .as_ref()
            .is_some_and(|session| session.identity().is_admin())
    }

    /// Route guard decision against the current session.
    #[must_use]
    pub fn guard(&self, required: RequiredAccess) -> GuardDecision {
        decide(self.read().as_ref(), required)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Session>>, SessionError> {
        self.current.lock().map_err(|_| SessionError::Poisoned)
    }

    // Memory is assigned only after storage succeeded, so a poisoned guard
    // still holds a consistent value for readers.
    fn read(&self) -> MutexGuard<'_, Option<Session>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
