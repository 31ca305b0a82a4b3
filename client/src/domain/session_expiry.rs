//! What to do when the authority stops accepting the held session, and how
//! authority failures become domain errors.

use tracing::warn;

use super::ports::AuthorityError;
use super::{Error, SessionStore};

/// Reaction to an authenticated request rejected as unauthenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionExpiryPolicy {
    /// Drop the session so guards send the user back to login.
    #[default]
    ClearSession,
    /// Keep the session and only report the failure.
    KeepSession,
}

impl SessionExpiryPolicy {
    /// Pick a policy from the `keep_session_on_rejection` setting.
    #[must_use]
    pub const fn from_keep_flag(keep: bool) -> Self {
        if keep {
            Self::KeepSession
        } else {
            Self::ClearSession
        }
    }

    /// Apply the policy to a failed authenticated request.
    ///
    /// Returns `true` when the session was cleared.
    pub fn reconcile(self, session: &SessionStore, error: &AuthorityError) -> bool {
        if !matches!(error, AuthorityError::Unauthenticated { .. }) || self == Self::KeepSession {
            return false;
        }
        match session.clear() {
            Ok(()) => {
                warn!("authority rejected the session; cleared it");
                true
            }
            Err(err) => {
                warn!(error = %err, "authority rejected the session but clearing it failed");
                false
            }
        }
    }
}

/// Map an authority failure onto a domain error.
///
/// The authority's own message wins; `fallback` covers responses without one
/// and transport failures.
pub(crate) fn authority_error(error: &AuthorityError, fallback: &str) -> Error {
    let text = error.authority_message().unwrap_or(fallback);
    match error {
        AuthorityError::Unauthenticated { .. } => Error::unauthorized(text),
        AuthorityError::Rejected { .. } => Error::rejected(text),
        AuthorityError::Transport { .. }
        | AuthorityError::Timeout { .. }
        | AuthorityError::Decode { .. } => Error::unavailable(text),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use std::sync::Arc;

    use super::*;
    use crate::domain::ports::{MemorySessionStorage, SessionStorage};
    use crate::domain::{AuthToken, ErrorCode, Identity, Role, Session};
    use rstest::{fixture, rstest};

    #[fixture]
    fn signed_in() -> (Arc<MemorySessionStorage>, SessionStore) {
        let storage = Arc::new(MemorySessionStorage::with_session(Session::new(
            AuthToken::new("t1").expect("token"),
            Identity::try_new("u1", "Ada", "ada@example.com", Role::Admin).expect("identity"),
        )));
        let store = SessionStore::initialize(Arc::clone(&storage) as Arc<dyn SessionStorage>)
            .expect("hydrates");
        (storage, store)
    }

    #[rstest]
    fn clear_policy_drops_session_on_unauthenticated(
        signed_in: (Arc<MemorySessionStorage>, SessionStore),
    ) {
        let (storage, store) = signed_in;
        let cleared = SessionExpiryPolicy::ClearSession
            .reconcile(&store, &AuthorityError::Unauthenticated { message: None });
        assert!(cleared);
        assert!(!store.is_authenticated());
        assert!(storage.stored().is_none());
    }

    #[rstest]
    fn keep_policy_preserves_session(signed_in: (Arc<MemorySessionStorage>, SessionStore)) {
        let (_, store) = signed_in;
        let cleared = SessionExpiryPolicy::KeepSession
            .reconcile(&store, &AuthorityError::Unauthenticated { message: None });
        assert!(!cleared);
        assert!(store.is_authenticated());
    }

    #[rstest]
    fn other_failures_never_clear(signed_in: (Arc<MemorySessionStorage>, SessionStore)) {
        let (_, store) = signed_in;
        let cleared = SessionExpiryPolicy::ClearSession.reconcile(
            &store,
            &AuthorityError::Rejected {
                status: 403,
                message: None,
            },
        );
        assert!(!cleared);
        assert!(store.is_authenticated());
    }

    #[rstest]
    #[case(AuthorityError::Unauthenticated { message: None }, ErrorCode::Unauthorized, "fallback")]
    #[case(AuthorityError::Rejected { status: 400, message: Some("Out of stock".to_owned()) }, ErrorCode::Rejected, "Out of stock")]
    #[case(AuthorityError::timeout("15s"), ErrorCode::Unavailable, "fallback")]
    fn maps_authority_failures(
        #[case] error: AuthorityError,
        #[case] code: ErrorCode,
        #[case] message: &str,
    ) {
        let mapped = authority_error(&error, "fallback");
        assert_eq!(mapped.code(), code);
        assert_eq!(mapped.message(), message);
    }

    #[rstest]
    #[case(false, SessionExpiryPolicy::ClearSession)]
    #[case(true, SessionExpiryPolicy::KeepSession)]
    fn keep_flag_selects_policy(#[case] keep: bool, #[case] expected: SessionExpiryPolicy) {
        assert_eq!(SessionExpiryPolicy::from_keep_flag(keep), expected);
    }
}
