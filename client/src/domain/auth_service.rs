//! Login, registration and logout flows.
//!
//! Flows are serialized by one async lock so two logins cannot interleave
//! their session writes.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::ports::{LoginGrant, Notice, Notifier, SweetsAuthority};
use crate::domain::route_guard::RouteTarget;
use crate::domain::session_expiry::authority_error;
use crate::domain::{
    Error, LoginCredentials, Registration, Role, Session, SessionError, SessionStore,
};

const LOGIN_OK: &str = "Login successful!";
const LOGIN_FAILED: &str = "Invalid credentials";
const REGISTERED: &str = "Registered!";
const REGISTRATION_FAILED: &str = "Registration failed";
const LOGGED_OUT: &str = "Logged out successfully!";
const SESSION_NOT_SAVED: &str = "Could not save your session";

/// Authentication flows over the authority and the session store.
pub struct AuthService {
    authority: Arc<dyn SweetsAuthority>,
    session: Arc<SessionStore>,
    notifier: Arc<dyn Notifier>,
    flow: Mutex<()>,
}

impl AuthService {
    /// Create a service.
    #[must_use]
    pub fn new(
        authority: Arc<dyn SweetsAuthority>,
        session: Arc<SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            authority,
            session,
            notifier,
            flow: Mutex::new(()),
        }
    }

    /// Sign in and return the view to land on.
    ///
    /// The session is written only when the authority returned both a token
    /// and a user.
    pub async fn login(&self, email: &str, password: &str) -> Result<RouteTarget, Error> {
        let credentials = LoginCredentials::try_from_parts(email, password)
            .map_err(|err| self.fail(Error::invalid_request(err.to_string())))?;
        let _flow = self.flow.lock().await;

        let grant = match self.authority.login(&credentials).await {
            Ok(grant) => grant,
            Err(err) => {
                warn!(error = %err, kind = err.kind(), "login refused");
                return Err(self.fail(authority_error(&err, LOGIN_FAILED)));
            }
        };
        let LoginGrant {
            message,
            token,
            user,
        } = grant;
        let (Some(token), Some(user)) = (token, user) else {
            warn!("login response lacked a token or user");
            let text = grant_message(message.as_deref()).unwrap_or(LOGIN_FAILED);
            return Err(self.fail(Error::rejected(text)));
        };

        let landing = if user.role() == Role::Admin {
            RouteTarget::Admin
        } else {
            RouteTarget::Home
        };
        self.session
            .store(Session::new(token, user))
            .map_err(|err| self.session_failure(&err))?;
        self.notifier.notify(Notice::success(
            grant_message(message.as_deref()).unwrap_or(LOGIN_OK),
        ));
        Ok(landing)
    }

    /// Create an account and return the view to land on.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<RouteTarget, Error> {
        let registration = Registration::try_from_parts(name, email, password, role)
            .map_err(|err| self.fail(Error::invalid_request(err.to_string())))?;
        let _flow = self.flow.lock().await;

        match self.authority.register(&registration).await {
            Ok(ack) => {
                info!(%role, "account registered");
                self.notifier
                    .notify(Notice::success(ack.text().unwrap_or(REGISTERED)));
                Ok(RouteTarget::Login)
            }
            Err(err) => {
                warn!(error = %err, kind = err.kind(), "registration refused");
                Err(self.fail(authority_error(&err, REGISTRATION_FAILED)))
            }
        }
    }

    /// Clear the session and return the view to land on.
    pub async fn logout(&self) -> Result<RouteTarget, Error> {
        let _flow = self.flow.lock().await;
        self.session
            .clear()
            .map_err(|err| self.session_failure(&err))?;
        self.notifier.notify(Notice::success(LOGGED_OUT));
        Ok(RouteTarget::Login)
    }

    fn session_failure(&self, err: &SessionError) -> Error {
        warn!(error = %err, "session write failed");
        self.fail(Error::internal(SESSION_NOT_SAVED))
    }

    fn fail(&self, error: Error) -> Error {
        self.notifier.notify(Notice::error(error.message()));
        error
    }
}

fn grant_message(message: Option<&str>) -> Option<&str> {
    message.map(str::trim).filter(|text| !text.is_empty())
}
