//! Composition root.
//!
//! Wires the domain services to their adapters and owns view navigation:
//! guard the requested view, move the location, load the view's collection.

use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use mockable::Env;
use thiserror::Error;
use tokio::runtime::TryCurrentError;
use tracing::info;

use crate::config::{ClientSettings, SettingsError};
use crate::domain::ports::{
    DebounceScheduler, Location, MemorySessionStorage, Notice, Notifier, SessionStorage,
    SessionStorageError, SweetsAuthority,
};
use crate::domain::{
    AuthService, Catalogue, CollectionQuery, Error, ErrorCode, GuardDecision,
    InventoryMutationController, MutationPorts, RouteTarget, SearchQuerySynchronizer,
    SessionError, SessionExpiryPolicy, SessionStore,
};
use crate::outbound::{
    FileSessionStorage, HistoryLocation, HttpSweetsAuthority, TokioDebounceScheduler,
};

/// Failures that stop the client from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Settings could not be interpreted.
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// The state directory is unusable.
    #[error(transparent)]
    Storage(#[from] SessionStorageError),
    /// The stored session could not be hydrated.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    /// No tokio runtime to schedule debounce countdowns on.
    #[error("debounce scheduler needs a tokio runtime: {0}")]
    Runtime(#[from] TryCurrentError),
}

/// Adapters the services run against.
pub struct AppPorts {
    /// Remote REST service.
    pub authority: Arc<dyn SweetsAuthority>,
    /// Durable session home.
    pub storage: Arc<dyn SessionStorage>,
    /// Debounce countdowns.
    pub scheduler: Arc<dyn DebounceScheduler>,
    /// Address bar.
    pub location: Arc<HistoryLocation>,
    /// Notice sink.
    pub notifier: Arc<dyn Notifier>,
}

/// Behaviour knobs.
#[derive(Debug, Clone, Copy)]
pub struct AppOptions {
    /// Search debounce window.
    pub debounce: Duration,
    /// Session handling on authority rejection.
    pub expiry: SessionExpiryPolicy,
}

/// The assembled client.
pub struct App {
    session: Arc<SessionStore>,
    auth: AuthService,
    catalogue: Catalogue,
    search: SearchQuerySynchronizer,
    mutations: InventoryMutationController,
    location: Arc<HistoryLocation>,
    notifier: Arc<dyn Notifier>,
}

impl App {
    /// Wire services to `ports`, hydrating the session from storage.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the stored session cannot be read for a
    /// reason other than corruption.
    pub fn assemble(ports: AppPorts, options: AppOptions) -> Result<Self, SessionError> {
        let AppPorts {
            authority,
            storage,
            scheduler,
            location,
            notifier,
        } = ports;
        let session = Arc::new(SessionStore::initialize(storage)?);
        let catalogue = Catalogue::new(Arc::clone(&authority), Arc::clone(&session), options.expiry);
        let search = SearchQuerySynchronizer::new(
            Arc::clone(&location) as Arc<dyn Location>,
            scheduler,
            catalogue.clone(),
            options.debounce,
        );
        let mutations = InventoryMutationController::new(
            MutationPorts {
                authority: Arc::clone(&authority),
                session: Arc::clone(&session),
                catalogue: catalogue.clone(),
                notifier: Arc::clone(&notifier),
            },
            options.expiry,
        );
        let auth = AuthService::new(authority, Arc::clone(&session), Arc::clone(&notifier));
        Ok(Self {
            session,
            auth,
            catalogue,
            search,
            mutations,
            location,
            notifier,
        })
    }

    /// Build the production client from settings.
    ///
    /// Must be called from inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError`] when settings are invalid, the state
    /// directory is unusable or the HTTP client cannot be built.
    pub fn from_settings<E: Env>(
        settings: &ClientSettings,
        env: &E,
        location: Arc<HistoryLocation>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, StartupError> {
        let authority = HttpSweetsAuthority::new(settings.base_url()?, settings.request_timeout()?)?;
        let storage: Arc<dyn SessionStorage> = if settings.ephemeral_session {
            Arc::new(MemorySessionStorage::default())
        } else {
            let root = settings.state_dir(env);
            info!(state_dir = %root, "using durable session storage");
            Arc::new(FileSessionStorage::open(&root)?)
        };
        let ports = AppPorts {
            authority: Arc::new(authority),
            storage,
            scheduler: Arc::new(TokioDebounceScheduler::current()?),
            location,
            notifier,
        };
        let options = AppOptions {
            debounce: settings.debounce()?,
            expiry: settings.expiry_policy(),
        };
        Ok(Self::assemble(ports, options)?)
    }

    /// Session store.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Authentication flows.
    #[must_use]
    pub const fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// Displayed collection.
    #[must_use]
    pub const fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Search filter synchronizer.
    #[must_use]
    pub const fn search(&self) -> &SearchQuerySynchronizer {
        &self.search
    }

    /// Inventory mutations.
    #[must_use]
    pub const fn mutations(&self) -> &InventoryMutationController {
        &self.mutations
    }

    /// Address bar.
    #[must_use]
    pub fn location(&self) -> &HistoryLocation {
        &self.location
    }

    /// View the location currently shows.
    #[must_use]
    pub fn current_view(&self) -> Option<RouteTarget> {
        RouteTarget::from_path(&self.location.current_path())
    }

    /// Open `requested`, following the guard's redirect if access is denied.
    ///
    /// Returns the view actually shown. A failed collection load is notified
    /// and leaves the previous items on display.
    pub async fn navigate(&self, requested: RouteTarget) -> RouteTarget {
        let target = match self.session.guard(requested.required_access()) {
            GuardDecision::Allow => requested,
            GuardDecision::RedirectTo(redirect) => {
                info!(%requested, %redirect, "view access redirected");
                redirect
            }
        };
        self.search.forget_push();
        let fetch = match target {
            RouteTarget::Home => {
                let query = self.search.filter().canonical_query();
                self.location.push(target.path(), query.as_str());
                Some(
                    self.catalogue
                        .refresh(CollectionQuery::Storefront(query))
                        .boxed(),
                )
            }
            RouteTarget::Admin => {
                self.location.push(target.path(), "");
                Some(self.catalogue.show_owned_by(self.session.identity().as_ref()))
            }
            RouteTarget::Login | RouteTarget::Register => {
                self.location.push(target.path(), "");
                None
            }
        };
        if let Some(load) = fetch
            && let Err(err) = load.await
            && let Some(landing) = self.report(&err)
        {
            return landing;
        }
        target
    }

    /// Notify `err`, then land on the login view if it dropped the session.
    pub fn report(&self, err: &Error) -> Option<RouteTarget> {
        self.notifier.notify(Notice::error(err.message()));
        self.after_failure(err)
    }

    /// Land on the login view when `err` dropped the session.
    ///
    /// Returns the view shown, or `None` when nothing changed.
    pub fn after_failure(&self, err: &Error) -> Option<RouteTarget> {
        if err.code() != ErrorCode::Unauthorized || self.session.is_authenticated() {
            return None;
        }
        info!("session ended; returning to login");
        self.search.forget_push();
        self.location.push(RouteTarget::Login.path(), "");
        Some(RouteTarget::Login)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::AuthorityError;
    use crate::domain::{Role, UserId};
    use crate::test_support::{AppFixture, AuthorityCall, Endpoint, assemble_app};
    use rstest::rstest;

    fn harness(role: Option<Role>) -> AppFixture {
        assemble_app("/?category=candy", role).expect("fixture app")
    }

    #[rstest]
    #[case(None, RouteTarget::Admin, RouteTarget::Login)]
    #[case(None, RouteTarget::Home, RouteTarget::Login)]
    #[case(Some(Role::User), RouteTarget::Admin, RouteTarget::Home)]
    #[case(Some(Role::Admin), RouteTarget::Admin, RouteTarget::Admin)]
    #[case(Some(Role::User), RouteTarget::Register, RouteTarget::Register)]
    #[tokio::test]
    async fn navigation_follows_the_guard(
        #[case] role: Option<Role>,
        #[case] requested: RouteTarget,
        #[case] expected: RouteTarget,
    ) {
        let harness = harness(role);

        let landed = harness.app.navigate(requested).await;

        assert_eq!(landed, expected);
        assert_eq!(harness.app.current_view(), Some(expected));
    }

    #[tokio::test]
    async fn home_keeps_the_filter_in_the_location_and_loads_it() {
        let harness = harness(Some(Role::User));

        harness.app.navigate(RouteTarget::Home).await;

        assert_eq!(harness.app.location().current().href(), "/?category=candy");
        let Some(AuthorityCall::ListItems { query, .. }) =
            harness.authority.last_call(Endpoint::ListItems)
        else {
            panic!("storefront should be listed");
        };
        assert_eq!(
            query,
            CollectionQuery::Storefront(harness.app.search().filter().canonical_query())
        );
        assert_eq!(harness.app.catalogue().items().len(), 2);
    }

    #[tokio::test]
    async fn admin_view_loads_owned_items() {
        let harness = harness(Some(Role::Admin));

        harness.app.navigate(RouteTarget::Admin).await;

        assert_eq!(
            harness.app.catalogue().scope(),
            Some(CollectionQuery::OwnedBy(UserId::new("u1").expect("id")))
        );
    }

    #[tokio::test]
    async fn rejected_session_during_load_lands_on_login() {
        let harness = harness(Some(Role::User));
        harness.authority.push_list(Err(AuthorityError::Unauthenticated {
            message: Some("Token expired".to_owned()),
        }));

        let landed = harness.app.navigate(RouteTarget::Home).await;

        assert_eq!(landed, RouteTarget::Login);
        assert!(!harness.app.session().is_authenticated());
        assert_eq!(harness.notifier.messages(), vec!["Token expired".to_owned()]);
    }
}
