//! Client assembled over the in-memory doubles.

use std::sync::Arc;
use std::time::Duration;

use super::{FixtureError, ManualScheduler, RecordingNotifier, StubAuthority, item};
use crate::app::{App, AppOptions, AppPorts};
use crate::domain::ports::{MemorySessionStorage, Notifier, SweetsAuthority};
use crate::domain::{AuthToken, Identity, Role, Session, SessionExpiryPolicy};
use crate::outbound::HistoryLocation;

/// Handles on every double behind an assembled [`App`].
pub struct AppFixture {
    /// Scripted authority; lists Fudge and Toffee by default.
    pub authority: Arc<StubAuthority>,
    /// Session storage the app hydrated from.
    pub storage: Arc<MemorySessionStorage>,
    /// Debounce scheduler fired by the test.
    pub scheduler: Arc<ManualScheduler>,
    /// Every notice the app raised.
    pub notifier: Arc<RecordingNotifier>,
    /// The assembled client.
    pub app: App,
}

/// Ada (`u1`), with the given role.
///
/// # Errors
///
/// Returns [`FixtureError::Identity`] if the fixture id stops validating.
pub fn identity(role: Role) -> Result<Identity, FixtureError> {
    Ok(Identity::try_new("u1", "Ada", "ada@example.com", role)?)
}

/// A stored session for [`identity`] with token `t1`.
fn session(role: Role) -> Result<Session, FixtureError> {
    let token = AuthToken::new("t1").ok_or(FixtureError::Token)?;
    Ok(Session::new(token, identity(role)?))
}

/// Assemble a client whose location starts at `start`.
///
/// The authority lists Fudge (`a1`, three in stock) and Toffee (`a2`, sold
/// out). `signed_in` pre-populates the session storage.
///
/// # Errors
///
/// Returns [`FixtureError`] when fixture data fails validation or the
/// session store cannot hydrate.
pub fn assemble_app(start: &str, signed_in: Option<Role>) -> Result<AppFixture, FixtureError> {
    let authority = Arc::new(StubAuthority::new());
    authority.set_inventory(vec![item("a1", "Fudge", 3)?, item("a2", "Toffee", 0)?]);
    let stored = signed_in.map(session).transpose()?;
    let storage = Arc::new(stored.map_or_else(
        MemorySessionStorage::default,
        MemorySessionStorage::with_session,
    ));
    let scheduler = Arc::new(ManualScheduler::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let app = App::assemble(
        AppPorts {
            authority: Arc::clone(&authority) as Arc<dyn SweetsAuthority>,
            storage: Arc::clone(&storage) as _,
            scheduler: Arc::clone(&scheduler) as _,
            location: Arc::new(HistoryLocation::starting_at(start)),
            notifier: Arc::clone(&notifier) as Arc<dyn Notifier>,
        },
        AppOptions {
            debounce: Duration::from_millis(350),
            expiry: SessionExpiryPolicy::ClearSession,
        },
    )?;
    Ok(AppFixture {
        authority,
        storage,
        scheduler,
        notifier,
        app,
    })
}
