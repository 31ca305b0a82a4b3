//! Access decisions for protected views.
//!
//! [`decide`] is pure and cheap; callers may evaluate it on every render.

use std::fmt;

use super::Session;

/// Access class a view requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequiredAccess {
    /// Anyone may view.
    Public,
    /// Any signed-in user.
    AuthenticatedAny,
    /// Signed-in administrators only.
    AuthenticatedAdmin,
}

/// Views the client can land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteTarget {
    /// Sign-in form.
    Login,
    /// Account creation form.
    Register,
    /// Storefront dashboard.
    Home,
    /// Inventory administration.
    Admin,
}

impl RouteTarget {
    /// Every view, in menu order.
    pub const ALL: [Self; 4] = [Self::Home, Self::Admin, Self::Login, Self::Register];

    /// Location path of the view.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Home => "/",
            Self::Admin => "/admin",
        }
    }

    /// Access the view requires.
    #[must_use]
    pub const fn required_access(self) -> RequiredAccess {
        match self {
            Self::Login | Self::Register => RequiredAccess::Public,
            Self::Home => RequiredAccess::AuthenticatedAny,
            Self::Admin => RequiredAccess::AuthenticatedAdmin,
        }
    }

    /// Resolve a view from its path.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|target| target.path() == path)
    }
}

impl fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Render the requested view.
    Allow,
    /// Navigate elsewhere instead.
    RedirectTo(RouteTarget),
}

/// Decide whether `session` may view something requiring `required`.
///
/// # Examples
/// ```
/// use sweets_client::domain::{GuardDecision, RequiredAccess, RouteTarget, decide};
///
/// assert_eq!(
///     decide(None, RequiredAccess::AuthenticatedAdmin),
///     GuardDecision::RedirectTo(RouteTarget::Login),
/// );
/// ```
#[must_use]
pub fn decide(session: Option<&Session>, required: RequiredAccess) -> GuardDecision {
    match (required, session) {
        (RequiredAccess::Public, _) => GuardDecision::Allow,
        (_, None) => GuardDecision::RedirectTo(RouteTarget::Login),
        (RequiredAccess::AuthenticatedAny, Some(_)) => GuardDecision::Allow,
        (RequiredAccess::AuthenticatedAdmin, Some(session)) if session.identity().is_admin() => {
            GuardDecision::Allow
        }
        (RequiredAccess::AuthenticatedAdmin, Some(_)) => GuardDecision::RedirectTo(RouteTarget::Home),
    }
}

/// Which navigation links a session sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationMenu {
    /// Link to the administration view.
    pub show_admin: bool,
    /// Login and register links.
    pub show_sign_in: bool,
    /// Logout control.
    pub show_logout: bool,
}

impl NavigationMenu {
    /// Derive the menu for the given session.
    #[must_use]
    pub fn for_session(session: Option<&Session>) -> Self {
        let signed_in = session.is_some();
        Self {
            show_admin: session.is_some_and(|s| s.identity().is_admin()),
            show_sign_in: !signed_in,
            show_logout: signed_in,
        }
    }
}
