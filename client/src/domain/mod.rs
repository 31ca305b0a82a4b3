//! Domain primitives, services and ports.
//!
//! Purpose: hold the client's state orchestration independent of any
//! transport or terminal. Services talk to the outside world only through
//! the traits in [`ports`].
//!
//! Public surface:
//! - `SessionStore` (alias to `session::SessionStore`): who is logged in.
//! - `decide` (alias to `route_guard::decide`): access decisions for views.
//! - `SearchQuerySynchronizer`: debounced filter to location to fetch.
//! - `Catalogue`: displayed collection with stale-response discard.
//! - `InventoryMutationController`: create, update, delete, restock, buy.
//! - `AuthService`: login, registration and logout flows.

pub mod auth;
pub mod auth_service;
pub mod catalogue;
pub mod error;
pub mod identity;
pub mod item;
pub mod mutations;
pub mod ports;
pub mod route_guard;
pub mod search_filter;
pub mod search_sync;
pub mod session;
pub mod session_expiry;

pub use self::auth::{CredentialsValidationError, LoginCredentials, Registration};
pub use self::auth_service::AuthService;
pub use self::catalogue::{Catalogue, RefreshOutcome};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::identity::{Identity, IdentityValidationError, Role, UserId};
pub use self::item::{
    ImageAttachment, Item, ItemId, ItemIdValidationError, ItemPayload, Owner, RestockAmount,
    RestockAmountError,
};
pub use self::mutations::{
    FormField, FormValidationError, InventoryMutationController, ItemForm, MutationKind,
    MutationPorts, PendingRestock, UnknownFormField,
};
pub use self::route_guard::{GuardDecision, NavigationMenu, RequiredAccess, RouteTarget, decide};
pub use self::search_filter::{
    CanonicalQuery, CollectionQuery, SearchField, SearchFilter, UnknownSearchField,
};
pub use self::search_sync::{DEFAULT_DEBOUNCE, SearchQuerySynchronizer};
pub use self::session::{AuthToken, Session, SessionError, SessionStore};
pub use self::session_expiry::SessionExpiryPolicy;
