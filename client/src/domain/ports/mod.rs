//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod debounce_scheduler;
mod location;
mod notifier;
mod session_storage;
mod sweets_authority;

pub use debounce_scheduler::{DebounceScheduler, TimerHandle};
#[cfg(test)]
pub use location::MockLocation;
pub use location::Location;
#[cfg(test)]
pub use notifier::MockNotifier;
pub use notifier::{Notice, NoticeLevel, Notifier};
#[cfg(test)]
pub use session_storage::MockSessionStorage;
pub use session_storage::{MemorySessionStorage, SessionStorage, SessionStorageError};
pub use sweets_authority::{
    Acknowledgement, AuthorityError, LoginGrant, SweetsAuthority,
};
