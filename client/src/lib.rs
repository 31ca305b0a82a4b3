//! Client orchestration for the sweets shop.
//!
//! The domain holds the session, route guard, search synchronizer and
//! inventory mutations behind ports. Outbound adapters talk to the REST
//! service, the state directory and the tokio timer; the inbound shell
//! drives everything one command line at a time.

pub mod app;
pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use app::{App, StartupError};
pub use config::ClientSettings;
