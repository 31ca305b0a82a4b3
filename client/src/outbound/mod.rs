//! Driven adapters: the HTTP authority, durable session storage, the tokio
//! debounce scheduler, the in-process location and the console notifier.

pub mod http;
pub mod location;
pub mod notifier;
pub mod scheduler;
pub mod storage;

pub use self::http::HttpSweetsAuthority;
pub use self::location::{Address, HistoryLocation};
pub use self::notifier::ConsoleNotifier;
pub use self::scheduler::TokioDebounceScheduler;
pub use self::storage::{FileSessionStorage, SESSION_FILE_NAME};
