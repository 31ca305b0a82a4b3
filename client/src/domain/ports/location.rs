//! Port for the shareable location (path plus query string).

/// Address bar abstraction.
#[cfg_attr(test, mockall::automock)]
pub trait Location: Send + Sync {
    /// Current path, for example `/admin`.
    fn current_path(&self) -> String;

    /// Current query string without the leading `?`.
    fn current_query(&self) -> String;

    /// Navigate to `path` with `query`, recording a history entry.
    fn push(&self, path: &str, query: &str);
}
