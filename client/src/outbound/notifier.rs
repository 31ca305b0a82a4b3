//! Notifier that writes notices as lines of text.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use tracing::warn;

use crate::domain::ports::{Notice, NoticeLevel, Notifier};

/// Writes each notice as `✓ message` or `✗ message`.
pub struct ConsoleNotifier<W> {
    out: Mutex<W>,
}

impl ConsoleNotifier<io::Stdout> {
    /// Notifier printing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleNotifier<W> {
    /// Notifier writing to `out`.
    #[must_use]
    pub const fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Recover the writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Notifier for ConsoleNotifier<W> {
    fn notify(&self, notice: Notice) {
        let marker = match notice.level {
            NoticeLevel::Success => '✓',
            NoticeLevel::Error => '✗',
        };
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = writeln!(out, "{marker} {notice}").and_then(|()| out.flush()) {
            warn!(error = %err, message = %notice, "notice could not be written");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_line_per_notice() {
        let notifier = ConsoleNotifier::new(Vec::new());

        notifier.notify(Notice::success("Sweet added!"));
        notifier.notify(Notice::error("Failed to restock"));

        let text = String::from_utf8(notifier.into_inner()).expect("utf-8");
        assert_eq!(text, "✓ Sweet added!\n✗ Failed to restock\n");
    }
}
