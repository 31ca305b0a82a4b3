//! Unit tests for the architecture lint.

use camino::Utf8PathBuf;
use rstest::fixture;
use rstest::rstest;

use super::*;

#[derive(Clone, Copy)]
struct LintSingle;

impl LintSingle {
    fn lint(self, file: &str, contents: &str) -> Result<(), ArchitectureLintError> {
        lint_sources(&[LintSource {
            file: Utf8PathBuf::from(file),
            contents: contents.to_owned(),
        }])
    }
}

#[fixture]
fn lint_single() -> LintSingle {
    LintSingle
}

#[rstest]
#[case(
    "inbound/shell/mod.rs",
    "use crate::app::App; use crate::domain::RouteTarget; fn open(app: &App) { let _ = RouteTarget::Home; }",
    true
)]
#[case(
    "inbound/shell/mod.rs",
    "use crate::outbound::HttpSweetsAuthority; fn open() { let _ = HttpSweetsAuthority::new; }",
    false
)]
#[case(
    "inbound/shell/mod.rs",
    "use sweets_client::outbound::HistoryLocation; fn open() {}",
    false
)]
#[case("inbound/shell/render.rs", "use reqwest::Client; fn render() {}", false)]
#[case(
    "domain/catalogue/mod.rs",
    "use crate::outbound::storage::FileSessionStorage; fn load() {}",
    false
)]
#[case("domain/auth_service.rs", "use crate::app::App; fn wire() {}", false)]
#[case("domain/session.rs", "use cap_std::fs::Dir; fn save() {}", false)]
#[case(
    "domain/session.rs",
    "fn save() { let app = 1; let _ = app; }",
    true
)]
#[case("outbound/location.rs", "use crate::inbound::Shell; fn push() {}", false)]
#[case("outbound/notifier.rs", "use clap::Parser; fn notify() {}", false)]
#[case(
    "outbound/http/authority.rs",
    "use crate::domain::ports::SweetsAuthority; use reqwest::Client; fn send(_c: Client) {}",
    true
)]
fn detects_boundary_violations(
    lint_single: LintSingle,
    #[case] file: &str,
    #[case] contents: &str,
    #[case] ok: bool,
) {
    let result = lint_single.lint(file, contents);
    assert_eq!(result.is_ok(), ok, "result: {result:?}");
}

#[rstest]
fn files_outside_the_layers_cannot_be_classified(lint_single: LintSingle) {
    let result = lint_single.lint("app.rs", "fn main() {}");
    assert!(matches!(result, Err(ArchitectureLintError::Parse { .. })));
}
