//! Repo-local lint that keeps the client's hexagon intact.
//!
//! The sweets client keeps its orchestration logic in `domain` (services and
//! the ports they depend on), talks to the world through `outbound` adapters
//! and is driven by the `inbound` shell. This crate parses every source file
//! under those three directories and rejects:
//!
//! - `domain` code that reaches for adapter modules or for the HTTP, file
//!   system, CLI or configuration crates the adapters wrap
//! - `inbound` code that imports `outbound` modules or the HTTP client
//! - `outbound` code that imports `inbound` modules or the CLI parser
//!
//! Composition happens in `app.rs`, which sits outside the linted layers.

use std::collections::BTreeSet;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use syn::visit::Visit;
use thiserror::Error;

/// Library name the client's integration code imports itself by.
const CLIENT_CRATE: &str = "sweets_client";

/// Layer directories under `client/src`, in lint order.
const LAYER_DIRS: [&str; 3] = ["domain", "inbound", "outbound"];

/// A single boundary violation discovered by the linter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{file}: {message}")]
pub struct Violation {
    /// File path relative to `client/src`.
    pub file: Utf8PathBuf,
    /// Human-readable description of the violated rule.
    pub message: String,
}

/// Failure modes returned by the architecture lint.
#[derive(Debug, Error)]
pub enum ArchitectureLintError {
    /// Filesystem traversal or reading failed.
    #[error("I/O error while linting architecture: {0}")]
    Io(#[from] io::Error),
    /// Rust source parsing failed.
    #[error("failed to parse {file} while linting architecture: {message}")]
    Parse {
        /// File that failed, relative to `client/src`.
        file: Utf8PathBuf,
        /// Parser or traversal diagnostic.
        message: String,
    },
    /// One or more boundary violations were found.
    #[error("architecture boundary violations:\n{}", bullet_list(.0))]
    Violations(Vec<Violation>),
}

fn bullet_list(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|violation| format!("- {violation}\n"))
        .collect()
}

/// Lint the client crate sources on disk.
///
/// `client_dir` must be the `client/` directory at the repository root.
pub fn lint_client_sources(client_dir: &Utf8Path) -> Result<(), ArchitectureLintError> {
    let src = Dir::open_ambient_dir(client_dir.join("src"), ambient_authority())?;
    let sources = collect_lint_sources(&src)?;
    lint_sources(&sources)
}

/// Lint the provided Rust sources. Intended for unit and behaviour tests.
pub fn lint_sources(sources: &[LintSource]) -> Result<(), ArchitectureLintError> {
    let mut violations = Vec::new();

    for source in sources {
        let layer = ModuleLayer::infer_from_path(&source.file).ok_or_else(|| {
            ArchitectureLintError::Parse {
                file: source.file.clone(),
                message: "unable to infer module layer from file path".to_owned(),
            }
        })?;
        let parsed =
            syn::parse_file(&source.contents).map_err(|err| ArchitectureLintError::Parse {
                file: source.file.clone(),
                message: err.to_string(),
            })?;
        violations.extend(lint_parsed_source(&source.file, layer, &parsed));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ArchitectureLintError::Violations(violations))
    }
}

/// A Rust source file to be linted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSource {
    /// Path relative to `client/src`.
    pub file: Utf8PathBuf,
    /// Rust source text.
    pub contents: String,
}

/// The architectural layer inferred from a file path under `client/src`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModuleLayer {
    Domain,
    Inbound,
    Outbound,
}

impl ModuleLayer {
    fn infer_from_path(relative_path: &Utf8Path) -> Option<Self> {
        match relative_path.components().next()?.as_str() {
            "domain" => Some(Self::Domain),
            "inbound" => Some(Self::Inbound),
            "outbound" => Some(Self::Outbound),
            _ => None,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }

    fn forbidden_modules(self) -> &'static [&'static str] {
        match self {
            Self::Domain => &["app", "inbound", "outbound"],
            Self::Inbound => &["outbound"],
            Self::Outbound => &["app", "inbound"],
        }
    }

    fn forbidden_crates(self) -> &'static [&'static str] {
        match self {
            Self::Domain => &[
                "camino",
                "cap_std",
                "clap",
                "color_eyre",
                "ortho_config",
                "reqwest",
                "tracing_subscriber",
            ],
            Self::Inbound => &["reqwest", "serde_json", "tracing_subscriber"],
            Self::Outbound => &["clap", "color_eyre"],
        }
    }

    fn judge(self, dependency: Dependency<'_>) -> Option<String> {
        let layer = self.name();
        match dependency {
            Dependency::Module(root) if self.forbidden_modules().contains(&root) => {
                Some(format!("{layer} module must not depend on crate::{root}"))
            }
            Dependency::Crate(root) if self.forbidden_crates().contains(&root) => {
                Some(format!("{layer} module must not depend on external crate `{root}`"))
            }
            Dependency::Module(_) | Dependency::Crate(_) => None,
        }
    }
}

/// What a path's leading segments point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dependency<'a> {
    /// A top-level module of the client crate.
    Module(&'a str),
    /// Another crate, or a local name that cannot be told apart from one.
    Crate(&'a str),
}

impl<'a> Dependency<'a> {
    fn classify(segments: &'a [String]) -> Option<Self> {
        let first = segments.first()?.as_str();
        match first {
            "crate" | "self" | "super" => segments
                .iter()
                .map(String::as_str)
                .find(|segment| !matches!(*segment, "crate" | "self" | "super"))
                .map(Self::Module),
            CLIENT_CRATE => segments.get(1).map(|segment| Self::Module(segment.as_str())),
            "domain" | "inbound" | "outbound" => Some(Self::Module(first)),
            _ => Some(Self::Crate(first)),
        }
    }
}

fn lint_parsed_source(file: &Utf8Path, layer: ModuleLayer, parsed: &syn::File) -> Vec<Violation> {
    let mut collector = PathCollector::default();
    collector.visit_file(parsed);

    collector
        .paths
        .iter()
        .filter_map(|segments| Dependency::classify(segments))
        .filter_map(|dependency| layer.judge(dependency))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|message| Violation {
            file: file.to_path_buf(),
            message,
        })
        .collect()
}

/// Every path spelled in a file, including each leaf of `use` trees.
#[derive(Default)]
struct PathCollector {
    paths: BTreeSet<Vec<String>>,
}

impl PathCollector {
    fn record_use_tree(&mut self, tree: &syn::UseTree, prefix: &mut Vec<String>) {
        let leaf = match tree {
            syn::UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.record_use_tree(&path.tree, prefix);
                prefix.pop();
                return;
            }
            syn::UseTree::Group(group) => {
                for item in &group.items {
                    self.record_use_tree(item, prefix);
                }
                return;
            }
            syn::UseTree::Name(name) => name.ident.to_string(),
            syn::UseTree::Rename(rename) => rename.ident.to_string(),
            syn::UseTree::Glob(_) => "*".to_owned(),
        };
        let mut segments = prefix.clone();
        segments.push(leaf);
        self.paths.insert(segments);
    }
}

impl<'ast> Visit<'ast> for PathCollector {
    fn visit_path(&mut self, node: &'ast syn::Path) {
        let segments: Vec<String> = node
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect();
        if !segments.is_empty() {
            self.paths.insert(segments);
        }
        syn::visit::visit_path(self, node);
    }

    fn visit_item_use(&mut self, node: &'ast syn::ItemUse) {
        self.record_use_tree(&node.tree, &mut Vec::new());
    }
}

fn collect_lint_sources(src: &Dir) -> Result<Vec<LintSource>, ArchitectureLintError> {
    let mut sources = Vec::new();
    for layer_dir in LAYER_DIRS {
        if !src.is_dir(layer_dir) {
            continue;
        }
        let dir = src.open_dir(layer_dir)?;
        collect_sources_under(&dir, Utf8Path::new(layer_dir), &mut sources)?;
    }
    Ok(sources)
}

fn collect_sources_under(
    dir: &Dir,
    relative: &Utf8Path,
    sources: &mut Vec<LintSource>,
) -> Result<(), ArchitectureLintError> {
    for entry in dir.entries()? {
        let entry = entry?;
        let name = entry.file_name().into_string().map_err(|raw| {
            ArchitectureLintError::Parse {
                file: relative.to_path_buf(),
                message: format!("non UTF-8 file name {}", raw.to_string_lossy()),
            }
        })?;
        let path = relative.join(&name);
        if entry.file_type()?.is_dir() {
            collect_sources_under(&entry.open_dir()?, &path, sources)?;
            continue;
        }
        if path.extension() != Some("rs") {
            continue;
        }
        let contents = dir.read_to_string(&name)?;
        sources.push(LintSource {
            file: path,
            contents,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests;
