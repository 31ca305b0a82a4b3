//! Client configuration loaded via OrthoConfig.
//!
//! Every value can come from CLI flags, `SWEETS_*` environment variables or a
//! config file. Missing values fall back to the defaults exposed by the
//! accessor methods.

use std::time::Duration;

use camino::Utf8PathBuf;
use mockable::Env;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::{DEFAULT_DEBOUNCE, SessionExpiryPolicy};

const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const STATE_DIR_SUFFIX: &str = ".local/state/sweets";
const FALLBACK_STATE_DIR: &str = ".sweets";

/// Errors raised while interpreting settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The base URL does not parse or cannot carry a path.
    #[error("invalid base URL '{value}': {reason}")]
    InvalidBaseUrl {
        /// Configured text.
        value: String,
        /// Why it was refused.
        reason: String,
    },
    /// A duration was configured as zero.
    #[error("{name} must be greater than zero")]
    ZeroDuration {
        /// Setting name.
        name: &'static str,
    },
}

/// Configuration for the sweets shell.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SWEETS")]
pub struct ClientSettings {
    /// Authority base URL, for example `http://localhost:3000/api`.
    pub base_url: Option<String>,
    /// Directory holding `session.json`.
    pub state_dir: Option<String>,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: Option<u64>,
    /// Search debounce window in milliseconds.
    pub debounce_ms: Option<u64>,
    /// Keep the session when the authority rejects it.
    #[ortho_config(default = false)]
    pub keep_session_on_rejection: bool,
    /// Keep the session in memory only.
    #[ortho_config(default = false)]
    pub ephemeral_session: bool,
}

impl ClientSettings {
    /// Parsed authority base URL.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidBaseUrl`] for unparsable URLs and for
    /// URLs such as `mailto:` that cannot carry a path.
    pub fn base_url(&self) -> Result<Url, SettingsError> {
        let raw = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let url = Url::parse(raw).map_err(|err| SettingsError::InvalidBaseUrl {
            value: raw.to_owned(),
            reason: err.to_string(),
        })?;
        if url.cannot_be_a_base() {
            return Err(SettingsError::InvalidBaseUrl {
                value: raw.to_owned(),
                reason: "URL cannot carry a path".to_owned(),
            });
        }
        Ok(url)
    }

    /// State directory, defaulting to `$HOME/.local/state/sweets`.
    #[must_use]
    pub fn state_dir<E: Env>(&self, env: &E) -> Utf8PathBuf {
        self.state_dir.as_deref().map_or_else(
            || {
                env.string("HOME")
                    .filter(|home| !home.trim().is_empty())
                    .map_or_else(
                        || Utf8PathBuf::from(FALLBACK_STATE_DIR),
                        |home| Utf8PathBuf::from(home).join(STATE_DIR_SUFFIX),
                    )
            },
            Utf8PathBuf::from,
        )
    }

    /// HTTP request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ZeroDuration`] when configured as zero.
    pub fn request_timeout(&self) -> Result<Duration, SettingsError> {
        positive_millis(
            "request_timeout_ms",
            self.request_timeout_ms,
            DEFAULT_REQUEST_TIMEOUT,
        )
    }

    /// Search debounce window.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ZeroDuration`] when configured as zero.
    pub fn debounce(&self) -> Result<Duration, SettingsError> {
        positive_millis("debounce_ms", self.debounce_ms, DEFAULT_DEBOUNCE)
    }

    /// What to do with the session when the authority rejects it.
    #[must_use]
    pub const fn expiry_policy(&self) -> SessionExpiryPolicy {
        SessionExpiryPolicy::from_keep_flag(self.keep_session_on_rejection)
    }
}

fn positive_millis(
    name: &'static str,
    configured: Option<u64>,
    default: Duration,
) -> Result<Duration, SettingsError> {
    match configured {
        Some(0) => Err(SettingsError::ZeroDuration { name }),
        Some(millis) => Ok(Duration::from_millis(millis)),
        None => Ok(default),
    }
}
