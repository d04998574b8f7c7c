//! Suite configuration.
//!
//! Values come from plain parameters (the CLI) or from `WSPROBE_*`
//! environment variables with defaults. Unset or blank variables take the
//! default; set but invalid ones are an error, same as on the command line.

use std::time::Duration;

use frames::{CodecError, Encoding};
use wsclient::DEFAULT_RECEIVE_TIMEOUT;

/// Endpoint the suite targets when nothing else is configured.
pub const DEFAULT_WS_URL: &str = "ws://localhost:8080/ws";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid WSPROBE_TIMEOUT_SECS {0:?}; expected a positive number of seconds")]
    InvalidTimeout(String),
    #[error("invalid WSPROBE_ENCODING: {0}")]
    InvalidEncoding(#[from] CodecError),
}

/// Runtime configuration for a suite run.
#[derive(Clone, Debug, PartialEq)]
pub struct SuiteConfig {
    /// WebSocket address every scenario connects to in `setup`.
    pub ws_url: String,
    /// Deadline for a single receive.
    pub receive_timeout: Duration,
    /// Encoding used for outbound records.
    pub encoding: Encoding,
    /// HTTP URL probed before the run, if set.
    pub health_url: Option<String>,
    /// Case-insensitive subject substring; non-matching scenarios are skipped.
    pub filter: Option<String>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_owned(),
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
            encoding: Encoding::Json,
            health_url: None,
            filter: None,
        }
    }
}

impl SuiteConfig {
    /// Load suite config from `WSPROBE_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the timeout or encoding is set to a value
    /// that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Same as [`SuiteConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
        };
        let defaults = Self::default();

        let receive_timeout = match get("WSPROBE_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .and_then(timeout_from_secs)
                .ok_or(ConfigError::InvalidTimeout(raw))?,
            None => defaults.receive_timeout,
        };
        let encoding = match get("WSPROBE_ENCODING") {
            Some(raw) => raw.parse::<Encoding>()?,
            None => defaults.encoding,
        };

        Ok(Self {
            ws_url: get("WSPROBE_URL").unwrap_or(defaults.ws_url),
            receive_timeout,
            encoding,
            health_url: get("WSPROBE_HEALTH_URL"),
            filter: get("WSPROBE_FILTER"),
        })
    }

    /// Whether a scenario with `subject` passes the configured filter.
    #[must_use]
    pub fn selects(&self, subject: &str) -> bool {
        self.filter.as_deref().is_none_or(|needle| {
            subject
                .to_ascii_lowercase()
                .contains(&needle.to_ascii_lowercase())
        })
    }
}

/// Convert fractional seconds into a receive deadline. Zero, negative, and
/// non-finite values are rejected.
#[must_use]
pub fn timeout_from_secs(secs: f64) -> Option<Duration> {
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
