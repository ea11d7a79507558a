//! Client configuration.
//!
//! [`ClientConfig`] is built either in code with `with_*` setters or from
//! the environment:
//!
//! | Variable | Required | Default |
//! |----------|----------|---------|
//! | `QUILLSIGN_API_KEY` | yes | |
//! | `QUILLSIGN_BASE_URL` | no | [`DEFAULT_BASE_URL`] |
//! | `QUILLSIGN_CLIENT_ID` | no | none |
//! | `QUILLSIGN_TIMEOUT_SECS` | no | 30 |

use core::fmt;
use core::time::Duration;

/// Base URL of the hosted API.
pub const DEFAULT_BASE_URL: &str = "https://api.quillsign.com/v3";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "QUILLSIGN_API_KEY";
/// Environment variable overriding the base URL.
pub const BASE_URL_VAR: &str = "QUILLSIGN_BASE_URL";
/// Environment variable holding the embedded-flow client id.
pub const CLIENT_ID_VAR: &str = "QUILLSIGN_CLIENT_ID";
/// Environment variable overriding the timeout, in whole seconds.
pub const TIMEOUT_VAR: &str = "QUILLSIGN_TIMEOUT_SECS";

/// Errors raised while loading a [`ClientConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    /// A variable is set to an unusable value.
    #[error("invalid value for {var}: '{value}' ({reason})")]
    Invalid {
        /// The offending variable.
        var: &'static str,
        /// The value that was read.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

/// Connection settings for the signature API.
#[derive(Clone)]
pub struct ClientConfig {
    api_key: String,
    base_url: String,
    client_id: Option<String>,
    timeout: Duration,
}

impl ClientConfig {
    /// Creates a configuration for `api_key` with default settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client_id: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Loads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let api_key = read(API_KEY_VAR).ok_or(ConfigError::Missing(API_KEY_VAR))?;
        let mut config = Self::new(api_key);

        if let Some(base_url) = read(BASE_URL_VAR) {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(ConfigError::Invalid {
                    var: BASE_URL_VAR,
                    value: base_url,
                    reason: "expected an http(s) URL",
                });
            }
            config = config.with_base_url(base_url);
        }

        if let Some(client_id) = read(CLIENT_ID_VAR) {
            config = config.with_client_id(client_id);
        }

        if let Some(raw) = read(TIMEOUT_VAR) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    var: TIMEOUT_VAR,
                    value: raw.clone(),
                    reason: "expected a positive number of seconds",
                })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Sets the base URL. A trailing slash is ignored.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Sets the client id used by embedded flows.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns the base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the embedded-flow client id.
    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}
