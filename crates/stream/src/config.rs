use std::time::Duration;

use crate::reconnect::ReconnectPolicy;

/// Default control-plane endpoint.
pub const DEFAULT_URL: &str = "ws://localhost:8000/ws";

/// Default fixed delay between reconnect attempts, in milliseconds.
pub const DEFAULT_RECONNECT_INTERVAL_MS: u64 = 3000;

/// Default reconnect ceiling.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Client name announced in the handshake frame.
pub const DEFAULT_CLIENT_NAME: &str = "flowml-studio";

/// Client version announced in the handshake frame.
pub const DEFAULT_CLIENT_VERSION: &str = "1.0.0";

/// Event stream client configuration.
///
/// All fields have defaults suitable for a local control plane. Override
/// them in code or load them with [`StreamConfig::from_env`].
#[derive(Debug, Clone, PartialEq)]
pub struct StreamConfig {
    /// WebSocket endpoint (default: `ws://localhost:8000/ws`).
    pub url: String,
    /// Fixed delay before each reconnect attempt (default: 3 s).
    pub reconnect_interval: Duration,
    /// Reconnect ceiling (default: `5`).
    pub max_reconnect_attempts: u32,
    /// Name sent in the handshake (default: `flowml-studio`).
    pub client_name: String,
    /// Version sent in the handshake (default: `1.0.0`).
    pub client_version: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            reconnect_interval: Duration::from_millis(DEFAULT_RECONNECT_INTERVAL_MS),
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            client_version: DEFAULT_CLIENT_VERSION.to_string(),
        }
    }
}

impl StreamConfig {
    /// Config for `url` with every other field at its default.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                  |
    /// |---------------------------------|--------------------------|
    /// | `FLOWML_WS_URL`                 | `ws://localhost:8000/ws` |
    /// | `FLOWML_RECONNECT_INTERVAL_MS`  | `3000`                   |
    /// | `FLOWML_MAX_RECONNECT_ATTEMPTS` | `5`                      |
    /// | `FLOWML_CLIENT_NAME`            | `flowml-studio`          |
    /// | `FLOWML_CLIENT_VERSION`         | `1.0.0`                  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads values through
    /// `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("FLOWML_WS_URL").unwrap_or_else(|| DEFAULT_URL.into());
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(ConfigError::InvalidUrl(url));
        }

        let interval_ms: u64 = parse_var(
            &lookup,
            "FLOWML_RECONNECT_INTERVAL_MS",
            DEFAULT_RECONNECT_INTERVAL_MS,
        )?;

        let max_reconnect_attempts: u32 = parse_var(
            &lookup,
            "FLOWML_MAX_RECONNECT_ATTEMPTS",
            DEFAULT_MAX_RECONNECT_ATTEMPTS,
        )?;

        let client_name =
            lookup("FLOWML_CLIENT_NAME").unwrap_or_else(|| DEFAULT_CLIENT_NAME.into());
        let client_version =
            lookup("FLOWML_CLIENT_VERSION").unwrap_or_else(|| DEFAULT_CLIENT_VERSION.into());

        Ok(Self {
            url,
            reconnect_interval: Duration::from_millis(interval_ms),
            max_reconnect_attempts,
            client_name,
            client_version,
        })
    }

    /// Fixed-delay retry policy described by this config.
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::fixed(self.reconnect_interval, self.max_reconnect_attempts)
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
        None => Ok(default),
    }
}

/// Errors raised while loading [`StreamConfig`] from the environment.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("Endpoint must be a ws:// or wss:// URL, got {0:?}")]
    InvalidUrl(String),
}
