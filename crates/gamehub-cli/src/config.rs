//! Runner configuration.
//!
//! Configuration is loaded from environment variables. The bearer token is
//! redacted in Debug output.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default portal API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Default portal origin used for watch links.
pub const DEFAULT_ORIGIN: &str = "http://localhost:5173";

/// Default frame period in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 16;

/// Default HTTP request timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Runner configuration.
#[derive(Clone)]
pub struct Config {
    /// Portal API base URL (token, score and leaderboard services).
    pub api_url: String,

    /// Bearer token of the signed-in player, if any.
    pub auth_token: Option<String>,

    /// Portal origin for watch links.
    pub origin: String,

    /// Score frame period.
    pub tick_interval: Duration,

    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("origin", &self.origin)
            .field("tick_interval", &self.tick_interval)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid API URL: {0}")]
    InvalidApiUrl(String),

    #[error("Invalid origin: {0}")]
    InvalidOrigin(String),

    #[error("Invalid tick interval: {0}")]
    InvalidTickInterval(String),

    #[error("Invalid HTTP timeout: {0}")]
    InvalidHttpTimeout(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let api_url = vars
            .get("GAMEHUB_API_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Url::parse(&api_url).map_err(|e| {
            ConfigError::InvalidApiUrl(format!(
                "GAMEHUB_API_URL must be an absolute URL, got '{api_url}': {e}"
            ))
        })?;

        let auth_token = vars
            .get("GAMEHUB_AUTH_TOKEN")
            .filter(|token| !token.is_empty())
            .cloned();

        let origin = vars
            .get("GAMEHUB_ORIGIN")
            .cloned()
            .unwrap_or_else(|| DEFAULT_ORIGIN.to_string());
        Url::parse(&origin).map_err(|e| {
            ConfigError::InvalidOrigin(format!(
                "GAMEHUB_ORIGIN must be an absolute URL, got '{origin}': {e}"
            ))
        })?;

        let tick_ms = parse_positive(vars, "GAMEHUB_TICK_INTERVAL_MS", DEFAULT_TICK_INTERVAL_MS)
            .map_err(ConfigError::InvalidTickInterval)?;

        let timeout_secs = parse_positive(
            vars,
            "GAMEHUB_HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        )
        .map_err(ConfigError::InvalidHttpTimeout)?;

        Ok(Config {
            api_url,
            auth_token,
            origin,
            tick_interval: Duration::from_millis(tick_ms),
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_positive(vars: &HashMap<String, String>, key: &str, default: u64) -> Result<u64, String> {
    let Some(raw) = vars.get(key) else {
        return Ok(default);
    };
    let value: u64 = raw
        .parse()
        .map_err(|e| format!("{key} must be a positive integer, got '{raw}': {e}"))?;
    if value == 0 {
        return Err(format!("{key} must be greater than 0"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_from_vars_applies_defaults() {
        let config = Config::from_vars(&HashMap::new()).unwrap();

        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.origin, DEFAULT_ORIGIN);
        assert!(config.auth_token.is_none());
        assert_eq!(config.tick_interval, Duration::from_millis(16));
        assert_eq!(config.http_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_from_vars_reads_overrides() {
        let config = Config::from_vars(&vars(&[
            ("GAMEHUB_API_URL", "https://api.gamehub.example"),
            ("GAMEHUB_AUTH_TOKEN", "player-jwt"),
            ("GAMEHUB_ORIGIN", "https://gamehub.example"),
            ("GAMEHUB_TICK_INTERVAL_MS", "33"),
            ("GAMEHUB_HTTP_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "https://api.gamehub.example");
        assert_eq!(config.auth_token.as_deref(), Some("player-jwt"));
        assert_eq!(config.origin, "https://gamehub.example");
        assert_eq!(config.tick_interval, Duration::from_millis(33));
        assert_eq!(config.http_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_empty_auth_token_is_none() {
        let config = Config::from_vars(&vars(&[("GAMEHUB_AUTH_TOKEN", "")])).unwrap();

        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_zero_tick_interval_is_rejected() {
        let result = Config::from_vars(&vars(&[("GAMEHUB_TICK_INTERVAL_MS", "0")]));

        assert!(matches!(result, Err(ConfigError::InvalidTickInterval(_))));
    }

    #[test]
    fn test_non_numeric_timeout_is_rejected() {
        let result = Config::from_vars(&vars(&[("GAMEHUB_HTTP_TIMEOUT_SECS", "soon")]));

        assert!(matches!(result, Err(ConfigError::InvalidHttpTimeout(_))));
    }

    #[test]
    fn test_relative_api_url_is_rejected() {
        let result = Config::from_vars(&vars(&[("GAMEHUB_API_URL", "/api")]));

        assert!(matches!(result, Err(ConfigError::InvalidApiUrl(_))));
    }

    #[test]
    fn test_debug_redacts_auth_token() {
        let config = Config::from_vars(&vars(&[("GAMEHUB_AUTH_TOKEN", "player-jwt")])).unwrap();

        let debug = format!("{config:?}");

        assert!(!debug.contains("player-jwt"));
        assert!(debug.contains("[REDACTED]"));
    }
}
