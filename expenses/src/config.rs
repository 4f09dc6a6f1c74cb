//! Configuration management for the expense tracker.
//!
//! Loads configuration from environment variables with sensible defaults.
//! The binary calls `dotenvy::dotenv()` first, so a `.env` file works too.

use std::env;
use std::time::Duration;
use thiserror::Error;

/// Base URL of the expense API
pub const API_URL_VAR: &str = "EXPENSES_API_URL";
/// Per-request timeout in whole seconds
pub const REQUEST_TIMEOUT_VAR: &str = "EXPENSES_REQUEST_TIMEOUT_SECS";
/// Window of the recent expenses screen in days
pub const RECENT_DAYS_VAR: &str = "EXPENSES_RECENT_DAYS";

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_RECENT_DAYS: u32 = 7;

/// Errors raised while loading configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but unusable
    #[error("Invalid value {value:?} for {var}: {reason}")]
    Invalid {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
        /// What is wrong with it
        reason: &'static str,
    },
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Expense API base URL, without trailing slash
    pub api_url: String,
    /// Per-request timeout; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
    /// Window of the recent expenses screen in days
    pub recent_days: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: None,
            recent_days: DEFAULT_RECENT_DAYS,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is set to an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(API_URL_VAR) {
            config = config.with_api_url(&url)?;
        }

        if let Some(raw) = lookup(REQUEST_TIMEOUT_VAR) {
            let secs = parse_positive(REQUEST_TIMEOUT_VAR, &raw)?;
            config.request_timeout = Some(Duration::from_secs(u64::from(secs)));
        }

        if let Some(raw) = lookup(RECENT_DAYS_VAR) {
            config.recent_days = parse_positive(RECENT_DAYS_VAR, &raw)?;
        }

        Ok(config)
    }

    /// Replace the API URL (the `--api-url` flag)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `url` is blank or not http(s).
    pub fn with_api_url(mut self, url: &str) -> Result<Self, ConfigError> {
        let trimmed = url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: API_URL_VAR,
                value: url.to_string(),
                reason: "expected an http:// or https:// URL",
            });
        }
        self.api_url = trimmed.to_string();
        Ok(self)
    }
}

fn parse_positive(var: &'static str, raw: &str) -> Result<u32, ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw.to_string(),
            reason: "expected a positive integer",
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.recent_days, 7);
        assert_eq!(config.request_timeout, None);
    }

    #[test]
    fn reads_every_variable() {
        let config = AppConfig::from_lookup(lookup(&[
            (API_URL_VAR, "https://expenses.example.com/api/"),
            (REQUEST_TIMEOUT_VAR, "15"),
            (RECENT_DAYS_VAR, "30"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "https://expenses.example.com/api");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.recent_days, 30);
    }

    #[test]
    fn rejects_bad_values() {
        let error = AppConfig::from_lookup(lookup(&[(RECENT_DAYS_VAR, "0")])).unwrap_err();
        assert!(matches!(error, ConfigError::Invalid { var: RECENT_DAYS_VAR, .. }));

        let error = AppConfig::from_lookup(lookup(&[(REQUEST_TIMEOUT_VAR, "soon")])).unwrap_err();
        assert!(error.to_string().contains(REQUEST_TIMEOUT_VAR));

        assert!(AppConfig::default().with_api_url("localhost:8080").is_err());
    }
}
