//! # Application Configuration
//!
//! This module manages application configuration loaded from environment variables.
//! All configuration is validated on startup to fail fast if misconfigured.
//!
//! | Variable             | Default                        |
//! |----------------------|--------------------------------|
//! | `DATABASE_URL`       | `sqlite:data/chatgenius.db`    |
//! | `CLIENT_URL`         | `http://localhost:3000`        |
//! | `RESPONDER_DELAY_MS` | `1000`                         |
//! | `GUEST_NAME_RANGE`   | `1000`                         |

use crate::error::{AppError, Result};
use lib_utils::{get_env_or, get_env_parse_or};
use std::time::Duration;

/// Upper bound for the responder delay.
pub const MAX_RESPONDER_DELAY_MS: u64 = 60_000;

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    /// SQLite database connection URL
    pub database_url: String,

    /// Browser client origin, allowed by CORS
    pub client_url: String,

    /// Delay before the synthetic responder replies, in milliseconds
    pub responder_delay_ms: u64,

    /// Guest display names are `Guest` + a number in `0..guest_name_range`
    pub guest_name_range: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:data/chatgenius.db".to_string(),
            client_url: "http://localhost:3000".to_string(),
            responder_delay_ms: 1000,
            guest_name_range: 1000,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            database_url: get_env_or("DATABASE_URL", &defaults.database_url),
            client_url: get_env_or("CLIENT_URL", &defaults.client_url),
            responder_delay_ms: get_env_parse_or("RESPONDER_DELAY_MS", defaults.responder_delay_ms)?,
            guest_name_range: get_env_parse_or("GUEST_NAME_RANGE", defaults.guest_name_range)?,
        })
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            return Err(AppError::Config("DATABASE_URL cannot be empty".to_string()));
        }

        if self.responder_delay_ms > MAX_RESPONDER_DELAY_MS {
            return Err(AppError::Config(format!(
                "RESPONDER_DELAY_MS must be at most {}",
                MAX_RESPONDER_DELAY_MS
            )));
        }

        if self.guest_name_range == 0 {
            return Err(AppError::Config("GUEST_NAME_RANGE must be at least 1".to_string()));
        }

        Ok(())
    }

    pub fn responder_delay(&self) -> Duration {
        Duration::from_millis(self.responder_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.responder_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn test_rejects_long_delay() {
        let config = Config {
            responder_delay_ms: MAX_RESPONDER_DELAY_MS + 1,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_rejects_empty_guest_range() {
        let config = Config {
            guest_name_range: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
