//! # Service Configuration
//!
//! Command-line flags with environment fallbacks, parsed with `clap`, and the
//! runtime [`AppConfig`] threaded through [`AppState`](crate::state::AppState)
//! into the view builders. Nothing reads configuration from ambient globals
//! after startup.

use clap::{ArgAction, Args};
use thiserror::Error;

use crate::auth::SecretString;

/// Default number of rows per search/watchlist page.
pub const DEFAULT_PAGE_SIZE: usize = 20;
/// Default minimum length of a free-text search term.
pub const DEFAULT_SEARCH_MIN_LENGTH: usize = 3;

/// Flags of the `serve` command.
#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Listen port.
    #[arg(long, env = "SIGFA_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Postgres connection string. Without it the service runs on an empty
    /// in-memory catalog.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Rows per page for search and watchlists.
    #[arg(long, env = "SIGFA_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Minimum length of a search term.
    #[arg(long, env = "SIGFA_SEARCH_MIN_LENGTH", default_value_t = DEFAULT_SEARCH_MIN_LENGTH)]
    pub search_min_length: usize,

    /// Shared secret expected from the gateway as a bearer token.
    #[arg(long, env = "SIGFA_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Expose `/metrics` and record request metrics.
    #[arg(long, env = "SIGFA_METRICS_ENABLED", default_value_t = true, action = ArgAction::Set)]
    pub metrics_enabled: bool,

    /// Emit logs as JSON lines.
    #[arg(long, env = "SIGFA_LOG_JSON", default_value_t = false, action = ArgAction::Set)]
    pub log_json: bool,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("page size must be >= 1")]
    InvalidPageSize,
    #[error("search minimum length must be >= 1")]
    InvalidSearchMinLength,
    #[error("auth token must not be empty")]
    EmptyAuthToken,
}

/// Runtime settings shared by every request.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub page_size: usize,
    pub search_min_length: usize,
    pub auth_token: Option<SecretString>,
    pub metrics_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            search_min_length: DEFAULT_SEARCH_MIN_LENGTH,
            auth_token: None,
            metrics_enabled: true,
        }
    }
}

impl TryFrom<&ServeArgs> for AppConfig {
    type Error = ConfigError;

    fn try_from(args: &ServeArgs) -> Result<Self, Self::Error> {
        if args.page_size == 0 {
            return Err(ConfigError::InvalidPageSize);
        }
        if args.search_min_length == 0 {
            return Err(ConfigError::InvalidSearchMinLength);
        }
        let auth_token = match args.auth_token.as_deref() {
            Some("") => return Err(ConfigError::EmptyAuthToken),
            Some(token) => Some(SecretString::new(token)),
            None => None,
        };
        Ok(Self {
            page_size: args.page_size,
            search_min_length: args.search_min_length,
            auth_token,
            metrics_enabled: args.metrics_enabled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ServeArgs {
        ServeArgs {
            port: 8080,
            database_url: None,
            page_size: 20,
            search_min_length: 3,
            auth_token: None,
            metrics_enabled: true,
            log_json: false,
        }
    }

    #[test]
    fn defaults_convert() {
        let config = AppConfig::try_from(&args()).unwrap();
        assert_eq!(config.page_size, 20);
        assert_eq!(config.search_min_length, 3);
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn zero_page_size_rejected() {
        let mut a = args();
        a.page_size = 0;
        assert_eq!(AppConfig::try_from(&a).unwrap_err(), ConfigError::InvalidPageSize);
    }

    #[test]
    fn empty_token_rejected() {
        let mut a = args();
        a.auth_token = Some(String::new());
        assert_eq!(AppConfig::try_from(&a).unwrap_err(), ConfigError::EmptyAuthToken);
    }

    #[test]
    fn token_is_wrapped() {
        let mut a = args();
        a.auth_token = Some("s3cret".into());
        let config = AppConfig::try_from(&a).unwrap();
        assert_eq!(config.auth_token.unwrap().expose(), "s3cret");
    }
}
