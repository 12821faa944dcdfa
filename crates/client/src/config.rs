//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `GLOW_API_BASE_URL` - Remote API base URL (default: `https://render-qs89.onrender.com/api`)
//! - `GLOW_STATE_DIR` - Directory for the persisted session and cart cache (default: `.glow`)
//! - `GLOW_CATALOG_CACHE_TTL_SECS` - Salon list/detail cache lifetime; `0` disables it (default: 300)
//! - `GLOW_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: none, requests wait on the network stack)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default remote API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://render-qs89.onrender.com/api";

/// Default directory for persisted client state.
pub const DEFAULT_STATE_DIR: &str = ".glow";

const DEFAULT_CATALOG_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Remote API configuration
    pub api: ApiConfig,
    /// Directory holding the persisted session and cart records
    pub state_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Remote API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint path is joined onto. Always ends with `/`.
    pub base_url: Url,
    /// Optional per-request timeout
    pub request_timeout: Option<Duration>,
    /// Lifetime of cached salon list/detail responses; zero disables caching
    pub catalog_cache_ttl: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api = ApiConfig::from_env()?;
        let state_dir = PathBuf::from(get_env_or_default("GLOW_STATE_DIR", DEFAULT_STATE_DIR));

        Ok(Self {
            api,
            state_dir,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = parse_base_url(&get_env_or_default("GLOW_API_BASE_URL", DEFAULT_API_BASE_URL))
            .map_err(|e| ConfigError::InvalidEnvVar("GLOW_API_BASE_URL".to_string(), e))?;

        let catalog_cache_ttl = get_optional_env("GLOW_CATALOG_CACHE_TTL_SECS")
            .map(|v| parse_seconds("GLOW_CATALOG_CACHE_TTL_SECS", &v))
            .transpose()?
            .unwrap_or(Duration::from_secs(DEFAULT_CATALOG_CACHE_TTL_SECS));

        let request_timeout = get_optional_env("GLOW_REQUEST_TIMEOUT_SECS")
            .map(|v| parse_seconds("GLOW_REQUEST_TIMEOUT_SECS", &v))
            .transpose()?;

        Ok(Self {
            base_url,
            request_timeout,
            catalog_cache_ttl,
        })
    }

    /// Configuration pointing at `base_url` with default cache settings and no
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `base_url` is not an absolute http(s) URL.
    pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        let base_url = parse_base_url(base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("base_url".to_string(), e))?;
        Ok(Self {
            base_url,
            request_timeout: None,
            catalog_cache_ttl: Duration::from_secs(DEFAULT_CATALOG_CACHE_TTL_SECS),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an http(s) base URL and make sure its path ends with `/`, so that
/// relative endpoint paths are joined below it instead of replacing its last
/// segment.
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_seconds(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_appends_slash() {
        let url = parse_base_url("https://render-qs89.onrender.com/api").unwrap();
        assert_eq!(url.as_str(), "https://render-qs89.onrender.com/api/");
        assert_eq!(
            url.join("salon/get-all-salon").unwrap().as_str(),
            "https://render-qs89.onrender.com/api/salon/get-all-salon"
        );
    }

    #[test]
    fn test_parse_base_url_keeps_existing_slash() {
        let url = parse_base_url("http://127.0.0.1:8080/api/").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/api/");
    }

    #[test]
    fn test_parse_base_url_rejects_other_schemes() {
        assert!(parse_base_url("ftp://example.com/api").is_err());
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(
            parse_seconds("TEST", " 30 ").unwrap(),
            Duration::from_secs(30)
        );
        let err = parse_seconds("TEST", "soon").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "TEST"));
    }

    #[test]
    fn test_with_base_url_defaults() {
        let config = ApiConfig::with_base_url("http://localhost:4000/api").unwrap();
        assert!(config.request_timeout.is_none());
        assert_eq!(config.catalog_cache_ttl, Duration::from_secs(300));
    }
}
