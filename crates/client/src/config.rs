//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `NUTRIBASE_API_URL` - Base URL of the Nutribase backend (http or https)
//!
//! ## Optional
//! - `NUTRIBASE_API_TOKEN` - Bearer token sent with every request
//! - `NUTRIBASE_USER_EMAIL` - Email of the acting user
//! - `NUTRIBASE_UNDO_DEPTH` - Undo snapshots kept per session (default: 50)
//! - `NUTRIBASE_ENABLE_UPDATE_DB` - Allow the bulk database update (default: false)
//! - `NUTRIBASE_SAVE_RETRIES` - Extra attempts for a failed preference save (default: 3)
//! - `NUTRIBASE_SAVE_BACKOFF_MS` - First retry delay, doubled per attempt (default: 250)
//! - `NUTRIBASE_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)

use std::str::FromStr;
use std::time::Duration;

use nutribase_core::{DEFAULT_UNDO_DEPTH, Email};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::persistence::SaveConfig;
use crate::session::SessionOptions;

/// Substrings that mark a token as an unfilled template value.
const PLACEHOLDER_PATTERNS: &[&str] = &["your-", "changeme", "replace", "placeholder", "xxx"];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Everything the client, sessions and the CLI need.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend connection settings
    pub api: ApiConfig,
    /// Acting user, if configured
    pub user_email: Option<Email>,
    /// Undo snapshots kept per editing session
    pub undo_depth: usize,
    /// Whether the bulk database update may be offered at all
    pub enable_update_db: bool,
    /// Preference save retry policy
    pub save: SaveConfig,
}

/// Backend connection settings.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL; request paths are appended to it
    pub base_url: Url,
    /// Bearer token
    pub token: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ApiConfig {
    /// Settings for `base_url` with no token and the default timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL is not http(s).
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            token: None,
            timeout: Duration::from_secs(30),
        })
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("NUTRIBASE_API_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("NUTRIBASE_API_URL".to_string()))?;
        let token = lookup("NUTRIBASE_API_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .map(|t| {
                warn_if_placeholder(&t, "NUTRIBASE_API_TOKEN");
                SecretString::from(t)
            });
        let timeout_secs: u64 = parse_or(&lookup, "NUTRIBASE_REQUEST_TIMEOUT_SECS", 30)?;

        let user_email = lookup("NUTRIBASE_USER_EMAIL")
            .map(|raw| {
                Email::parse(&raw).map_err(|e| {
                    ConfigError::InvalidEnvVar("NUTRIBASE_USER_EMAIL".to_string(), e.to_string())
                })
            })
            .transpose()?;

        let retries: u32 = parse_or(&lookup, "NUTRIBASE_SAVE_RETRIES", 3)?;
        let backoff_ms: u64 = parse_or(&lookup, "NUTRIBASE_SAVE_BACKOFF_MS", 250)?;

        Ok(Self {
            api: ApiConfig {
                base_url: parse_base_url(&base_url)?,
                token,
                timeout: Duration::from_secs(timeout_secs),
            },
            user_email,
            undo_depth: parse_or(&lookup, "NUTRIBASE_UNDO_DEPTH", DEFAULT_UNDO_DEPTH)?,
            enable_update_db: parse_flag(&lookup, "NUTRIBASE_ENABLE_UPDATE_DB")?,
            save: SaveConfig {
                retries,
                backoff: Duration::from_millis(backoff_ms),
            },
        })
    }

    /// Options for editing sessions opened with this configuration.
    #[must_use]
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            undo_depth: self.undo_depth,
            save: self.save.clone(),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar("NUTRIBASE_API_URL".to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            "NUTRIBASE_API_URL".to_string(),
            format!("expected an http(s) base URL, got '{raw}'"),
        ));
    }
    Ok(url)
}

/// Parse a variable, falling back to `default` when unset.
fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

fn parse_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<bool, ConfigError> {
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("" | "0" | "false" | "no") => Ok(false),
        Some("1" | "true" | "yes") => Ok(true),
        Some(other) => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected true or false, got '{other}'"),
        )),
    }
}

fn warn_if_placeholder(secret: &str, var_name: &str) {
    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        tracing::warn!("{var_name} appears to be a placeholder (contains '{pattern}')");
    }
}

/// Expose the token for the `Authorization` header.
pub(crate) fn bearer(token: &SecretString) -> String {
    format!("Bearer {}", token.expose_secret())
}
