// crates/crm-harness/src/config/env.rs
// ============================================================================
// Module: Harness Environment
// Description: Environment-backed configuration for CRM harness sessions.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: std, url
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid silent
//! misconfiguration. Invalid UTF-8 fails closed. Auth settings are
//! all-or-nothing: an auth URL without credentials is rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::HarnessError;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Base URL used when `CRM_HARNESS_BASE_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "http://crmprod.baidu.com/api";

/// Header carrying the session token when `CRM_HARNESS_TOKEN_HEADER` is unset.
pub const DEFAULT_TOKEN_HEADER: &str = "token";

/// Environment keys for harness configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessEnv {
    /// API base URL.
    BaseUrl,
    /// Optional request timeout in seconds (positive integer).
    TimeoutSeconds,
    /// Optional authentication endpoint.
    AuthUrl,
    /// Username for the authentication endpoint.
    AuthUsername,
    /// Password for the authentication endpoint.
    AuthPassword,
    /// Header name used to send the session token.
    TokenHeader,
    /// Optional artifact root override.
    RunRoot,
}

impl HarnessEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BaseUrl => "CRM_HARNESS_BASE_URL",
            Self::TimeoutSeconds => "CRM_HARNESS_TIMEOUT_SEC",
            Self::AuthUrl => "CRM_HARNESS_AUTH_URL",
            Self::AuthUsername => "CRM_HARNESS_AUTH_USERNAME",
            Self::AuthPassword => "CRM_HARNESS_AUTH_PASSWORD",
            Self::TokenHeader => "CRM_HARNESS_TOKEN_HEADER",
            Self::RunRoot => "CRM_HARNESS_RUN_ROOT",
        }
    }

    /// Returns every harness environment key.
    #[must_use]
    pub const fn all() -> [Self; 7] {
        [
            Self::BaseUrl,
            Self::TimeoutSeconds,
            Self::AuthUrl,
            Self::AuthUsername,
            Self::AuthPassword,
            Self::TokenHeader,
            Self::RunRoot,
        ]
    }
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Credentials exchanged for a session token.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Authentication endpoint URL.
    pub url: String,
    /// Username sent to the endpoint.
    pub username: String,
    /// Password sent to the endpoint.
    pub password: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Typed harness configuration.
///
/// # Invariants
/// - `base_url` is an absolute http(s) URL without a trailing slash.
/// - `timeout`, when set, is non-zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// API base URL.
    pub base_url: String,
    /// Optional request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Optional token exchange settings.
    pub auth: Option<AuthConfig>,
    /// Header used to send the session token.
    pub token_header: String,
    /// Optional artifact root override.
    pub run_root: Option<PathBuf>,
}

impl HarnessConfig {
    /// Builds a configuration for the given base URL with defaults elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Config`] when the URL is not absolute http(s).
    pub fn for_base_url(base_url: &str) -> Result<Self, HarnessError> {
        Ok(Self {
            base_url: normalize_base_url(HarnessEnv::BaseUrl.as_str(), base_url)?,
            timeout: None,
            auth: None,
            token_header: DEFAULT_TOKEN_HEADER.to_string(),
            run_root: None,
        })
    }

    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when an environment value is not valid UTF-8, is empty,
    /// or fails validation (for example, an invalid URL or timeout).
    pub fn load() -> Result<Self, HarnessError> {
        let base_url = read_env_nonempty(HarnessEnv::BaseUrl.as_str())?
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = normalize_base_url(HarnessEnv::BaseUrl.as_str(), &base_url)?;
        let timeout = read_env_nonempty(HarnessEnv::TimeoutSeconds.as_str())?
            .map(|value| parse_timeout_seconds(HarnessEnv::TimeoutSeconds.as_str(), &value))
            .transpose()?;
        let auth = load_auth()?;
        let token_header = read_env_nonempty(HarnessEnv::TokenHeader.as_str())?
            .map_or_else(|| DEFAULT_TOKEN_HEADER.to_string(), |value| value.trim().to_string());
        let run_root = read_env_nonempty(HarnessEnv::RunRoot.as_str())?.map(PathBuf::from);
        Ok(Self {
            base_url,
            timeout,
            auth,
            token_header,
            run_root,
        })
    }

    /// Returns a copy with the timeout replaced.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns a copy with token exchange enabled.
    #[must_use]
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Returns a copy with a different token header.
    #[must_use]
    pub fn with_token_header(mut self, header: &str) -> Self {
        self.token_header = header.to_string();
        self
    }

    /// Returns a copy with the artifact root replaced.
    #[must_use]
    pub fn with_run_root(mut self, run_root: PathBuf) -> Self {
        self.run_root = Some(run_root);
        self
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads the auth triple; the URL decides whether auth is enabled.
fn load_auth() -> Result<Option<AuthConfig>, HarnessError> {
    let Some(url) = read_env_nonempty(HarnessEnv::AuthUrl.as_str())? else {
        return Ok(None);
    };
    let url = normalize_base_url(HarnessEnv::AuthUrl.as_str(), &url)?;
    let username = read_env_nonempty(HarnessEnv::AuthUsername.as_str())?.ok_or_else(|| {
        HarnessError::Config(format!(
            "{} is required when {} is set",
            HarnessEnv::AuthUsername.as_str(),
            HarnessEnv::AuthUrl.as_str()
        ))
    })?;
    let password = read_env_nonempty(HarnessEnv::AuthPassword.as_str())?.ok_or_else(|| {
        HarnessError::Config(format!(
            "{} is required when {} is set",
            HarnessEnv::AuthPassword.as_str(),
            HarnessEnv::AuthUrl.as_str()
        ))
    })?;
    Ok(Some(AuthConfig {
        url,
        username,
        password,
    }))
}

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, HarnessError> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string()
            .map(Some)
            .map_err(|_| HarnessError::Config(format!("{name} must be valid UTF-8")))
    })
}

/// Reads an environment variable and rejects empty values.
fn read_env_nonempty(name: &str) -> Result<Option<String>, HarnessError> {
    match read_env_strict(name)? {
        Some(value) if value.trim().is_empty() => {
            Err(HarnessError::Config(format!("{name} must not be empty")))
        }
        Some(value) => Ok(Some(value)),
        None => Ok(None),
    }
}

/// Validates an absolute http(s) URL and strips trailing slashes.
fn normalize_base_url(name: &str, raw: &str) -> Result<String, HarnessError> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed)
        .map_err(|err| HarnessError::Config(format!("{name} is not a valid url: {err}")))?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(HarnessError::Config(format!(
                "{name} must use http or https, got {scheme}"
            )));
        }
    }
    if url.host_str().is_none() {
        return Err(HarnessError::Config(format!("{name} must include a host")));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Parses a positive timeout value from an environment variable string.
///
/// # Errors
///
/// Returns an error when the value is missing, non-numeric, or zero.
pub fn parse_timeout_seconds(name: &str, raw: &str) -> Result<Duration, HarnessError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(HarnessError::Config(format!(
            "{name} must be a positive integer number of seconds"
        )));
    }
    let secs: u64 = trimmed.parse().map_err(|_| {
        HarnessError::Config(format!("{name} must be a positive integer number of seconds"))
    })?;
    if secs == 0 {
        return Err(HarnessError::Config(format!("{name} must be greater than zero")));
    }
    Ok(Duration::from_secs(secs))
}
