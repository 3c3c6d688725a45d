// crates/crm-harness/src/auth.rs
// ============================================================================
// Module: Token Exchange
// Description: Username/password exchange for a CRM session token.
// Purpose: Resolve the session token once, before any suite runs.
// Dependencies: reqwest, serde, tracing
// ============================================================================

//! ## Overview
//! The authentication endpoint accepts a form-encoded `username`/`password`
//! pair and answers `200` with a JSON body carrying `token`. A response
//! without a token is an error; the harness never proceeds unauthenticated
//! once auth has been configured.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use reqwest::Method;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::info;
use tracing::warn;

use crate::config::AuthConfig;
use crate::error::HarnessError;
use crate::error::truncate_body;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Session token returned by the authentication endpoint.
///
/// # Invariants
/// - The wrapped value is non-empty.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wraps a token value, rejecting empty or whitespace-only input.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::MissingToken`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, HarnessError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(HarnessError::MissingToken);
        }
        Ok(Self(value))
    }

    /// Returns the raw token for header construction.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

/// Token endpoint response body.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    /// Token value, absent when the endpoint declines to issue one.
    #[serde(default)]
    token: Option<String>,
}

// ============================================================================
// SECTION: Exchange
// ============================================================================

/// Exchanges credentials for a session token.
///
/// # Errors
///
/// Returns [`HarnessError::Transport`] when the endpoint is unreachable,
/// [`HarnessError::AuthRejected`] on a non-200 status,
/// [`HarnessError::InvalidJson`] on a malformed body, and
/// [`HarnessError::MissingToken`] when no token is present.
pub fn request_token(
    auth: &AuthConfig,
    timeout: Option<Duration>,
) -> Result<AuthToken, HarnessError> {
    let client = Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| HarnessError::Config(format!("failed to build auth client: {err}")))?;
    let form = [("username", auth.username.as_str()), ("password", auth.password.as_str())];
    let transport = |message: String| HarnessError::Transport {
        method: Method::POST,
        path: auth.url.clone(),
        message,
    };
    let response =
        client.post(&auth.url).form(&form).send().map_err(|err| transport(err.to_string()))?;
    let status = response.status();
    let body = response.text().map_err(|err| transport(err.to_string()))?;
    if status != StatusCode::OK {
        warn!(status = status.as_u16(), "token exchange rejected");
        return Err(HarnessError::AuthRejected {
            status,
            body: truncate_body(&body),
        });
    }
    let parsed: TokenResponse =
        serde_json::from_str(&body).map_err(|err| HarnessError::InvalidJson {
            method: Method::POST,
            path: auth.url.clone(),
            message: err.to_string(),
        })?;
    let token = AuthToken::new(parsed.token.unwrap_or_default())?;
    info!(username = %auth.username, "obtained session token");
    Ok(token)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
