// crates/crm-harness/src/client.rs
// ============================================================================
// Module: CRM HTTP Client
// Description: Blocking JSON client for the CRM API with transcripts.
// Purpose: Issue requests against the base URL and capture every exchange.
// Dependencies: reqwest, serde_json, tracing
// ============================================================================

//! ## Overview
//! [`CrmClient`] sends JSON requests relative to the configured base URL and
//! returns raw [`ApiResponse`] values; status checks are left to callers so
//! that scenarios can assert on 404 as readily as on 200. [`CrmSession`]
//! resolves the session token once and owns the client for a whole run.
//! Invariants:
//! - Requests are blocking and never retried.
//! - No timeout is applied unless the configuration sets one.
//! - The token is attached as a sensitive header and never logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use reqwest::Method;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use tracing::info;

use crate::auth::AuthToken;
use crate::auth::request_token;
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::error::truncate_body;

// ============================================================================
// SECTION: Transcript
// ============================================================================

/// One recorded request/response exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    /// 1-based position in the transcript.
    pub sequence: u64,
    /// HTTP method.
    pub method: String,
    /// Path relative to the base URL.
    pub path: String,
    /// Response status, absent on transport failure.
    pub status: Option<u16>,
    /// Transport error text, if any.
    pub error: Option<String>,
}

// ============================================================================
// SECTION: Responses
// ============================================================================

/// Raw API response with its originating request.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP method of the request.
    method: Method,
    /// Path relative to the base URL.
    path: String,
    /// Response status.
    status: StatusCode,
    /// Response body text.
    body: String,
}

impl ApiResponse {
    /// Returns the response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Fails unless the status equals `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::UnexpectedStatus`] on any other status.
    pub fn expect_status(self, expected: StatusCode) -> Result<Self, HarnessError> {
        if self.status == expected {
            return Ok(self);
        }
        Err(HarnessError::UnexpectedStatus {
            method: self.method,
            path: self.path,
            expected,
            actual: self.status,
            body: truncate_body(&self.body),
        })
    }

    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::InvalidJson`] when the body is empty or malformed.
    pub fn json(&self) -> Result<Value, HarnessError> {
        serde_json::from_str(&self.body).map_err(|err| HarnessError::InvalidJson {
            method: self.method.clone(),
            path: self.path.clone(),
            message: err.to_string(),
        })
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Blocking CRM API client with transcript capture.
#[derive(Clone)]
pub struct CrmClient {
    /// Base URL without a trailing slash.
    base_url: String,
    /// Underlying HTTP client carrying default headers.
    client: Client,
    /// Recorded exchanges.
    transcript: Arc<Mutex<Vec<TranscriptEntry>>>,
}

impl CrmClient {
    /// Creates a client without a session token.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Config`] when the HTTP client cannot be built.
    pub fn new(config: &HarnessConfig) -> Result<Self, HarnessError> {
        Self::with_token(config, None)
    }

    /// Creates a client that sends `token` on every request.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Config`] when the token header name or value is
    /// invalid, or the HTTP client cannot be built.
    pub fn with_token(
        config: &HarnessConfig,
        token: Option<&AuthToken>,
    ) -> Result<Self, HarnessError> {
        let headers = default_headers(&config.token_header, token)?;
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|err| HarnessError::Config(format!("failed to build http client: {err}")))?;
        Ok(Self {
            base_url: config.base_url.clone(),
            client,
            transcript: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns a snapshot of the transcript entries.
    #[must_use]
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.transcript.lock().map_or_else(|_| Vec::new(), |entries| entries.clone())
    }

    /// Issues `GET path`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Transport`] when the request cannot be completed.
    pub fn get(&self, path: &str) -> Result<ApiResponse, HarnessError> {
        self.send(Method::GET, path, None)
    }

    /// Issues `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Transport`] when the request cannot be completed.
    pub fn post(&self, path: &str, body: &Value) -> Result<ApiResponse, HarnessError> {
        self.send(Method::POST, path, Some(body))
    }

    /// Issues `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Transport`] when the request cannot be completed.
    pub fn put(&self, path: &str, body: &Value) -> Result<ApiResponse, HarnessError> {
        self.send(Method::PUT, path, Some(body))
    }

    /// Issues `PATCH path` with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Transport`] when the request cannot be completed.
    pub fn patch(&self, path: &str, body: &Value) -> Result<ApiResponse, HarnessError> {
        self.send(Method::PATCH, path, Some(body))
    }

    /// Issues `DELETE path`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Transport`] when the request cannot be completed.
    pub fn delete(&self, path: &str) -> Result<ApiResponse, HarnessError> {
        self.send(Method::DELETE, path, None)
    }

    /// Sends a request and records it in the transcript.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Transport`] when the request cannot be completed.
    pub fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, HarnessError> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let outcome = request.send().and_then(|response| {
            let status = response.status();
            response.text().map(|text| (status, text))
        });
        match outcome {
            Ok((status, text)) => {
                debug!(method = %method, path, status = status.as_u16(), "crm exchange");
                self.record(&method, path, Some(status.as_u16()), None);
                Ok(ApiResponse {
                    method,
                    path: path.to_string(),
                    status,
                    body: text,
                })
            }
            Err(err) => {
                let message = err.to_string();
                debug!(method = %method, path, error = %message, "crm transport failure");
                self.record(&method, path, None, Some(message.clone()));
                Err(HarnessError::Transport {
                    method,
                    path: path.to_string(),
                    message,
                })
            }
        }
    }

    /// Appends a transcript entry.
    fn record(&self, method: &Method, path: &str, status: Option<u16>, error: Option<String>) {
        let Ok(mut guard) = self.transcript.lock() else {
            return;
        };
        let sequence = u64::try_from(guard.len()).unwrap_or(u64::MAX).saturating_add(1);
        guard.push(TranscriptEntry {
            sequence,
            method: method.to_string(),
            path: path.to_string(),
            status,
            error,
        });
    }
}

/// Builds the headers sent on every request.
fn default_headers(
    token_header: &str,
    token: Option<&AuthToken>,
) -> Result<HeaderMap, HarnessError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    let Some(token) = token else {
        return Ok(headers);
    };
    let name = HeaderName::from_bytes(token_header.trim().as_bytes())
        .map_err(|err| HarnessError::Config(format!("invalid token header name: {err}")))?;
    let raw = if name == AUTHORIZATION {
        format!("Bearer {}", token.expose())
    } else {
        token.expose().to_string()
    };
    let mut value = HeaderValue::from_str(&raw)
        .map_err(|_| HarnessError::Config("token is not a valid header value".to_string()))?;
    value.set_sensitive(true);
    headers.insert(name, value);
    Ok(headers)
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// Configuration plus a ready client, resolved once per run.
///
/// # Invariants
/// - When auth is configured, the client carries a non-empty token.
pub struct CrmSession {
    /// Resolved configuration.
    config: HarnessConfig,
    /// Client bound to the session token.
    client: CrmClient,
    /// Whether a token was exchanged.
    authenticated: bool,
}

impl CrmSession {
    /// Resolves the token (when auth is configured) and builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::MissingToken`] or [`HarnessError::AuthRejected`]
    /// when the token exchange fails, and [`HarnessError::Config`] when the
    /// client cannot be built.
    pub fn connect(config: HarnessConfig) -> Result<Self, HarnessError> {
        let token = match &config.auth {
            Some(auth) => Some(request_token(auth, config.timeout)?),
            None => None,
        };
        let client = CrmClient::with_token(&config, token.as_ref())?;
        info!(
            base_url = %config.base_url,
            authenticated = token.is_some(),
            "crm session ready"
        );
        Ok(Self {
            authenticated: token.is_some(),
            config,
            client,
        })
    }

    /// Returns the session client.
    #[must_use]
    pub const fn client(&self) -> &CrmClient {
        &self.client
    }

    /// Returns the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Returns true when a token was exchanged.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}
