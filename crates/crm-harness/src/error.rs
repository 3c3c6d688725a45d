// crates/crm-harness/src/error.rs
// ============================================================================
// Module: Harness Errors
// Description: Failure taxonomy for CRM harness operations and assertions.
// Purpose: Give every scenario abort a typed, reportable cause.
// Dependencies: reqwest, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`HarnessError`] covers the three failure classes a scenario can hit:
//! unexpected HTTP status, malformed or missing JSON, and transport failure.
//! Assertion failures on re-fetched records are errors too, so a scenario
//! stops at the first one and its fixtures are still released.

// ============================================================================
// SECTION: Imports
// ============================================================================

use reqwest::Method;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum number of response body characters kept in error messages.
pub const MAX_ERROR_BODY_CHARS: usize = 512;

// ============================================================================
// SECTION: Error Types
// ============================================================================

/// Harness errors.
///
/// # Invariants
/// - Variants are stable for scenario reports and tests.
/// - String payloads may include untrusted server text.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Configuration error.
    #[error("harness config error: {0}")]
    Config(String),
    /// Transport-level failure (connection refused, timeout, I/O).
    #[error("transport error on {method} {path}: {message}")]
    Transport {
        /// HTTP method of the failed request.
        method: Method,
        /// Request path relative to the base URL.
        path: String,
        /// Underlying error text.
        message: String,
    },
    /// Response status differs from the expected status.
    #[error("{method} {path} returned {actual}, expected {expected}: {body}")]
    UnexpectedStatus {
        /// HTTP method of the request.
        method: Method,
        /// Request path relative to the base URL.
        path: String,
        /// Expected status code.
        expected: StatusCode,
        /// Actual status code.
        actual: StatusCode,
        /// Truncated response body.
        body: String,
    },
    /// Response body is not valid JSON.
    #[error("{method} {path} returned invalid json: {message}")]
    InvalidJson {
        /// HTTP method of the request.
        method: Method,
        /// Request path relative to the base URL.
        path: String,
        /// Parser error text.
        message: String,
    },
    /// A required field is absent from a record.
    #[error("{context} is missing field `{field}`")]
    MissingField {
        /// Record description (for example `customers/12`).
        context: String,
        /// Missing field name.
        field: String,
    },
    /// A re-fetched field differs from the expected value.
    #[error("{context} field `{field}` is {actual}, expected {expected}")]
    FieldMismatch {
        /// Record description.
        context: String,
        /// Field name.
        field: String,
        /// Expected JSON value.
        expected: Value,
        /// Actual JSON value.
        actual: Value,
    },
    /// A list response was empty.
    #[error("{context} returned an empty collection")]
    EmptyCollection {
        /// Collection description.
        context: String,
    },
    /// A list response does not contain the expected id.
    #[error("{context} does not list id {id}")]
    NotListed {
        /// Collection description.
        context: String,
        /// Missing identifier.
        id: String,
    },
    /// A response body had an unexpected JSON shape.
    #[error("{context} has unexpected shape: {message}")]
    UnexpectedShape {
        /// Record or collection description.
        context: String,
        /// Shape mismatch description.
        message: String,
    },
    /// The authentication endpoint rejected the credentials.
    #[error("authentication failed with status {status}: {body}")]
    AuthRejected {
        /// Status returned by the auth endpoint.
        status: StatusCode,
        /// Truncated response body.
        body: String,
    },
    /// The authentication endpoint answered without a token.
    #[error("authentication response did not contain a token")]
    MissingToken,
    /// Run artifacts could not be written.
    #[error("artifact error: {0}")]
    Artifact(String),
}

impl HarnessError {
    /// Returns a stable label for the error kind, used in reports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Transport {
                ..
            } => "transport",
            Self::UnexpectedStatus {
                ..
            } => "unexpected_status",
            Self::InvalidJson {
                ..
            } => "invalid_json",
            Self::MissingField {
                ..
            } => "missing_field",
            Self::FieldMismatch {
                ..
            } => "field_mismatch",
            Self::EmptyCollection {
                ..
            } => "empty_collection",
            Self::NotListed {
                ..
            } => "not_listed",
            Self::UnexpectedShape {
                ..
            } => "unexpected_shape",
            Self::AuthRejected {
                ..
            } => "auth_rejected",
            Self::MissingToken => "missing_token",
            Self::Artifact(_) => "artifact",
        }
    }
}

/// Truncates a response body for inclusion in error messages.
#[must_use]
pub fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_string();
    }
    let mut out: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    out.push_str("...");
    out
}
