// system-tests/src/config/env.rs
// ============================================================================
// Module: System Test Environment
// Description: Environment-backed configuration for system tests.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: crm-harness
// ============================================================================

//! ## Overview
//! Environment values are parsed with the harness's strict readers: invalid
//! UTF-8, empty values, bad URLs, and zero timeouts all fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use crm_harness::HarnessConfig;
use crm_harness::config::parse_timeout_seconds;
use crm_harness::config::read_env_strict;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys for system test configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemTestEnv {
    /// Live API base URL; unset runs against the in-process stub.
    BaseUrl,
    /// Optional run root override.
    RunRoot,
    /// Optional timeout override in seconds (positive integer).
    TimeoutSeconds,
}

impl SystemTestEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BaseUrl => "CRM_SYSTEM_TEST_BASE_URL",
            Self::RunRoot => "CRM_SYSTEM_TEST_RUN_ROOT",
            Self::TimeoutSeconds => "CRM_SYSTEM_TEST_TIMEOUT_SEC",
        }
    }

    /// Returns every system-test environment key.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::BaseUrl, Self::RunRoot, Self::TimeoutSeconds]
    }
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Typed system test configuration derived from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SystemTestConfig {
    /// Live API base URL, normalized without a trailing slash.
    pub base_url: Option<String>,
    /// Optional run root override.
    pub run_root: Option<PathBuf>,
    /// Optional timeout override in seconds (positive integer).
    pub timeout: Option<Duration>,
}

impl SystemTestConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when an environment value is not valid UTF-8, is empty,
    /// or fails validation (for example, an invalid URL or timeout).
    pub fn load() -> Result<Self, String> {
        let base_url = read_env_nonempty(SystemTestEnv::BaseUrl.as_str())?
            .map(|value| {
                HarnessConfig::for_base_url(&value)
                    .map(|config| config.base_url)
                    .map_err(|err| err.to_string())
            })
            .transpose()?;
        let run_root = read_env_nonempty(SystemTestEnv::RunRoot.as_str())?.map(PathBuf::from);
        let timeout = read_env_nonempty(SystemTestEnv::TimeoutSeconds.as_str())?
            .map(|value| {
                parse_timeout_seconds(SystemTestEnv::TimeoutSeconds.as_str(), &value)
                    .map_err(|err| err.to_string())
            })
            .transpose()?;
        Ok(Self {
            base_url,
            run_root,
            timeout,
        })
    }

    /// Returns true when suites target a live API instead of the stub.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.base_url.is_some()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and rejects empty values.
///
/// # Errors
///
/// Returns an error when the variable is not UTF-8, or is set but empty.
fn read_env_nonempty(name: &str) -> Result<Option<String>, String> {
    match read_env_strict(name).map_err(|err| err.to_string())? {
        Some(value) if value.trim().is_empty() => Err(format!("{name} must not be empty")),
        Some(value) => Ok(Some(value)),
        None => Ok(None),
    }
}
