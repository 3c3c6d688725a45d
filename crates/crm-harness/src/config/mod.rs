// crates/crm-harness/src/config/mod.rs
// ============================================================================
// Module: Harness Configuration
// Description: Centralized configuration for CRM harness sessions.
// Purpose: Provide typed access to base URL, auth, and artifact settings.
// Dependencies: std, url
// ============================================================================

//! ## Overview
//! Harness configuration is read from environment variables and mapped into
//! a small typed structure that is passed explicitly into a session.
//! Security posture: environment inputs are untrusted; credentials are
//! redacted from debug output.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod env;

// ============================================================================
// SECTION: Tests
// ============================================================================


// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use env::AuthConfig;
pub use env::DEFAULT_BASE_URL;
pub use env::DEFAULT_TOKEN_HEADER;
pub use env::HarnessConfig;
pub use env::HarnessEnv;
pub use env::parse_timeout_seconds;
pub use env::read_env_strict;
