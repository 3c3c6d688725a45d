// crates/crm-harness/src/telemetry.rs
// ============================================================================
// Module: Telemetry
// Description: Structured logging setup for harness binaries and tests.
// Purpose: Install one `tracing` subscriber honoring `RUST_LOG`.
// Dependencies: tracing-subscriber
// ============================================================================

//! ## Overview
//! Binaries call [`init_logging`] once at startup; tests call
//! [`init_test_logging`] freely. Both read `RUST_LOG` through `EnvFilter`.
//! Binaries log to stderr; tests log through the test output capture.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `default_directive`. Events go to stderr
/// so stdout stays free for command output. Calling this more than once is a
/// no-op; returns false when a subscriber was already installed.
pub fn init_logging(default_directive: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .is_ok()
}

/// Installs a test-friendly subscriber that writes through the test harness
/// capture. Safe to call from every test.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}
