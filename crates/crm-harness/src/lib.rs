// crates/crm-harness/src/lib.rs
// ============================================================================
// Module: CRM Harness Library
// Description: Fixture lifecycle and assertion harness for a remote CRM API.
// Purpose: Drive create/read/update/delete scenarios and guarantee cleanup.
// Dependencies: reqwest, serde, serde_json, thiserror, tracing, url
// ============================================================================

//! ## Overview
//! The CRM harness exercises a REST-style CRM API (customers, products,
//! orders, inventory, opportunities, users) through four primitives per
//! resource type: create, fetch, update, and delete. Scenarios compose those
//! primitives around [`Fixture`] guards so every entity created during a
//! scenario is deleted again on all exit paths.
//! Invariants:
//! - Every verification step re-fetches from the API; nothing is cached.
//! - Calls are sequential and blocking; nothing is retried.
//! - Unexpected status codes abort the current scenario.
//!
//! Security posture: API responses are untrusted; tokens and passwords are
//! never logged.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod assert;
pub mod auth;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod fixture;
pub mod payload;
pub mod report;
pub mod resource;
pub mod scenario;
pub mod telemetry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use auth::AuthToken;
pub use client::ApiResponse;
pub use client::CrmClient;
pub use client::CrmSession;
pub use client::TranscriptEntry;
pub use config::AuthConfig;
pub use config::HarnessConfig;
pub use error::HarnessError;
pub use fixture::Fixture;
pub use resource::ChildKind;
pub use resource::ResourceApi;
pub use resource::ResourceId;
pub use resource::ResourceKind;
pub use scenario::Scenario;
pub use scenario::ScenarioRunner;
pub use scenario::SuiteReport;
