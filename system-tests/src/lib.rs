// system-tests/src/lib.rs
// ============================================================================
// Module: CRM Harness System Tests Library
// Description: Shared configuration for CRM harness system-test binaries.
// Purpose: Decide between the in-process stub and a live API per run.
// Dependencies: crm-harness
// ============================================================================

//! ## Overview
//! This crate hosts shared configuration used by the system-test binaries in
//! `system-tests/tests`. Suites run against an in-process stub CRM unless
//! `CRM_SYSTEM_TEST_BASE_URL` points them at a live deployment.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
