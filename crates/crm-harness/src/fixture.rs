// crates/crm-harness/src/fixture.rs
// ============================================================================
// Module: Scoped Fixtures
// Description: Create-on-acquire, delete-on-release guards for CRM resources.
// Purpose: Guarantee remote cleanup on every exit path of a scenario.
// Dependencies: serde_json, tracing
// ============================================================================

//! ## Overview
//! [`Fixture::acquire`] creates a resource and returns a guard that owns its
//! id. [`Fixture::release`] deletes it and surfaces a failed delete as an
//! error. A guard dropped without release (early `?` return or panic) still
//! issues the delete; a failure at that point is logged as a leak.
//! Invariants:
//! - Exactly one delete is attempted per acquired fixture.
//! - Drop never panics.

use serde_json::Value;
use tracing::error;
use tracing::info;

use crate::client::CrmClient;
use crate::error::HarnessError;
use crate::resource::ResourceApi;
use crate::resource::ResourceId;
use crate::resource::ResourceKind;

/// Guard for a remote resource created by a scenario.
pub struct Fixture<'c> {
    /// Primitive operations for the fixture's kind.
    api: ResourceApi<'c>,
    /// Server-assigned id.
    id: ResourceId,
    /// Set once a delete has been attempted.
    released: bool,
}

impl<'c> Fixture<'c> {
    /// Creates the resource and takes ownership of its cleanup.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] when the create primitive fails; nothing is
    /// left to clean up in that case.
    pub fn acquire(
        client: &'c CrmClient,
        kind: ResourceKind,
        payload: &Value,
    ) -> Result<Self, HarnessError> {
        let api = ResourceApi::new(client, kind);
        let id = api.create(payload)?;
        info!(kind = %kind, %id, "set up {} fixture", kind.label());
        Ok(Self {
            api,
            id,
            released: false,
        })
    }

    /// Returns the resource id.
    #[must_use]
    pub const fn id(&self) -> &ResourceId {
        &self.id
    }

    /// Returns the resource kind.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.api.kind()
    }

    /// Returns the primitive operations for this fixture's kind.
    #[must_use]
    pub const fn api(&self) -> ResourceApi<'c> {
        self.api
    }

    /// Deletes the resource, reporting a failed delete.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] when the delete primitive fails; the resource
    /// is then leaked and no further delete is attempted.
    pub fn release(mut self) -> Result<(), HarnessError> {
        self.released = true;
        self.api.delete(&self.id)?;
        info!(kind = %self.kind(), id = %self.id, "cleaned up {} fixture", self.kind().label());
        Ok(())
    }
}

impl Drop for Fixture<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let kind = self.kind();
        match self.api.delete(&self.id) {
            Ok(()) => {
                info!(kind = %kind, id = %self.id, "cleaned up {} fixture on early exit", kind.label());
            }
            Err(err) => {
                error!(
                    kind = %kind,
                    id = %self.id,
                    panicking = std::thread::panicking(),
                    error = %err,
                    "leaked {} fixture",
                    kind.label()
                );
            }
        }
    }
}

/// Releases fixtures in reverse acquisition order, returning the first error.
///
/// Every fixture is released even when an earlier release fails.
///
/// # Errors
///
/// Returns the first [`HarnessError`] raised by a release.
pub fn release_all(fixtures: Vec<Fixture<'_>>) -> Result<(), HarnessError> {
    let mut first_error = None;
    for fixture in fixtures.into_iter().rev() {
        if let Err(err) = fixture.release() {
            first_error.get_or_insert(err);
        }
    }
    first_error.map_or(Ok(()), Err)
}
