// system-tests/tests/suites/users.rs
// ============================================================================
// Module: User Tests
// Description: User CRUD scenarios against the resolved target.
// Purpose: Confirm user round-trips while passwords stay uncompared.
// Dependencies: system-tests helpers, crm-harness, serde_json
// ============================================================================

use crm_harness::Fixture;
use crm_harness::ResourceKind;
use crm_harness::Scenario;
use crm_harness::ScenarioRunner;
use crm_harness::catalog;
use crm_harness::scenario::Prerequisites;
use helpers::artifacts::TestReporter;
use helpers::crm_stub::STORED_SECRET;
use helpers::crm_stub::StubFaults;
use helpers::crm_stub::StubOptions;
use helpers::target::TestTarget;
use helpers::target::run_catalog_suite;
use serde_json::Value;

use crate::helpers;

#[test]
fn users_suite_passes_without_leaks() -> Result<(), Box<dyn std::error::Error>> {
    run_catalog_suite("users_suite_passes_without_leaks", &catalog::users())
}

#[test]
fn get_accepts_user_records_that_return_a_password() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::stub_only("get_accepts_user_records_that_return_a_password")?;
    let target = TestTarget::stub_with(StubOptions {
        faults: StubFaults {
            echo_write_only: true,
            ..StubFaults::default()
        },
        ..StubOptions::default()
    })?;
    let stub = target.stub().ok_or("stub target expected")?;
    let session = target.connect()?;
    let client = session.client();

    let body = (catalog::users().create)(&Prerequisites::default())?;
    let user = Fixture::acquire(client, ResourceKind::User, &body)?;
    let record = user.api().fetch(user.id())?;
    if record.get("password").and_then(Value::as_str) != Some(STORED_SECRET) {
        return Err(format!("expected the stored password on read-back, got {record}").into());
    }
    user.release()?;

    ScenarioRunner::new(client).run(&catalog::users(), Scenario::Get)?;
    if stub.entity_count() != 0 {
        return Err("get scenario left a user behind".into());
    }

    reporter.finish(
        "pass",
        vec!["get ignores a password returned on read-back".to_string()],
        vec!["summary.json".to_string(), "summary.md".to_string()],
    )?;
    Ok(())
}
