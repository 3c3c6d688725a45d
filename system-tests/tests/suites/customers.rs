// system-tests/tests/suites/customers.rs
// ============================================================================
// Module: Customer Tests
// Description: Customer CRUD, status, and sub-resource scenarios.
// Purpose: Cover the customer suite and the raw delete status contract.
// Dependencies: system-tests helpers, crm-harness, serde_json
// ============================================================================

use crm_harness::Fixture;
use crm_harness::ResourceKind;
use crm_harness::assert::expect_fields;
use crm_harness::catalog;
use helpers::artifacts::TestReporter;
use helpers::target::TestTarget;
use helpers::target::run_catalog_suite;
use serde_json::json;

use crate::helpers;

#[test]
fn customers_suite_passes_without_leaks() -> Result<(), Box<dyn std::error::Error>> {
    run_catalog_suite("customers_suite_passes_without_leaks", &catalog::customers())
}

#[test]
fn customer_delete_answers_no_content_then_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("customer_delete_answers_no_content_then_not_found")?;
    let target = TestTarget::resolve()?;
    let session = target.connect()?;
    let client = session.client();

    let body = json!({
        "name": "Delete Test Customer",
        "email": "deletetestcustomer@example.com",
        "phone": "1234567890"
    });
    let expected = body.as_object().cloned().ok_or("customer body must be an object")?;
    let customer = Fixture::acquire(client, ResourceKind::Customer, &body)?;
    let path = ResourceKind::Customer.item_path(customer.id());

    let fetched = client.get(&path)?;
    if fetched.status().as_u16() != 200 {
        return Err(format!("GET {path} returned {}", fetched.status()).into());
    }
    expect_fields(&path, &fetched.json()?, &expected)?;

    customer.release()?;
    let transcript = client.transcript();
    let delete = transcript
        .iter()
        .rev()
        .find(|entry| entry.method == "DELETE")
        .ok_or("transcript has no DELETE")?;
    if delete.status != Some(204) {
        return Err(format!("DELETE {path} returned {:?}", delete.status).into());
    }

    let absent = client.get(&path)?;
    if absent.status().as_u16() != 404 {
        return Err(format!("GET {path} after delete returned {}", absent.status()).into());
    }

    reporter.artifacts().write_json("transcript.json", &client.transcript())?;
    reporter.finish(
        "pass",
        vec![
            "created customer is readable with its submitted fields".to_string(),
            "delete answers 204 and a later GET answers 404".to_string(),
        ],
        vec!["summary.json".to_string(), "summary.md".to_string(), "transcript.json".to_string()],
    )?;
    Ok(())
}
