// system-tests/tests/suites/orders.rs
// ============================================================================
// Module: Order Tests
// Description: Order CRUD scenarios with customer and product prerequisites.
// Purpose: Confirm order round-trips and partial update semantics.
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
fn orders_suite_passes_without_leaks() -> Result<(), Box<dyn std::error::Error>> {
    run_catalog_suite("orders_suite_passes_without_leaks", &catalog::orders())
}

#[test]
fn partial_order_update_keeps_other_fields() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("partial_order_update_keeps_other_fields")?;
    let target = TestTarget::resolve()?;
    let session = target.connect()?;
    let client = session.client();

    let customer = Fixture::acquire(
        client,
        ResourceKind::Customer,
        &json!({"name": "Order Test Customer", "email": "ordertest@example.com", "phone": "1234567890"}),
    )?;
    let product = Fixture::acquire(
        client,
        ResourceKind::Product,
        &json!({
            "name": "Order Test Product",
            "description": "Product for order test",
            "price": 99.99,
            "stock": 100,
            "category": "Electronics"
        }),
    )?;
    let body = json!({
        "customer_id": customer.id().to_value(),
        "product_id": product.id().to_value(),
        "quantity": 1,
        "total_price": 99.99,
        "status": "Pending"
    });
    let order = Fixture::acquire(client, ResourceKind::Order, &body)?;

    order.api().update(order.id(), &json!({"status": "Shipped"}))?;
    let record = order.api().fetch(order.id())?;
    let mut expected = body.as_object().cloned().ok_or("order body must be an object")?;
    expected.insert("status".to_string(), json!("Shipped"));
    expect_fields("orders", &record, &expected)?;

    order.release()?;
    product.release()?;
    customer.release()?;
    if let Some(stub) = target.stub()
        && stub.entity_count() != 0
    {
        return Err(format!("{} entities left behind", stub.entity_count()).into());
    }

    reporter.artifacts().write_json("transcript.json", &client.transcript())?;
    reporter.finish(
        "pass",
        vec!["status-only update left quantity and total_price unchanged".to_string()],
        vec!["summary.json".to_string(), "summary.md".to_string(), "transcript.json".to_string()],
    )?;
    Ok(())
}
