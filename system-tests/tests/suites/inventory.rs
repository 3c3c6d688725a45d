// system-tests/tests/suites/inventory.rs
// ============================================================================
// Module: Inventory Tests
// Description: Inventory CRUD scenarios against the resolved target.
// Purpose: Confirm get, update, list, and delete round-trips for inventory.
// Dependencies: system-tests helpers, crm-harness
// ============================================================================

use crm_harness::Fixture;
use crm_harness::ResourceKind;
use crm_harness::catalog;
use crm_harness::scenario::Prerequisites;
use helpers::artifacts::TestReporter;
use helpers::target::TestTarget;
use helpers::target::run_catalog_suite;

use crate::helpers;

#[test]
fn inventory_suite_passes_without_leaks() -> Result<(), Box<dyn std::error::Error>> {
    run_catalog_suite("inventory_suite_passes_without_leaks", &catalog::inventory())
}

#[test]
fn inventory_record_keeps_its_product_reference() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("inventory_record_keeps_its_product_reference")?;
    let target = TestTarget::resolve()?;
    let session = target.connect()?;
    let client = session.client();
    let spec = catalog::inventory();

    let mut prerequisites = Prerequisites::default();
    let product_spec = spec.prerequisites.first().ok_or("inventory needs a product")?;
    let product =
        Fixture::acquire(client, product_spec.kind, &(product_spec.payload)(&prerequisites)?)?;
    prerequisites.insert(product.kind(), product.id().clone());
    let stock = Fixture::acquire(client, ResourceKind::Inventory, &(spec.create)(&prerequisites)?)?;

    let record = stock.api().fetch(stock.id())?;
    if record.get("product_id") != Some(&product.id().to_value()) {
        return Err(format!("inventory product_id is {:?}", record.get("product_id")).into());
    }
    stock.release()?;
    product.release()?;

    reporter.finish(
        "pass",
        vec!["inventory product_id matches the product fixture".to_string()],
        vec!["summary.json".to_string(), "summary.md".to_string()],
    )?;
    Ok(())
}
