// crates/crm-harness/src/catalog.rs
// ============================================================================
// Module: Suite Catalog
// Description: Resource suites with their fixture data.
// Purpose: Provide the table the scenario runner iterates over.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! One [`ResourceSpec`] per CRM resource. Payload builders are plain
//! functions; builders that reference other records read their ids from
//! [`Prerequisites`].

use serde_json::Value;

use crate::error::HarnessError;
use crate::payload::InventoryUpdate;
use crate::payload::NewAttachment;
use crate::payload::NewComplaint;
use crate::payload::NewCustomField;
use crate::payload::NewCustomer;
use crate::payload::NewInteraction;
use crate::payload::NewInventory;
use crate::payload::NewNote;
use crate::payload::NewOpportunity;
use crate::payload::NewOrder;
use crate::payload::NewProduct;
use crate::payload::NewTask;
use crate::payload::NewUser;
use crate::payload::OpportunityUpdate;
use crate::payload::OrderUpdate;
use crate::payload::StatusUpdate;
use crate::payload::UserUpdate;
use crate::payload::to_body;
use crate::resource::ChildKind;
use crate::resource::ResourceKind;
use crate::scenario::ChildFlowSpec;
use crate::scenario::PrerequisiteSpec;
use crate::scenario::Prerequisites;
use crate::scenario::ResourceSpec;

/// Returns every suite in run order.
#[must_use]
pub fn all() -> Vec<ResourceSpec> {
    vec![customers(), products(), orders(), inventory(), opportunities(), users()]
}

/// Looks up a suite by name.
#[must_use]
pub fn find(name: &str) -> Option<ResourceSpec> {
    all().into_iter().find(|spec| spec.name == name)
}

/// Returns the suite names in run order.
#[must_use]
pub fn names() -> Vec<&'static str> {
    all().iter().map(|spec| spec.name).collect()
}

// ============================================================================
// SECTION: Customers
// ============================================================================

/// Customer suite, including status transitions and sub-resources.
#[must_use]
pub fn customers() -> ResourceSpec {
    ResourceSpec {
        name: "customers",
        kind: ResourceKind::Customer,
        prerequisites: Vec::new(),
        create: |_| {
            to_body(&customer("Test Customer", "testcustomer@example.com", "1234567890"))
        },
        update: |_| {
            to_body(&customer("Updated Test Customer", "updatedcustomer@example.com", "0987654321"))
        },
        update_subject: None,
        list_subjects: Vec::new(),
        delete_candidate: |_| {
            to_body(&customer("Delete Test Customer", "deletetestcustomer@example.com", "1234567890"))
        },
        status: Some(activate_customer),
        children: vec![
            ChildFlowSpec {
                child: ChildKind::Task,
                payload: |_| {
                    to_body(&NewTask {
                        description: "Follow up call".to_string(),
                        due_date: "2023-12-31".to_string(),
                    })
                },
                fetch_by_id: true,
            },
            ChildFlowSpec {
                child: ChildKind::Complaint,
                payload: |_| {
                    to_body(&NewComplaint {
                        description: "Product not delivered".to_string(),
                        date: "2023-11-30".to_string(),
                    })
                },
                fetch_by_id: true,
            },
            ChildFlowSpec {
                child: ChildKind::Interaction,
                payload: |_| {
                    to_body(&NewInteraction {
                        kind: "Email".to_string(),
                        content: "Sent product catalog".to_string(),
                        date: "2023-10-10".to_string(),
                    })
                },
                fetch_by_id: false,
            },
            ChildFlowSpec {
                child: ChildKind::Note,
                payload: |_| {
                    to_body(&NewNote {
                        content: "Customer prefers email communication".to_string(),
                        date: "2023-10-15".to_string(),
                    })
                },
                fetch_by_id: false,
            },
            ChildFlowSpec {
                child: ChildKind::Attachment,
                payload: |_| {
                    to_body(&NewAttachment {
                        filename: "contract.pdf".to_string(),
                        filetype: "application/pdf".to_string(),
                        content: "base64_encoded_content_here".to_string(),
                    })
                },
                fetch_by_id: false,
            },
            ChildFlowSpec {
                child: ChildKind::CustomField,
                payload: |_| {
                    to_body(&NewCustomField {
                        field_name: "Preferred Language".to_string(),
                        field_value: "English".to_string(),
                    })
                },
                fetch_by_id: false,
            },
        ],
    }
}

/// Moves a customer to `Active`.
fn activate_customer(_: &Prerequisites) -> Result<Value, HarnessError> {
    to_body(&StatusUpdate {
        status: "Active".to_string(),
    })
}

/// Customer body.
fn customer(name: &str, email: &str, phone: &str) -> NewCustomer {
    NewCustomer {
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
    }
}

// ============================================================================
// SECTION: Products
// ============================================================================

/// Product suite.
#[must_use]
pub fn products() -> ResourceSpec {
    ResourceSpec {
        name: "products",
        kind: ResourceKind::Product,
        prerequisites: Vec::new(),
        create: |_| {
            to_body(&product("Test Product", "This is a test product", 99.99, 100, "Electronics"))
        },
        update: |_| {
            to_body(&product("Updated Test Product", "Updated description", 89.99, 150, "Gadgets"))
        },
        update_subject: None,
        list_subjects: Vec::new(),
        delete_candidate: |_| {
            to_body(&product("Delete Test Product", "This product will be deleted", 49.99, 10, "Misc"))
        },
        status: None,
        children: Vec::new(),
    }
}

/// Product body.
fn product(name: &str, description: &str, price: f64, stock: i64, category: &str) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: description.to_string(),
        price,
        stock,
        category: category.to_string(),
    }
}

// ============================================================================
// SECTION: Orders
// ============================================================================

/// Order suite; needs a customer and a product.
#[must_use]
pub fn orders() -> ResourceSpec {
    ResourceSpec {
        name: "orders",
        kind: ResourceKind::Order,
        prerequisites: vec![
            PrerequisiteSpec {
                kind: ResourceKind::Customer,
                payload: |_| {
                    to_body(&customer("Order Test Customer", "ordertest@example.com", "1234567890"))
                },
            },
            PrerequisiteSpec {
                kind: ResourceKind::Product,
                payload: |_| {
                    to_body(&product(
                        "Order Test Product",
                        "Product for order test",
                        99.99,
                        100,
                        "Electronics",
                    ))
                },
            },
        ],
        create: pending_order,
        update: |_| {
            to_body(&OrderUpdate {
                quantity: Some(2),
                total_price: Some(199.98),
                status: Some("Confirmed".to_string()),
            })
        },
        update_subject: None,
        list_subjects: Vec::new(),
        delete_candidate: pending_order,
        status: None,
        children: Vec::new(),
    }
}

/// One unit of the prerequisite product, pending.
fn pending_order(prerequisites: &Prerequisites) -> Result<Value, HarnessError> {
    to_body(&NewOrder {
        customer_id: prerequisites.id(ResourceKind::Customer)?.clone(),
        product_id: prerequisites.id(ResourceKind::Product)?.clone(),
        quantity: 1,
        total_price: 99.99,
        status: "Pending".to_string(),
    })
}

// ============================================================================
// SECTION: Inventory
// ============================================================================

/// Inventory suite; needs a product.
#[must_use]
pub fn inventory() -> ResourceSpec {
    ResourceSpec {
        name: "inventory",
        kind: ResourceKind::Inventory,
        prerequisites: vec![PrerequisiteSpec {
            kind: ResourceKind::Product,
            payload: |_| {
                to_body(&product(
                    "Inventory Test Product",
                    "Product for inventory test",
                    50.0,
                    200,
                    "Warehouse",
                ))
            },
        }],
        create: warehouse_a_stock,
        update: |_| {
            to_body(&InventoryUpdate {
                quantity: Some(80),
                location: Some("Warehouse B".to_string()),
            })
        },
        update_subject: None,
        list_subjects: Vec::new(),
        delete_candidate: warehouse_a_stock,
        status: None,
        children: Vec::new(),
    }
}

/// Stock record for the prerequisite product in Warehouse A.
fn warehouse_a_stock(prerequisites: &Prerequisites) -> Result<Value, HarnessError> {
    to_body(&NewInventory {
        product_id: prerequisites.id(ResourceKind::Product)?.clone(),
        quantity: 50,
        location: "Warehouse A".to_string(),
    })
}

// ============================================================================
// SECTION: Sales Opportunities
// ============================================================================

/// Sales opportunity suite; needs a customer.
#[must_use]
pub fn opportunities() -> ResourceSpec {
    ResourceSpec {
        name: "opportunities",
        kind: ResourceKind::Opportunity,
        prerequisites: vec![PrerequisiteSpec {
            kind: ResourceKind::Customer,
            payload: |_| {
                to_body(&customer(
                    "Test Customer for Sales Opportunity",
                    "salesopportunity@example.com",
                    "1234567890",
                ))
            },
        }],
        create: |prerequisites| {
            opportunity(prerequisites, "New Sales Opportunity", "Potential deal with high value", 50000.0)
        },
        update: |_| {
            to_body(&OpportunityUpdate {
                title: Some("Updated Sales Opportunity".to_string()),
                description: Some("Updated description".to_string()),
                value: Some(45000.0),
                status: Some("In Progress".to_string()),
            })
        },
        update_subject: Some(opportunity_to_update),
        list_subjects: vec![first_opportunity, second_opportunity],
        delete_candidate: |prerequisites| {
            opportunity(prerequisites, "Sales Opportunity to Delete", "This will be deleted", 10000.0)
        },
        status: None,
        children: Vec::new(),
    }
}

/// Subject of the opportunity update scenario.
fn opportunity_to_update(prerequisites: &Prerequisites) -> Result<Value, HarnessError> {
    opportunity(prerequisites, "Sales Opportunity to Update", "Initial description", 30000.0)
}

/// First of the two opportunities listed together.
fn first_opportunity(prerequisites: &Prerequisites) -> Result<Value, HarnessError> {
    opportunity(prerequisites, "First Sales Opportunity", "First deal", 20000.0)
}

/// Second of the two opportunities listed together.
fn second_opportunity(prerequisites: &Prerequisites) -> Result<Value, HarnessError> {
    opportunity(prerequisites, "Second Sales Opportunity", "Second deal", 40000.0)
}

/// Opportunity body for the prerequisite customer.
fn opportunity(
    prerequisites: &Prerequisites,
    title: &str,
    description: &str,
    value: f64,
) -> Result<Value, HarnessError> {
    to_body(&NewOpportunity {
        customer_id: prerequisites.id(ResourceKind::Customer)?.clone(),
        title: title.to_string(),
        description: description.to_string(),
        value,
        status: "Open".to_string(),
    })
}

// ============================================================================
// SECTION: Users
// ============================================================================

/// User suite; `password` is write-only and never compared.
#[must_use]
pub fn users() -> ResourceSpec {
    ResourceSpec {
        name: "users",
        kind: ResourceKind::User,
        prerequisites: Vec::new(),
        create: |_| to_body(&user("testuser", "testuser@example.com")),
        update: |_| {
            to_body(&UserUpdate {
                username: Some("updateduser".to_string()),
                email: Some("updateduser@example.com".to_string()),
                role: Some("admin".to_string()),
            })
        },
        update_subject: None,
        list_subjects: Vec::new(),
        delete_candidate: |_| to_body(&user("deletetestuser", "deletetestuser@example.com")),
        status: None,
        children: Vec::new(),
    }
}

/// User body with the shared test password.
fn user(username: &str, email: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: email.to_string(),
        password: "password123".to_string(),
        role: "user".to_string(),
    }
}
