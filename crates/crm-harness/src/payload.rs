// crates/crm-harness/src/payload.rs
// ============================================================================
// Module: Request Payloads
// Description: Typed request bodies for CRM resources and sub-resources.
// Purpose: Keep payload field names in one place and serialize them as JSON.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! `New*` structs are full creation bodies; `*Update` structs are partial
//! update bodies whose unset fields are omitted from the JSON. Payloads are
//! converted to JSON objects with [`to_fields`] before they are sent, so the
//! same map doubles as the set of expected fields on read-back.

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::error::HarnessError;
use crate::resource::ResourceId;

/// Serializes a payload into a JSON object.
///
/// # Errors
///
/// Returns [`HarnessError::UnexpectedShape`] when the payload does not
/// serialize to a JSON object.
pub fn to_fields<T: Serialize>(payload: &T) -> Result<Map<String, Value>, HarnessError> {
    match serde_json::to_value(payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(HarnessError::UnexpectedShape {
            context: "payload".to_string(),
            message: format!("expected a JSON object, got {other}"),
        }),
        Err(err) => Err(HarnessError::UnexpectedShape {
            context: "payload".to_string(),
            message: err.to_string(),
        }),
    }
}

/// Serializes a payload into a JSON value holding an object.
///
/// # Errors
///
/// Returns [`HarnessError::UnexpectedShape`] when the payload does not
/// serialize to a JSON object.
pub fn to_body<T: Serialize>(payload: &T) -> Result<Value, HarnessError> {
    to_fields(payload).map(Value::Object)
}

// ============================================================================
// SECTION: Customers
// ============================================================================

/// Customer creation body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCustomer {
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone.
    pub phone: String,
}

/// Customer status transition body for `PATCH /customers/{id}/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    /// New status label.
    pub status: String,
}

// ============================================================================
// SECTION: Products
// ============================================================================

/// Product creation and full-update body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProduct {
    /// Product name.
    pub name: String,
    /// Product description.
    pub description: String,
    /// Unit price.
    pub price: f64,
    /// Units in stock.
    pub stock: i64,
    /// Category label.
    pub category: String,
}

// ============================================================================
// SECTION: Orders
// ============================================================================

/// Order creation body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewOrder {
    /// Ordering customer.
    pub customer_id: ResourceId,
    /// Ordered product.
    pub product_id: ResourceId,
    /// Units ordered.
    pub quantity: i64,
    /// Order total.
    pub total_price: f64,
    /// Order status label.
    pub status: String,
}

/// Partial order update body.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct OrderUpdate {
    /// Units ordered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    /// Order total.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
    /// Order status label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

// ============================================================================
// SECTION: Inventory
// ============================================================================

/// Inventory record creation body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewInventory {
    /// Stocked product.
    pub product_id: ResourceId,
    /// Units on hand.
    pub quantity: i64,
    /// Storage location.
    pub location: String,
}

/// Partial inventory update body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct InventoryUpdate {
    /// Units on hand.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    /// Storage location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

// ============================================================================
// SECTION: Sales Opportunities
// ============================================================================

/// Sales opportunity creation body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewOpportunity {
    /// Prospective customer.
    pub customer_id: ResourceId,
    /// Opportunity title.
    pub title: String,
    /// Opportunity description.
    pub description: String,
    /// Estimated deal value.
    pub value: f64,
    /// Pipeline status label.
    pub status: String,
}

/// Partial sales opportunity update body.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct OpportunityUpdate {
    /// Opportunity title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Opportunity description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Estimated deal value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Pipeline status label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

// ============================================================================
// SECTION: Users
// ============================================================================

/// User creation body.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    /// Login name.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Initial password (write-only).
    pub password: String,
    /// Role label.
    pub role: String,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Partial user update body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct UserUpdate {
    /// Login name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Contact email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Role label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

// ============================================================================
// SECTION: Customer Sub-Resources
// ============================================================================

/// Task assigned to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTask {
    /// Task description.
    pub description: String,
    /// Due date (`YYYY-MM-DD`).
    pub due_date: String,
}

/// Complaint logged for a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewComplaint {
    /// Complaint description.
    pub description: String,
    /// Complaint date (`YYYY-MM-DD`).
    pub date: String,
}

/// Interaction logged for a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewInteraction {
    /// Interaction channel (for example `Email`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Interaction summary.
    pub content: String,
    /// Interaction date (`YYYY-MM-DD`).
    pub date: String,
}

/// Note attached to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewNote {
    /// Note text.
    pub content: String,
    /// Note date (`YYYY-MM-DD`).
    pub date: String,
}

/// Attachment uploaded for a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAttachment {
    /// File name.
    pub filename: String,
    /// MIME type.
    pub filetype: String,
    /// Encoded file content.
    pub content: String,
}

/// Custom field added to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCustomField {
    /// Field label.
    pub field_name: String,
    /// Field value.
    pub field_value: String,
}
