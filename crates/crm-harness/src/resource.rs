// crates/crm-harness/src/resource.rs
// ============================================================================
// Module: Resource Primitives
// Description: Create, fetch, update, delete, and list per CRM resource type.
// Purpose: Bind expected status codes to each primitive operation.
// Dependencies: percent-encoding, reqwest, serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! Each CRM resource type is addressed through [`ResourceKind`] and driven
//! through [`ResourceApi`]. A primitive succeeds only on its expected status
//! (201 for create, 200 for fetch/update/list, 204 for delete); any other
//! status aborts with [`HarnessError::UnexpectedStatus`]. Customer
//! sub-resources ([`ChildKind`]) hang off a parent id.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;
use percent_encoding::utf8_percent_encode;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::client::ApiResponse;
use crate::client::CrmClient;
use crate::error::HarnessError;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Bytes escaped in a path segment: everything except RFC 3986 unreserved.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Server-assigned identifier, integer or text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    /// Integer identifier.
    Int(i64),
    /// Text identifier.
    Text(String),
}

impl ResourceId {
    /// Reads an identifier from a JSON value.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_i64().map(Self::Int),
            Value::String(text) if !text.trim().is_empty() => Some(Self::Text(text.clone())),
            _ => None,
        }
    }

    /// Returns the identifier as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(value) => Value::from(*value),
            Self::Text(value) => Value::from(value.as_str()),
        }
    }

    /// Returns the identifier as a single percent-encoded path segment.
    #[must_use]
    pub fn path_segment(&self) -> String {
        match self {
            Self::Int(value) => value.to_string(),
            Self::Text(value) => utf8_percent_encode(value, PATH_SEGMENT).to_string(),
        }
    }

    /// Extracts the `id` field of a record.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::MissingField`] when `id` is absent or not an
    /// integer or non-empty string.
    pub fn from_record(record: &Value, context: &str) -> Result<Self, HarnessError> {
        record.get("id").and_then(Self::from_value).ok_or_else(|| HarnessError::MissingField {
            context: context.to_string(),
            field: "id".to_string(),
        })
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

// ============================================================================
// SECTION: Resource Kinds
// ============================================================================

/// Top-level CRM resource types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// `/customers`
    Customer,
    /// `/products`
    Product,
    /// `/orders`
    Order,
    /// `/inventory`
    Inventory,
    /// `/opportunities`
    Opportunity,
    /// `/users`
    User,
}

impl ResourceKind {
    /// Returns every resource kind.
    #[must_use]
    pub const fn all() -> [Self; 6] {
        [
            Self::Customer,
            Self::Product,
            Self::Order,
            Self::Inventory,
            Self::Opportunity,
            Self::User,
        ]
    }

    /// Returns the collection path segment.
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Customer => "customers",
            Self::Product => "products",
            Self::Order => "orders",
            Self::Inventory => "inventory",
            Self::Opportunity => "opportunities",
            Self::User => "users",
        }
    }

    /// Returns a singular label for logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Product => "product",
            Self::Order => "order",
            Self::Inventory => "inventory record",
            Self::Opportunity => "sales opportunity",
            Self::User => "user",
        }
    }

    /// Fields accepted on write but never returned on read.
    #[must_use]
    pub const fn write_only_fields(self) -> &'static [&'static str] {
        match self {
            Self::User => &["password"],
            _ => &[],
        }
    }

    /// Returns `/collection`.
    #[must_use]
    pub fn collection_path(self) -> String {
        format!("/{}", self.collection())
    }

    /// Returns `/collection/{id}`.
    #[must_use]
    pub fn item_path(self, id: &ResourceId) -> String {
        format!("/{}/{}", self.collection(), id.path_segment())
    }

    /// Parses a collection segment back into a kind.
    #[must_use]
    pub fn from_collection(segment: &str) -> Option<Self> {
        Self::all().into_iter().find(|kind| kind.collection() == segment)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

/// Customer-owned sub-resource types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildKind {
    /// Assigned follow-up tasks.
    Task,
    /// Logged complaints.
    Complaint,
    /// Interaction history entries.
    Interaction,
    /// Free-form notes.
    Note,
    /// Uploaded attachments.
    Attachment,
    /// Custom key/value fields.
    CustomField,
}

impl ChildKind {
    /// Returns every child kind.
    #[must_use]
    pub const fn all() -> [Self; 6] {
        [
            Self::Task,
            Self::Complaint,
            Self::Interaction,
            Self::Note,
            Self::Attachment,
            Self::CustomField,
        ]
    }

    /// Returns the path segment under the parent.
    #[must_use]
    pub const fn segment(self) -> &'static str {
        match self {
            Self::Task => "tasks",
            Self::Complaint => "complaints",
            Self::Interaction => "interactions",
            Self::Note => "notes",
            Self::Attachment => "attachments",
            Self::CustomField => "custom_fields",
        }
    }

    /// Parses a path segment back into a child kind.
    #[must_use]
    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::all().into_iter().find(|kind| kind.segment() == segment)
    }
}

impl fmt::Display for ChildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

// ============================================================================
// SECTION: Primitives
// ============================================================================

/// Primitive operations for one resource kind.
#[derive(Clone, Copy)]
pub struct ResourceApi<'c> {
    /// Client used for every call.
    client: &'c CrmClient,
    /// Resource kind addressed by this handle.
    kind: ResourceKind,
}

impl<'c> ResourceApi<'c> {
    /// Binds a client to a resource kind.
    #[must_use]
    pub const fn new(client: &'c CrmClient, kind: ResourceKind) -> Self {
        Self {
            client,
            kind,
        }
    }

    /// Returns the resource kind.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Returns the bound client.
    #[must_use]
    pub const fn client(&self) -> &'c CrmClient {
        self.client
    }

    /// Creates a resource and returns its id. Expects 201.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] on transport failure, a non-201 status, or a
    /// body without an `id`.
    pub fn create(&self, payload: &Value) -> Result<ResourceId, HarnessError> {
        let path = self.kind.collection_path();
        let response = self.client.post(&path, payload)?.expect_status(StatusCode::CREATED)?;
        let id = ResourceId::from_record(&response.json()?, &path)?;
        info!(kind = %self.kind, %id, "created {}", self.kind.label());
        Ok(id)
    }

    /// Fetches the current server state. Expects 200.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] on transport failure, a non-200 status, or a
    /// non-JSON body.
    pub fn fetch(&self, id: &ResourceId) -> Result<Value, HarnessError> {
        let response =
            self.client.get(&self.kind.item_path(id))?.expect_status(StatusCode::OK)?;
        response.json()
    }

    /// Replaces or merges fields of a resource. Expects 200; does not re-verify.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] on transport failure or a non-200 status.
    pub fn update(&self, id: &ResourceId, payload: &Value) -> Result<(), HarnessError> {
        self.client.put(&self.kind.item_path(id), payload)?.expect_status(StatusCode::OK)?;
        info!(kind = %self.kind, %id, "updated {}", self.kind.label());
        Ok(())
    }

    /// Deletes a resource. Expects 204.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] on transport failure or a non-204 status.
    pub fn delete(&self, id: &ResourceId) -> Result<(), HarnessError> {
        self.client.delete(&self.kind.item_path(id))?.expect_status(StatusCode::NO_CONTENT)?;
        info!(kind = %self.kind, %id, "deleted {}", self.kind.label());
        Ok(())
    }

    /// Lists the collection. Expects 200.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] on transport failure, a non-200 status, or a
    /// body that is not a collection.
    pub fn list(&self) -> Result<Vec<Value>, HarnessError> {
        let response =
            self.client.get(&self.kind.collection_path())?.expect_status(StatusCode::OK)?;
        collection_items(&response)
    }

    /// Asserts that a resource no longer exists. Expects 404.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] on transport failure or any status other
    /// than 404.
    pub fn expect_absent(&self, id: &ResourceId) -> Result<(), HarnessError> {
        self.client.get(&self.kind.item_path(id))?.expect_status(StatusCode::NOT_FOUND)?;
        info!(kind = %self.kind, %id, "verified {} no longer exists", self.kind.label());
        Ok(())
    }

    /// Sends `PATCH /collection/{id}/status`. Expects 200.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] on transport failure or a non-200 status.
    pub fn update_status(&self, id: &ResourceId, payload: &Value) -> Result<(), HarnessError> {
        let path = format!("{}/status", self.kind.item_path(id));
        self.client.patch(&path, payload)?.expect_status(StatusCode::OK)?;
        info!(kind = %self.kind, %id, "updated {} status", self.kind.label());
        Ok(())
    }

    /// Binds a child collection under `parent`.
    #[must_use]
    pub const fn children<'a>(&self, parent: &'a ResourceId, child: ChildKind) -> ChildApi<'a>
    where
        'c: 'a,
    {
        ChildApi {
            client: self.client,
            parent_kind: self.kind,
            parent,
            child,
        }
    }
}

/// Primitive operations for a sub-resource collection.
#[derive(Clone, Copy)]
pub struct ChildApi<'a> {
    /// Client used for every call.
    client: &'a CrmClient,
    /// Owning resource kind.
    parent_kind: ResourceKind,
    /// Owning resource id.
    parent: &'a ResourceId,
    /// Child collection.
    child: ChildKind,
}

impl ChildApi<'_> {
    /// Returns `/parent/{id}/child`.
    #[must_use]
    pub fn collection_path(&self) -> String {
        format!("{}/{}", self.parent_kind.item_path(self.parent), self.child.segment())
    }

    /// Creates a child record. Expects 201.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] on transport failure, a non-201 status, or a
    /// body without an `id`.
    pub fn create(&self, payload: &Value) -> Result<ResourceId, HarnessError> {
        let path = self.collection_path();
        let response = self.client.post(&path, payload)?.expect_status(StatusCode::CREATED)?;
        let id = ResourceId::from_record(&response.json()?, &path)?;
        info!(
            parent = %self.parent,
            child = %self.child,
            %id,
            "created {} under {}",
            self.child,
            self.parent_kind.label()
        );
        Ok(id)
    }

    /// Fetches one child record. Expects 200.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] on transport failure, a non-200 status, or a
    /// non-JSON body.
    pub fn fetch(&self, id: &ResourceId) -> Result<Value, HarnessError> {
        let path = format!("{}/{}", self.collection_path(), id.path_segment());
        self.client.get(&path)?.expect_status(StatusCode::OK)?.json()
    }

    /// Lists the child collection. Expects 200.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] on transport failure, a non-200 status, or a
    /// body that is not a collection.
    pub fn list(&self) -> Result<Vec<Value>, HarnessError> {
        let response =
            self.client.get(&self.collection_path())?.expect_status(StatusCode::OK)?;
        collection_items(&response)
    }
}

/// Reads a list body: a JSON array, or an object wrapping one under
/// `items` or `data`.
fn collection_items(response: &ApiResponse) -> Result<Vec<Value>, HarnessError> {
    match response.json()? {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            for key in ["items", "data"] {
                if let Some(Value::Array(items)) = map.remove(key) {
                    return Ok(items);
                }
            }
            Err(HarnessError::UnexpectedShape {
                context: response.path().to_string(),
                message: "expected an array or an object with `items` or `data`".to_string(),
            })
        }
        other => Err(HarnessError::UnexpectedShape {
            context: response.path().to_string(),
            message: format!("expected an array, got {other}"),
        }),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
