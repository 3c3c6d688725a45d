// crates/crm-harness/src/assert.rs
// ============================================================================
// Module: Record Assertions
// Description: Equality checks over re-fetched CRM records and collections.
// Purpose: Turn assertion failures into typed, reportable harness errors.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Text fields compare by string equality; numeric fields compare by value,
//! so `50` and `50.0` are equal. Every check returns a [`HarnessError`]
//! instead of panicking so scenario fixtures are released normally.

use serde_json::Map;
use serde_json::Value;

use crate::error::HarnessError;
use crate::resource::ResourceId;

/// Returns true when two JSON values are equal, with numeric equality for
/// numbers.
#[must_use]
#[allow(clippy::float_cmp, reason = "Exact equality mirrors the API contract.")]
pub fn values_match(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(left), Value::Number(right)) => {
            if let (Some(left), Some(right)) = (left.as_i64(), right.as_i64()) {
                return left == right;
            }
            match (left.as_f64(), right.as_f64()) {
                (Some(left), Some(right)) => left == right,
                _ => left == right,
            }
        }
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && left.iter().zip(right.iter()).all(|(left, right)| values_match(left, right))
        }
        _ => expected == actual,
    }
}

/// Asserts that every expected field is present in `record` and matches.
///
/// # Errors
///
/// Returns [`HarnessError::UnexpectedShape`] when `record` is not an object,
/// [`HarnessError::MissingField`] for absent fields, and
/// [`HarnessError::FieldMismatch`] for the first differing field.
pub fn expect_fields(
    context: &str,
    record: &Value,
    expected: &Map<String, Value>,
) -> Result<(), HarnessError> {
    let Some(fields) = record.as_object() else {
        return Err(HarnessError::UnexpectedShape {
            context: context.to_string(),
            message: "expected a JSON object".to_string(),
        });
    };
    for (field, expected_value) in expected {
        let actual = fields.get(field).ok_or_else(|| HarnessError::MissingField {
            context: context.to_string(),
            field: field.clone(),
        })?;
        if !values_match(expected_value, actual) {
            return Err(HarnessError::FieldMismatch {
                context: context.to_string(),
                field: field.clone(),
                expected: expected_value.clone(),
                actual: actual.clone(),
            });
        }
    }
    Ok(())
}

/// Asserts that a collection is non-empty.
///
/// # Errors
///
/// Returns [`HarnessError::EmptyCollection`] when `records` is empty.
pub fn expect_non_empty(context: &str, records: &[Value]) -> Result<(), HarnessError> {
    if records.is_empty() {
        return Err(HarnessError::EmptyCollection {
            context: context.to_string(),
        });
    }
    Ok(())
}

/// Asserts that a collection contains a record whose `id` equals `id`.
///
/// # Errors
///
/// Returns [`HarnessError::NotListed`] when no record carries the id.
pub fn expect_listed(context: &str, records: &[Value], id: &ResourceId) -> Result<(), HarnessError> {
    let expected = id.to_value();
    let found = records
        .iter()
        .filter_map(|record| record.get("id"))
        .any(|actual| values_match(&expected, actual) || id_text_matches(id, actual));
    if found {
        return Ok(());
    }
    Err(HarnessError::NotListed {
        context: context.to_string(),
        id: id.to_string(),
    })
}

/// Matches ids that differ only in JSON representation (`7` vs `"7"`).
fn id_text_matches(id: &ResourceId, actual: &Value) -> bool {
    ResourceId::from_value(actual).is_some_and(|other| other.to_string() == id.to_string())
}
