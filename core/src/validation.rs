//! Pure input validation, invoked synchronously before any store call.
//!
//! Validation returns a list of violations rather than failing on the first
//! problem, so the caller can surface every reason at once.

use crate::error::{OrderError, Result};
use crate::order::NewOrderItem;

/// Validates a new or replacement item list.
///
/// Violations: empty list, non-positive price or quantity, missing product
/// id or name.
#[must_use]
pub fn validate_items(items: &[NewOrderItem]) -> Vec<String> {
    let mut violations = Vec::new();

    if items.is_empty() {
        violations.push("order must contain at least one item".to_string());
        return violations;
    }

    for (i, item) in items.iter().enumerate() {
        if item.product_id.trim().is_empty() {
            violations.push(format!("items[{i}]: product_id must not be empty"));
        }
        if item.product_name.trim().is_empty() {
            violations.push(format!("items[{i}]: product_name must not be empty"));
        }
        if item.price <= 0 {
            violations.push(format!("items[{i}]: price must be positive"));
        }
        if item.quantity <= 0 {
            violations.push(format!("items[{i}]: quantity must be positive"));
        }
    }

    violations
}

/// Validates an item list, turning violations into a domain error.
///
/// # Errors
///
/// Returns [`OrderError::Validation`] with itemized reasons.
pub fn ensure_valid_items(items: &[NewOrderItem]) -> Result<()> {
    let violations = validate_items(items);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(OrderError::Validation { violations })
    }
}
