//! The order aggregate: `Order`, `OrderItem`, and the status state machine.
//!
//! Orders progress through states:
//! Pending → Processing → Shipped → Delivered, with cancellation allowed
//! from any non-terminal state. `Delivered` and `Canceled` are terminal and
//! not modifiable.
//!
//! Money is always an integer amount in minor currency units (cents), never
//! floating point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Status of an order in its lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order has been created and awaits processing (initial state).
    Pending,
    /// Order is being prepared for shipment.
    Processing,
    /// Order has left the warehouse.
    Shipped,
    /// Order reached the customer (terminal).
    Delivered,
    /// Order was cancelled before delivery (terminal).
    Canceled,
}

impl OrderStatus {
    /// Returns `true` if an order in this status permits field updates or
    /// cancellation.
    ///
    /// This is the single modifiability predicate checked before any
    /// mutating operation acquires a transaction.
    #[must_use]
    pub const fn is_modifiable(self) -> bool {
        !matches!(self, Self::Delivered | Self::Canceled)
    }

    /// Storage string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Canceled => "CANCELED",
        }
    }

    /// Parse a status from its storage string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "PROCESSING" => Some(Self::Processing),
            "SHIPPED" => Some(Self::Shipped),
            "DELIVERED" => Some(Self::Delivered),
            "CANCELED" => Some(Self::Canceled),
            _ => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line item owned exclusively by one order.
///
/// Items are replaced wholesale on update (delete-all-then-insert-new),
/// never patched in place, so per-item identity is not stable across
/// updates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Internal sequential id (storage-only, never exposed).
    pub id: i64,
    /// Public identifier for the item.
    pub uuid: Uuid,
    /// Opaque product reference; not validated against a catalog here.
    pub product_id: String,
    /// Product name snapshot taken at order time.
    pub product_name: String,
    /// Unit price in minor currency units; always positive.
    pub price: i64,
    /// Quantity ordered; always positive.
    pub quantity: i64,
    /// Derived `price * quantity`, stored redundantly for query convenience.
    pub subtotal: i64,
}

/// The order aggregate root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Internal sequential id (storage-only, never exposed).
    pub id: i64,
    /// Public identifier; immutable once assigned, used as the index
    /// document id.
    pub uuid: Uuid,
    /// Opaque customer identifier.
    pub customer_id: String,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// Order total in minor currency units.
    pub total: i64,
    /// Server-assigned creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Server-assigned last-modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Line items, cascade-deleted with the order.
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Sum of the items' subtotals.
    ///
    /// After any successful write this equals [`Order::total`].
    #[must_use]
    pub fn computed_total(&self) -> i64 {
        self.items.iter().map(|i| i.subtotal).sum()
    }
}

/// Input shape for a new line item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    /// Opaque product reference.
    pub product_id: String,
    /// Product name snapshot.
    pub product_name: String,
    /// Unit price in minor currency units.
    pub price: i64,
    /// Quantity ordered.
    pub quantity: i64,
}

impl NewOrderItem {
    /// Creates a new line item input.
    #[must_use]
    pub const fn new(product_id: String, product_name: String, price: i64, quantity: i64) -> Self {
        Self {
            product_id,
            product_name,
            price,
            quantity,
        }
    }

    /// Derived subtotal for this item.
    #[must_use]
    pub const fn subtotal(&self) -> i64 {
        self.price * self.quantity
    }
}

/// Computes the order total over a set of new items.
///
/// An empty list yields 0; callers are expected to reject empty item lists
/// through validation before reaching the store.
#[must_use]
pub fn compute_total(items: &[NewOrderItem]) -> i64 {
    items.iter().map(NewOrderItem::subtotal).sum()
}

/// A partial update to an order.
///
/// Each present field becomes a separate statement inside one transaction;
/// `items` replaces the full item set and recomputes the total.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPatch {
    /// Replacement item set, if any.
    pub items: Option<Vec<NewOrderItem>>,
    /// New status, if any.
    pub status: Option<OrderStatus>,
    /// New customer identifier, if any.
    pub customer_id: Option<String>,
}

impl OrderPatch {
    /// Returns `true` when the patch carries no changes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_none() && self.status.is_none() && self.customer_id.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn terminal_states_are_not_modifiable() {
        assert!(OrderStatus::Pending.is_modifiable());
        assert!(OrderStatus::Processing.is_modifiable());
        assert!(OrderStatus::Shipped.is_modifiable());
        assert!(!OrderStatus::Delivered.is_modifiable());
        assert!(!OrderStatus::Canceled.is_modifiable());
    }

    #[test]
    fn status_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Canceled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("SHIPPED?"), None);
    }

    #[test]
    fn total_is_sum_of_price_times_quantity() {
        let items = vec![
            NewOrderItem::new("p1".into(), "Widget".into(), 1500, 2),
            NewOrderItem::new("p2".into(), "Gadget".into(), 1500, 1),
        ];
        assert_eq!(compute_total(&items), 4500);
    }

    #[test]
    fn empty_items_total_is_zero() {
        assert_eq!(compute_total(&[]), 0);
    }

    #[test]
    fn empty_patch() {
        assert!(OrderPatch::default().is_empty());
        let patch = OrderPatch {
            status: Some(OrderStatus::Processing),
            ..OrderPatch::default()
        };
        assert!(!patch.is_empty());
    }
}
