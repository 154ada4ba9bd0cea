//! Order lifecycle events announced on the message bus.
//!
//! Events are notifications only: the transactional write has already
//! committed by the time one is emitted (write-then-notify), and indexing
//! does not depend on them.

use crate::order::{Order, OrderStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Topic carrying all order lifecycle events.
pub const ORDER_EVENTS_TOPIC: &str = "orders.events";

/// A lifecycle transition of an order aggregate.
///
/// Serialized as JSON with a `type` discriminator; messages are keyed by
/// order UUID so one order's events share a partition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEvent {
    /// A new order was created.
    Created {
        /// Public order identifier.
        order_uuid: Uuid,
        /// Customer who placed the order.
        customer_id: String,
        /// Status after the transition.
        status: OrderStatus,
        /// Order total in minor currency units.
        total: i64,
        /// When the transition happened.
        occurred_at: DateTime<Utc>,
    },
    /// An order's fields or items changed.
    Updated {
        /// Public order identifier.
        order_uuid: Uuid,
        /// Customer who owns the order.
        customer_id: String,
        /// Status after the transition.
        status: OrderStatus,
        /// Order total in minor currency units.
        total: i64,
        /// When the transition happened.
        occurred_at: DateTime<Utc>,
    },
    /// An order was cancelled.
    Canceled {
        /// Public order identifier.
        order_uuid: Uuid,
        /// Customer who owns the order.
        customer_id: String,
        /// Status after the transition.
        status: OrderStatus,
        /// Order total in minor currency units.
        total: i64,
        /// When the transition happened.
        occurred_at: DateTime<Utc>,
    },
}

impl OrderEvent {
    /// Builds a `Created` event from a freshly persisted order.
    #[must_use]
    pub fn created(order: &Order) -> Self {
        Self::Created {
            order_uuid: order.uuid,
            customer_id: order.customer_id.clone(),
            status: order.status,
            total: order.total,
            occurred_at: Utc::now(),
        }
    }

    /// Builds an `Updated` event from the re-read order state.
    #[must_use]
    pub fn updated(order: &Order) -> Self {
        Self::Updated {
            order_uuid: order.uuid,
            customer_id: order.customer_id.clone(),
            status: order.status,
            total: order.total,
            occurred_at: Utc::now(),
        }
    }

    /// Builds a `Canceled` event from the cancelled order state.
    #[must_use]
    pub fn canceled(order: &Order) -> Self {
        Self::Canceled {
            order_uuid: order.uuid,
            customer_id: order.customer_id.clone(),
            status: order.status,
            total: order.total,
            occurred_at: Utc::now(),
        }
    }

    /// The order UUID, used as the message key.
    #[must_use]
    pub const fn order_uuid(&self) -> Uuid {
        match self {
            Self::Created { order_uuid, .. }
            | Self::Updated { order_uuid, .. }
            | Self::Canceled { order_uuid, .. } => *order_uuid,
        }
    }

    /// Stable event-type name for logging.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Created { .. } => "ORDER_CREATED",
            Self::Updated { .. } => "ORDER_UPDATED",
            Self::Canceled { .. } => "ORDER_CANCELED",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    fn sample_order() -> Order {
        Order {
            id: 1,
            uuid: Uuid::new_v4(),
            customer_id: "cust-1".into(),
            status: OrderStatus::Pending,
            total: 4500,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            items: vec![],
        }
    }

    #[test]
    fn created_event_carries_order_identity() {
        let order = sample_order();
        let event = OrderEvent::created(&order);
        assert_eq!(event.order_uuid(), order.uuid);
        assert_eq!(event.event_type(), "ORDER_CREATED");
    }

    #[test]
    fn event_json_has_type_discriminator() {
        let order = sample_order();
        let json = serde_json::to_value(OrderEvent::canceled(&order)).unwrap();
        assert_eq!(json["type"], "CANCELED");
        assert_eq!(json["total"], 4500);
    }

    #[test]
    fn event_json_roundtrip() {
        let order = sample_order();
        let event = OrderEvent::updated(&order);
        let json = serde_json::to_string(&event).unwrap();
        let back: OrderEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
