//! The index document shape for an order, and the index-store response
//! envelopes.
//!
//! The persisted document is flat and denormalized — no nested entity
//! references, money as integers, ISO-8601 timestamps — and must stay
//! stable: `{uuid, customerId, status, total, createdAt, updatedAt,
//! items: [...]}`.

use chrono::{DateTime, Utc};
use ordersync_core::{Order, OrderItem, OrderStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One order as stored in the index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDocument {
    /// Public order identifier; doubles as the document id.
    pub uuid: Uuid,
    /// Opaque customer identifier.
    pub customer_id: String,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Order total in minor currency units.
    pub total: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Flattened line items.
    pub items: Vec<ItemDocument>,
}

/// One line item inside an [`OrderDocument`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDocument {
    /// Public item identifier.
    pub uuid: Uuid,
    /// Opaque product reference.
    pub product_id: String,
    /// Product name snapshot.
    pub product_name: String,
    /// Unit price in minor currency units.
    pub price: i64,
    /// Quantity ordered.
    pub quantity: i64,
    /// Derived `price * quantity`.
    pub subtotal: i64,
}

impl OrderDocument {
    /// Flattens an order into its document shape.
    #[must_use]
    pub fn from_order(order: &Order) -> Self {
        Self {
            uuid: order.uuid,
            customer_id: order.customer_id.clone(),
            status: order.status,
            total: order.total,
            created_at: order.created_at,
            updated_at: order.updated_at,
            items: order
                .items
                .iter()
                .map(|item| ItemDocument {
                    uuid: item.uuid,
                    product_id: item.product_id.clone(),
                    product_name: item.product_name.clone(),
                    price: item.price,
                    quantity: item.quantity,
                    subtotal: item.subtotal,
                })
                .collect(),
        }
    }

    /// Reconstructs the order shape from a document.
    ///
    /// Internal ids are not stored in the index and come back as 0; uuid,
    /// customer, status, total, and item fields round-trip exactly.
    #[must_use]
    pub fn into_order(self) -> Order {
        Order {
            id: 0,
            uuid: self.uuid,
            customer_id: self.customer_id,
            status: self.status,
            total: self.total,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items: self
                .items
                .into_iter()
                .map(|item| OrderItem {
                    id: 0,
                    uuid: item.uuid,
                    product_id: item.product_id,
                    product_name: item.product_name,
                    price: item.price,
                    quantity: item.quantity,
                    subtotal: item.subtotal,
                })
                .collect(),
        }
    }
}

/// A `_search` response, either flat or wrapped in `{body: ...}` — both
/// shapes occur across index-store client versions.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SearchResponse {
    /// `{body: {hits: ...}}` wrapped shape.
    Wrapped {
        /// The wrapped payload.
        body: SearchBody,
    },
    /// Flat `{hits: ...}` shape.
    Flat(SearchBody),
}

impl SearchResponse {
    /// Unwraps to the payload regardless of shape.
    #[must_use]
    pub fn into_body(self) -> SearchBody {
        match self {
            Self::Wrapped { body } | Self::Flat(body) => body,
        }
    }
}

/// The payload of a `_search` response.
#[derive(Debug, Deserialize)]
pub struct SearchBody {
    /// Hit envelope.
    pub hits: HitsEnvelope,
}

/// Hits plus the total count.
#[derive(Debug, Deserialize)]
pub struct HitsEnvelope {
    /// Total matching documents, in either response version.
    pub total: TotalShape,
    /// The page of hits.
    pub hits: Vec<Hit>,
}

/// One search hit carrying the stored document.
#[derive(Debug, Deserialize)]
pub struct Hit {
    /// The stored document.
    #[serde(rename = "_source")]
    pub source: OrderDocument,
}

/// Total count heterogeneity: bare number in older responses,
/// `{value, relation}` in newer ones.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TotalShape {
    /// Bare numeric total.
    Bare(u64),
    /// Structured total.
    Structured {
        /// The count.
        value: u64,
        /// `"eq"` or `"gte"`; informational only.
        #[serde(default)]
        relation: Option<String>,
    },
}

impl TotalShape {
    /// The numeric total in either shape.
    #[must_use]
    pub const fn value(&self) -> u64 {
        match self {
            Self::Bare(value) | Self::Structured { value, .. } => *value,
        }
    }
}
