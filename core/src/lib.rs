//! Core domain model and contracts for the ordersync dual-store backend.
//!
//! ordersync keeps two heterogeneous stores synchronized for every write to
//! an order aggregate:
//!
//! - a **transactional store** (`PostgreSQL`, system of record), and
//! - an **index store** (search engine, read-optimized, eventually consistent).
//!
//! This crate holds everything the infrastructure crates share:
//!
//! - the order aggregate ([`order::Order`], [`order::OrderItem`],
//!   [`order::OrderStatus`] with its modifiability state machine)
//! - the error taxonomy ([`error::OrderError`], [`error::IndexError`],
//!   [`error::PublishError`])
//! - pagination shapes ([`pagination::PageRequest`], [`pagination::Paginated`])
//! - pure validation ([`validation::validate_items`])
//! - reconciliation types for failed index propagations
//!   ([`reconciliation::ReconciliationRecord`])
//! - lifecycle events ([`event::OrderEvent`])
//! - the trait contracts implemented by the `postgres`, `search`, and
//!   `events` crates ([`contracts`])
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ OrderService │  (service crate)
//! └──────┬───────┘
//!        │ OrderStore / OrderIndex / ReconciliationStore / EventPublisher
//!        ▼
//! ┌──────────┐  ┌──────────┐  ┌──────────────┐  ┌──────────┐
//! │ postgres │  │  search  │  │ reconciliation│ │  events  │
//! │ (record) │  │ (index)  │  │   (records)   │ │ (Kafka)  │
//! └──────────┘  └──────────┘  └──────────────┘  └──────────┘
//! ```
//!
//! The index store is always a read optimization, never a dependency for
//! correctness: every read path has a transactional-store escape hatch.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod contracts;
pub mod error;
pub mod event;
pub mod order;
pub mod pagination;
pub mod reconciliation;
pub mod validation;

pub use contracts::{EventPublisher, OrderIndex, OrderStore, ReconciliationStore};
pub use error::{IndexError, OrderError, PublishError, Result};
pub use event::OrderEvent;
pub use order::{NewOrderItem, Order, OrderItem, OrderPatch, OrderStatus, compute_total};
pub use pagination::{PageRequest, Paginated};
pub use reconciliation::{OperationKind, ReconciliationRecord, ReconciliationStatus};
