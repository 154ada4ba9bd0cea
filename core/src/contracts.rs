//! Trait contracts implemented by the infrastructure crates.
//!
//! The orchestrator in the `service` crate is generic over these traits, so
//! the transactional store, index store, reconciliation recorder, and event
//! publisher can each be swapped for in-memory fakes in tests (see the
//! `ordersync-testing` crate).

use crate::error::{IndexError, PublishError, Result};
use crate::event::OrderEvent;
use crate::order::{NewOrderItem, Order, OrderPatch};
use crate::pagination::{PageRequest, Paginated};
use uuid::Uuid;

/// The transactional system of record for orders.
///
/// Every mutation runs inside a single atomic transaction; not-found and
/// not-modifiable are domain errors, transaction failures are reported as
/// `CreateFailed`/`UpdateFailed` wrapping the cause.
pub trait OrderStore: Send + Sync {
    /// Creates an order with status `Pending` and the given items, then
    /// re-reads and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::OrderError::CreateFailed`] if the transaction fails.
    fn create(
        &self,
        customer_id: &str,
        items: Vec<NewOrderItem>,
    ) -> impl Future<Output = Result<Order>> + Send;

    /// Lists orders sorted by creation time descending.
    ///
    /// # Errors
    ///
    /// Returns [`crate::OrderError::Storage`] on query failure.
    fn find_all(&self, page: PageRequest) -> impl Future<Output = Result<Paginated<Order>>> + Send;

    /// Lists one customer's orders sorted by creation time descending.
    ///
    /// # Errors
    ///
    /// Returns [`crate::OrderError::Storage`] on query failure.
    fn find_by_customer(
        &self,
        customer_id: &str,
        page: PageRequest,
    ) -> impl Future<Output = Result<Paginated<Order>>> + Send;

    /// Looks up an order by internal id, items included.
    ///
    /// # Errors
    ///
    /// Returns [`crate::OrderError::NotFound`] when absent.
    fn find_by_id(&self, id: i64) -> impl Future<Output = Result<Order>> + Send;

    /// Looks up an order by public UUID, items included.
    ///
    /// # Errors
    ///
    /// Returns [`crate::OrderError::NotFound`] when absent.
    fn find_by_uuid(&self, uuid: Uuid) -> impl Future<Output = Result<Order>> + Send;

    /// Applies a patch inside one transaction: wholesale item replacement
    /// with total recomputation, then status, then customer id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::OrderError::NotModifiable`] for terminal orders,
    /// [`crate::OrderError::NotFound`] when absent, and
    /// [`crate::OrderError::UpdateFailed`] on transaction failure.
    fn update(&self, uuid: Uuid, patch: OrderPatch)
    -> impl Future<Output = Result<Order>> + Send;

    /// Sets status to `Canceled` after the modifiability check.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`OrderStore::update`].
    fn cancel(&self, uuid: Uuid) -> impl Future<Output = Result<Order>> + Send;
}

/// The denormalized, eventually consistent read-side copy of each order.
///
/// Never the system of record; this layer never falls back — that
/// responsibility belongs to the orchestrator.
pub trait OrderIndex: Send + Sync {
    /// Upserts the document for an order.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Unavailable`] or [`IndexError::Execution`]; a
    /// failure here means the change must be recorded for reconciliation.
    fn index_order(&self, order: &Order) -> impl Future<Output = std::result::Result<(), IndexError>> + Send;

    /// Upserts the document for an updated order (same semantics as
    /// [`OrderIndex::index_order`]; the index does not distinguish create
    /// from update).
    ///
    /// # Errors
    ///
    /// Same as [`OrderIndex::index_order`].
    fn update_order(&self, order: &Order) -> impl Future<Output = std::result::Result<(), IndexError>> + Send;

    /// Removes the document by order UUID. Deleting an absent document is
    /// success (idempotent delete).
    ///
    /// # Errors
    ///
    /// Returns transport or execution errors only, never `NotFound`.
    fn delete_order(&self, uuid: Uuid) -> impl Future<Output = std::result::Result<(), IndexError>> + Send;

    /// Exact-match lookup by document id.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::NotFound`] on zero hits.
    fn find_by_uuid(&self, uuid: Uuid) -> impl Future<Output = std::result::Result<Order, IndexError>> + Send;

    /// Match-all query with paging; an empty page is a valid result.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Unavailable`] or [`IndexError::Execution`].
    fn find_all(
        &self,
        page: PageRequest,
    ) -> impl Future<Output = std::result::Result<Paginated<Order>, IndexError>> + Send;

    /// Customer-scoped query with paging. Zero hits are treated as absence
    /// ([`IndexError::NotFound`]), unlike [`OrderIndex::find_all`].
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::NotFound`] on zero hits, otherwise transport or
    /// execution errors.
    fn find_by_customer(
        &self,
        customer_id: &str,
        page: PageRequest,
    ) -> impl Future<Output = std::result::Result<Paginated<Order>, IndexError>> + Send;
}

/// Durable recording of failed index propagations.
pub trait ReconciliationStore: Send + Sync {
    /// Records a failed index operation as `Pending`.
    ///
    /// `operation` is free text, parsed case-insensitively; unrecognized
    /// kinds default to `INDEX` with a warning. This call must never fail
    /// outward: persistence problems are logged and swallowed, because
    /// losing a reconciliation record must not cascade into losing the
    /// triggering request's response.
    fn record_failed_operation(
        &self,
        operation: &str,
        order_uuid: Uuid,
        error_message: &str,
    ) -> impl Future<Output = ()> + Send;

    /// Replays pending records against the index store.
    ///
    /// Currently a stub: it reports how many records are pending without
    /// replaying them. A scheduled job is expected to drive the
    /// `Pending → Processed | Failed` transitions.
    ///
    /// # Errors
    ///
    /// Returns [`crate::OrderError::Storage`] if the pending count cannot be
    /// read.
    fn process_failed_operations(&self) -> impl Future<Output = Result<u64>> + Send;
}

/// Fire-and-forget announcement of lifecycle events.
///
/// Implementations must degrade to "operates without event notifications"
/// rather than blocking or crashing when the bus is unavailable; callers log
/// the returned error and never surface it.
pub trait EventPublisher: Send + Sync {
    /// Queues an event for delivery to the bus.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] only for failures detectable at submission
    /// time (serialization); broker failures are handled internally by
    /// queueing and retry.
    fn publish(
        &self,
        event: OrderEvent,
    ) -> impl Future<Output = std::result::Result<(), PublishError>> + Send;
}
