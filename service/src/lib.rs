//! Order orchestrator for the ordersync dual-store backend.
//!
//! [`OrderService`] sequences the four infrastructure components and owns no
//! state of its own:
//!
//! - **writes** go to the transactional store first (authoritative), then
//!   propagate to the index best-effort, then announce an event best-effort.
//!   A failed propagation becomes a reconciliation record; a failed publish
//!   is logged. Neither ever fails the caller's request.
//! - **reads** prefer the index and fall back to the transactional store on
//!   any index failure. The index is always a read optimization, never a
//!   dependency for correctness.
//!
//! The service is generic over the `ordersync-core` contracts, so tests run
//! against the in-memory fakes from `ordersync-testing` while production
//! wires in `PgOrderStore`, `IndexClient`, `PgReconciliationStore`, and
//! `KafkaEventPublisher`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use ordersync_core::validation::ensure_valid_items;
use ordersync_core::{
    EventPublisher, IndexError, NewOrderItem, Order, OrderEvent, OrderIndex, OrderPatch,
    OrderStore, PageRequest, Paginated, ReconciliationStore, Result,
};
use ordersync_search::{IndexClient, OrderFilter};
use uuid::Uuid;

/// Sequences store, index, recorder, and publisher for every order
/// operation.
///
/// Cheap to construct; all state lives in the components.
pub struct OrderService<S, I, R, P> {
    store: S,
    index: I,
    recorder: R,
    publisher: P,
}

impl<S, I, R, P> OrderService<S, I, R, P>
where
    S: OrderStore,
    I: OrderIndex,
    R: ReconciliationStore,
    P: EventPublisher,
{
    /// Creates a service over the four components.
    pub const fn new(store: S, index: I, recorder: R, publisher: P) -> Self {
        Self {
            store,
            index,
            recorder,
            publisher,
        }
    }

    /// Creates an order: validate, persist, propagate, announce.
    ///
    /// The transactional write is the only step that can fail the caller;
    /// index propagation failures become reconciliation records and publish
    /// failures are logged.
    ///
    /// # Errors
    ///
    /// Returns [`ordersync_core::OrderError::Validation`] for invalid items
    /// (before any store call) and [`ordersync_core::OrderError::CreateFailed`]
    /// if the transaction fails.
    pub async fn create(&self, customer_id: &str, items: Vec<NewOrderItem>) -> Result<Order> {
        ensure_valid_items(&items)?;

        let order = self.store.create(customer_id, items).await?;
        tracing::info!(
            order_uuid = %order.uuid,
            customer_id = %order.customer_id,
            total = order.total,
            "Order created"
        );

        if let Err(error) = self.index.index_order(&order).await {
            self.record_propagation_failure("INDEX", order.uuid, &error)
                .await;
        }
        self.announce(OrderEvent::created(&order)).await;
        Ok(order)
    }

    /// Applies a patch to a modifiable order.
    ///
    /// # Errors
    ///
    /// Domain errors propagate unchanged from the store:
    /// [`ordersync_core::OrderError::NotFound`],
    /// [`ordersync_core::OrderError::NotModifiable`], and
    /// [`ordersync_core::OrderError::Validation`] for an invalid replacement
    /// item set; [`ordersync_core::OrderError::UpdateFailed`] if the
    /// transaction fails.
    pub async fn update(&self, uuid: Uuid, patch: OrderPatch) -> Result<Order> {
        if let Some(items) = &patch.items {
            ensure_valid_items(items)?;
        }

        let order = self.store.update(uuid, patch).await?;
        tracing::info!(order_uuid = %order.uuid, status = %order.status, "Order updated");

        if let Err(error) = self.index.update_order(&order).await {
            self.record_propagation_failure("UPDATE", order.uuid, &error)
                .await;
        }
        self.announce(OrderEvent::updated(&order)).await;
        Ok(order)
    }

    /// Cancels a modifiable order.
    ///
    /// The index document is updated, not deleted: a canceled order remains
    /// queryable.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`OrderService::update`].
    pub async fn cancel(&self, uuid: Uuid) -> Result<Order> {
        let order = self.store.cancel(uuid).await?;
        tracing::info!(order_uuid = %order.uuid, "Order canceled");

        if let Err(error) = self.index.update_order(&order).await {
            self.record_propagation_failure("UPDATE", order.uuid, &error)
                .await;
        }
        self.announce(OrderEvent::canceled(&order)).await;
        Ok(order)
    }

    /// Looks up an order by internal id.
    ///
    /// The store resolves the UUID; a successful index lookup then
    /// supersedes the store result (the index is assumed fresher for
    /// read-shaping). Any index failure silently keeps the store result.
    ///
    /// # Errors
    ///
    /// Returns [`ordersync_core::OrderError::NotFound`] when the store has
    /// no such order.
    pub async fn find_by_id(&self, id: i64) -> Result<Order> {
        let stored = self.store.find_by_id(id).await?;

        match self.index.find_by_uuid(stored.uuid).await {
            Ok(indexed) => Ok(indexed),
            Err(error) => {
                tracing::debug!(
                    order_uuid = %stored.uuid,
                    error = %error,
                    "Index lookup failed, keeping transactional-store result"
                );
                Ok(stored)
            }
        }
    }

    /// Looks up an order by public UUID, index first.
    ///
    /// # Errors
    ///
    /// Returns [`ordersync_core::OrderError::NotFound`] when neither store
    /// has the order.
    pub async fn find_by_uuid(&self, uuid: Uuid) -> Result<Order> {
        match self.index.find_by_uuid(uuid).await {
            Ok(order) => Ok(order),
            Err(error) => {
                self.note_fallback("find_by_uuid", &error);
                self.store.find_by_uuid(uuid).await
            }
        }
    }

    /// Lists orders, index first, newest first.
    ///
    /// An empty index page is a valid result and does not trigger fallback.
    ///
    /// # Errors
    ///
    /// Returns [`ordersync_core::OrderError::Validation`] for bad pagination
    /// and [`ordersync_core::OrderError::Storage`] if the fallback query
    /// fails too.
    pub async fn find_all(&self, page: PageRequest) -> Result<Paginated<Order>> {
        page.validate()?;

        match self.index.find_all(page).await {
            Ok(orders) => Ok(orders),
            Err(error) => {
                self.note_fallback("find_all", &error);
                self.store.find_all(page).await
            }
        }
    }

    /// Lists one customer's orders, index first, newest first.
    ///
    /// Zero index hits count as absence and fall back to the store, so a
    /// customer whose documents never propagated still sees their orders.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`OrderService::find_all`].
    pub async fn find_by_customer(
        &self,
        customer_id: &str,
        page: PageRequest,
    ) -> Result<Paginated<Order>> {
        page.validate()?;

        match self.index.find_by_customer(customer_id, page).await {
            Ok(orders) => Ok(orders),
            Err(error) => {
                self.note_fallback("find_by_customer", &error);
                self.store.find_by_customer(customer_id, page).await
            }
        }
    }

    /// Pending reconciliation records awaiting the replay job.
    ///
    /// # Errors
    ///
    /// Returns [`ordersync_core::OrderError::Storage`] if the count cannot
    /// be read.
    pub async fn pending_reconciliations(&self) -> Result<u64> {
        self.recorder.process_failed_operations().await
    }

    async fn record_propagation_failure(
        &self,
        operation: &'static str,
        order_uuid: Uuid,
        error: &IndexError,
    ) {
        tracing::warn!(
            order_uuid = %order_uuid,
            operation,
            error = %error,
            "Index propagation failed, recording for reconciliation"
        );
        self.recorder
            .record_failed_operation(operation, order_uuid, &error.to_string())
            .await;
    }

    async fn announce(&self, event: OrderEvent) {
        let event_type = event.event_type();
        if let Err(error) = self.publisher.publish(event).await {
            tracing::warn!(
                event_type,
                error = %error,
                "Event publish failed, continuing without notification"
            );
        }
    }

    fn note_fallback(&self, operation: &'static str, error: &IndexError) {
        tracing::warn!(
            operation,
            error = %error,
            "Index read failed, falling back to transactional store"
        );
        metrics::counter!("ordersync.index.fallback", "operation" => operation).increment(1);
    }
}

impl<S, R, P> OrderService<S, IndexClient, R, P>
where
    S: OrderStore,
    R: ReconciliationStore,
    P: EventPublisher,
{
    /// Filtered search against the index store.
    ///
    /// Unlike the listing reads, search has no transactional-store fallback:
    /// the filter semantics (nested item matches, partial names) only exist
    /// in the index.
    ///
    /// # Errors
    ///
    /// Returns [`ordersync_core::OrderError::Validation`] before any index
    /// call for bad pagination or date bounds,
    /// [`ordersync_core::OrderError::SearchUnavailable`] for
    /// connection-class failures, and
    /// [`ordersync_core::OrderError::SearchFailed`] for everything else.
    pub async fn search(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> Result<Paginated<Order>> {
        self.index.search_orders(filter, page).await
    }
}
