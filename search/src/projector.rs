//! The [`OrderIndex`] implementation: one document per order, keyed by
//! UUID.
//!
//! This layer never falls back to the transactional store — it reports
//! absence and transport failures precisely and leaves that decision to the
//! orchestrator.

use crate::client::IndexClient;
use crate::document::OrderDocument;
use crate::query;
use ordersync_core::{IndexError, Order, OrderIndex, PageRequest, Paginated};
use uuid::Uuid;

impl OrderIndex for IndexClient {
    async fn index_order(&self, order: &Order) -> Result<(), IndexError> {
        self.put_document(order.uuid, &OrderDocument::from_order(order))
            .await
    }

    async fn update_order(&self, order: &Order) -> Result<(), IndexError> {
        // The index does not distinguish create from update; both put
        // current state.
        self.put_document(order.uuid, &OrderDocument::from_order(order))
            .await
    }

    async fn delete_order(&self, uuid: Uuid) -> Result<(), IndexError> {
        self.delete_document(uuid).await
    }

    async fn find_by_uuid(&self, uuid: Uuid) -> Result<Order, IndexError> {
        let body = self.search(&query::by_uuid(uuid)).await?;
        body.hits
            .hits
            .into_iter()
            .next()
            .map(|hit| hit.source.into_order())
            .ok_or(IndexError::NotFound)
    }

    async fn find_all(&self, page: PageRequest) -> Result<Paginated<Order>, IndexError> {
        let body = self.search(&query::match_all(page)).await?;
        let total = body.hits.total.value();
        let orders: Vec<Order> = body
            .hits
            .hits
            .into_iter()
            .map(|hit| hit.source.into_order())
            .collect();
        Ok(Paginated::new(orders, total, page))
    }

    async fn find_by_customer(
        &self,
        customer_id: &str,
        page: PageRequest,
    ) -> Result<Paginated<Order>, IndexError> {
        let body = self.search(&query::by_customer(customer_id, page)).await?;
        let total = body.hits.total.value();

        // Customer search treats zero hits as absence, unlike find_all.
        if total == 0 {
            return Err(IndexError::NotFound);
        }

        let orders: Vec<Order> = body
            .hits
            .hits
            .into_iter()
            .map(|hit| hit.source.into_order())
            .collect();
        Ok(Paginated::new(orders, total, page))
    }
}
