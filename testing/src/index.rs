//! HashMap-backed [`OrderIndex`] fake with failure injection.

use ordersync_core::{IndexError, Order, OrderIndex, PageRequest, Paginated};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

#[derive(Default)]
struct State {
    documents: HashMap<Uuid, Order>,
    failure: Option<IndexError>,
}

/// In-memory index store mirroring the search layer's contract: idempotent
/// delete, `NotFound` on zero customer hits, valid empty pages from
/// `find_all`.
///
/// Failure injection: while a failure is armed with
/// [`InMemoryOrderIndex::fail_with`], every operation returns a clone of it.
/// [`InMemoryOrderIndex::heal`] disarms it. This is how orchestrator tests
/// stage index outages without a network.
#[derive(Clone, Default)]
pub struct InMemoryOrderIndex {
    state: Arc<RwLock<State>>,
}

impl InMemoryOrderIndex {
    /// Creates an empty, healthy index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a failure: every subsequent operation fails with a clone of
    /// `error` until [`InMemoryOrderIndex::heal`] is called.
    pub fn fail_with(&self, error: IndexError) {
        self.state.write().unwrap().failure = Some(error);
    }

    /// Disarms any armed failure.
    pub fn heal(&self) {
        self.state.write().unwrap().failure = None;
    }

    /// Seeds a document verbatim, bypassing the armed failure. Useful for
    /// staging divergence between store and index.
    pub fn insert(&self, order: Order) {
        self.state
            .write()
            .unwrap()
            .documents
            .insert(order.uuid, order);
    }

    /// Whether a document exists for the given order.
    #[must_use]
    pub fn contains(&self, uuid: Uuid) -> bool {
        self.state.read().unwrap().documents.contains_key(&uuid)
    }

    /// Number of indexed documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().unwrap().documents.len()
    }

    /// Whether the index holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().unwrap().documents.is_empty()
    }

    fn check(&self) -> Result<(), IndexError> {
        match &self.state.read().unwrap().failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn page_of(
        &self,
        customer_id: Option<&str>,
        page: PageRequest,
    ) -> Result<Paginated<Order>, IndexError> {
        self.check()?;

        let state = self.state.read().unwrap();
        let mut matches: Vec<&Order> = state
            .documents
            .values()
            .filter(|o| customer_id.is_none_or(|c| o.customer_id == c))
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matches.len() as u64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let data: Vec<Order> = matches
            .into_iter()
            .skip(offset)
            .take(page.limit as usize)
            .cloned()
            .collect();

        Ok(Paginated::new(data, total, page))
    }
}

impl OrderIndex for InMemoryOrderIndex {
    async fn index_order(&self, order: &Order) -> Result<(), IndexError> {
        self.check()?;
        self.insert(order.clone());
        Ok(())
    }

    async fn update_order(&self, order: &Order) -> Result<(), IndexError> {
        self.index_order(order).await
    }

    async fn delete_order(&self, uuid: Uuid) -> Result<(), IndexError> {
        self.check()?;
        // Absent documents delete successfully.
        self.state.write().unwrap().documents.remove(&uuid);
        Ok(())
    }

    async fn find_by_uuid(&self, uuid: Uuid) -> Result<Order, IndexError> {
        self.check()?;
        self.state
            .read()
            .unwrap()
            .documents
            .get(&uuid)
            .cloned()
            .ok_or(IndexError::NotFound)
    }

    async fn find_all(&self, page: PageRequest) -> Result<Paginated<Order>, IndexError> {
        self.page_of(None, page)
    }

    async fn find_by_customer(
        &self,
        customer_id: &str,
        page: PageRequest,
    ) -> Result<Paginated<Order>, IndexError> {
        let page = self.page_of(Some(customer_id), page)?;
        if page.total == 0 {
            return Err(IndexError::NotFound);
        }
        Ok(page)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use chrono::Utc;
    use ordersync_core::OrderStatus;

    fn order(id: i64, customer_id: &str) -> Order {
        Order {
            id,
            uuid: Uuid::new_v4(),
            customer_id: customer_id.to_string(),
            status: OrderStatus::Pending,
            total: 4500,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            items: vec![],
        }
    }

    #[tokio::test]
    async fn armed_failure_hits_every_operation() {
        let index = InMemoryOrderIndex::new();
        index.fail_with(IndexError::Unavailable("connection refused".into()));

        let sample = order(1, "cust-1");
        assert!(index.index_order(&sample).await.unwrap_err().is_unavailable());
        assert!(index.delete_order(sample.uuid).await.is_err());
        assert!(index.find_all(PageRequest::default()).await.is_err());

        index.heal();
        index.index_order(&sample).await.unwrap();
        assert!(index.contains(sample.uuid));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let index = InMemoryOrderIndex::new();
        index.delete_order(Uuid::new_v4()).await.unwrap();
    }

    #[tokio::test]
    async fn zero_customer_hits_are_not_found() {
        let index = InMemoryOrderIndex::new();
        index.insert(order(1, "cust-1"));

        let err = index
            .find_by_customer("cust-2", PageRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err, IndexError::NotFound);

        // find_all makes the opposite choice: empty pages are valid.
        let empty = InMemoryOrderIndex::new();
        let page = empty.find_all(PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 0);
    }
}
