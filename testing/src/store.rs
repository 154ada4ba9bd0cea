//! HashMap-backed [`OrderStore`] fake.

use chrono::Utc;
use ordersync_core::{
    NewOrderItem, Order, OrderError, OrderItem, OrderPatch, OrderStatus, OrderStore, PageRequest,
    Paginated, Result, compute_total,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

#[derive(Default)]
struct State {
    orders: HashMap<Uuid, Order>,
    next_order_id: i64,
    next_item_id: i64,
}

/// In-memory system of record with the same domain-error taxonomy as the
/// Postgres store: `NotFound` for absent orders, `NotModifiable` for
/// terminal ones.
///
/// Mutations are atomic (one lock acquisition each) and listings sort by
/// creation time descending, newest first, with internal id as tiebreaker
/// for orders created in the same instant.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryOrderStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().unwrap().orders.len()
    }

    /// Whether the store holds no orders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().unwrap().orders.is_empty()
    }

    /// Clears all orders (for test isolation).
    pub fn clear(&self) {
        self.state.write().unwrap().orders.clear();
    }

    /// Seeds an order verbatim, bypassing create semantics. Useful for
    /// staging divergence between store and index.
    pub fn insert(&self, order: Order) {
        self.state.write().unwrap().orders.insert(order.uuid, order);
    }

    fn page_of(&self, customer_id: Option<&str>, page: PageRequest) -> Result<Paginated<Order>> {
        page.validate()?;

        let state = self.state.read().unwrap();
        let mut matches: Vec<&Order> = state
            .orders
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

fn build_items(state: &mut State, items: Vec<NewOrderItem>) -> Vec<OrderItem> {
    items
        .into_iter()
        .map(|item| {
            state.next_item_id += 1;
            OrderItem {
                id: state.next_item_id,
                uuid: Uuid::new_v4(),
                subtotal: item.subtotal(),
                product_id: item.product_id,
                product_name: item.product_name,
                price: item.price,
                quantity: item.quantity,
            }
        })
        .collect()
}

impl OrderStore for InMemoryOrderStore {
    async fn create(&self, customer_id: &str, items: Vec<NewOrderItem>) -> Result<Order> {
        let mut state = self.state.write().unwrap();
        state.next_order_id += 1;

        let now = Utc::now();
        let total = compute_total(&items);
        let order = Order {
            id: state.next_order_id,
            uuid: Uuid::new_v4(),
            customer_id: customer_id.to_string(),
            status: OrderStatus::Pending,
            total,
            created_at: now,
            updated_at: now,
            items: build_items(&mut state, items),
        };

        state.orders.insert(order.uuid, order.clone());
        Ok(order)
    }

    async fn find_all(&self, page: PageRequest) -> Result<Paginated<Order>> {
        self.page_of(None, page)
    }

    async fn find_by_customer(
        &self,
        customer_id: &str,
        page: PageRequest,
    ) -> Result<Paginated<Order>> {
        self.page_of(Some(customer_id), page)
    }

    async fn find_by_id(&self, id: i64) -> Result<Order> {
        self.state
            .read()
            .unwrap()
            .orders
            .values()
            .find(|o| o.id == id)
            .cloned()
            .ok_or(OrderError::NotFound)
    }

    async fn find_by_uuid(&self, uuid: Uuid) -> Result<Order> {
        self.state
            .read()
            .unwrap()
            .orders
            .get(&uuid)
            .cloned()
            .ok_or(OrderError::NotFound)
    }

    async fn update(&self, uuid: Uuid, patch: OrderPatch) -> Result<Order> {
        let mut state = self.state.write().unwrap();

        let current = state.orders.get(&uuid).ok_or(OrderError::NotFound)?;
        if !current.status.is_modifiable() {
            return Err(OrderError::NotModifiable {
                status: current.status,
            });
        }
        let mut updated = current.clone();

        if let Some(items) = patch.items {
            updated.total = compute_total(&items);
            updated.items = build_items(&mut state, items);
        }
        if let Some(status) = patch.status {
            updated.status = status;
        }
        if let Some(customer_id) = patch.customer_id {
            updated.customer_id = customer_id;
        }
        updated.updated_at = Utc::now();

        state.orders.insert(uuid, updated.clone());
        Ok(updated)
    }

    async fn cancel(&self, uuid: Uuid) -> Result<Order> {
        let mut state = self.state.write().unwrap();

        let order = state.orders.get_mut(&uuid).ok_or(OrderError::NotFound)?;
        if !order.status.is_modifiable() {
            return Err(OrderError::NotModifiable {
                status: order.status,
            });
        }

        order.status = OrderStatus::Canceled;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    fn items() -> Vec<NewOrderItem> {
        vec![
            NewOrderItem::new("p1".into(), "Widget".into(), 1500, 2),
            NewOrderItem::new("p2".into(), "Gadget".into(), 1500, 1),
        ]
    }

    #[tokio::test]
    async fn create_assigns_ids_and_total() {
        let store = InMemoryOrderStore::new();
        let order = store.create("cust-1", items()).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total, 4500);
        assert_eq!(order.computed_total(), 4500);
        assert_eq!(order.items.len(), 2);
        assert_eq!(store.find_by_uuid(order.uuid).await.unwrap(), order);
        assert_eq!(store.find_by_id(order.id).await.unwrap(), order);
    }

    #[tokio::test]
    async fn update_replaces_items_and_recomputes_total() {
        let store = InMemoryOrderStore::new();
        let order = store.create("cust-1", items()).await.unwrap();

        let patch = OrderPatch {
            items: Some(vec![NewOrderItem::new("p3".into(), "Bolt".into(), 100, 5)]),
            ..OrderPatch::default()
        };
        let updated = store.update(order.uuid, patch).await.unwrap();

        assert_eq!(updated.total, 500);
        assert_eq!(updated.items.len(), 1);
        assert_eq!(updated.customer_id, "cust-1");
    }

    #[tokio::test]
    async fn terminal_orders_reject_mutation() {
        let store = InMemoryOrderStore::new();
        let order = store.create("cust-1", items()).await.unwrap();
        store.cancel(order.uuid).await.unwrap();

        let err = store.cancel(order.uuid).await.unwrap_err();
        assert_eq!(
            err,
            OrderError::NotModifiable {
                status: OrderStatus::Canceled
            }
        );
        let err = store
            .update(order.uuid, OrderPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::NotModifiable { .. }));
    }

    #[tokio::test]
    async fn listings_filter_by_customer() {
        let store = InMemoryOrderStore::new();
        store.create("cust-1", items()).await.unwrap();
        store.create("cust-2", items()).await.unwrap();
        store.create("cust-1", items()).await.unwrap();

        let all = store.find_all(PageRequest::default()).await.unwrap();
        assert_eq!(all.total, 3);

        let mine = store
            .find_by_customer("cust-1", PageRequest::default())
            .await
            .unwrap();
        assert_eq!(mine.total, 2);
        assert!(mine.data.iter().all(|o| o.customer_id == "cust-1"));
    }

    #[tokio::test]
    async fn listings_are_newest_first() {
        let store = InMemoryOrderStore::new();
        let first = store.create("cust-1", items()).await.unwrap();
        let second = store.create("cust-1", items()).await.unwrap();

        let page = store.find_all(PageRequest::default()).await.unwrap();
        assert_eq!(page.data[0].uuid, second.uuid);
        assert_eq!(page.data[1].uuid, first.uuid);
    }

    #[tokio::test]
    async fn missing_order_is_not_found() {
        let store = InMemoryOrderStore::new();
        assert_eq!(
            store.find_by_uuid(Uuid::new_v4()).await.unwrap_err(),
            OrderError::NotFound
        );
        assert_eq!(
            store.cancel(Uuid::new_v4()).await.unwrap_err(),
            OrderError::NotFound
        );
    }
}
