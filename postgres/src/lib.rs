//! `PostgreSQL` system of record for ordersync.
//!
//! This crate implements the transactional side of the dual-store core:
//!
//! - [`PgOrderStore`] — the authoritative order repository. Every mutation
//!   runs inside a single `BEGIN`/`COMMIT` transaction and rolls back
//!   entirely on any failure; there is no partial-commit state observable
//!   to readers.
//! - [`reconciliation::PgReconciliationStore`] — durable recording of index
//!   propagations that failed, for later replay.
//!
//! The index store is maintained elsewhere (the `search` crate); nothing in
//! this crate knows the index exists.
//!
//! # Example
//!
//! ```no_run
//! use ordersync_postgres::PgOrderStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PgOrderStore::connect("postgres://localhost/orders").await?;
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod reconciliation;

pub use reconciliation::PgReconciliationStore;

use ordersync_core::order::compute_total;
use ordersync_core::{
    NewOrderItem, Order, OrderError, OrderItem, OrderPatch, OrderStatus, OrderStore, PageRequest,
    Paginated, Result,
};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use std::collections::HashMap;
use uuid::Uuid;

/// `PostgreSQL`-backed order repository.
///
/// Orders are stored across two tables: `orders` (aggregate root) and
/// `order_items` (cascade-deleted children). Items are always eagerly
/// loaded; reads sort by creation time descending.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the given database URL with a default pool size.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Storage`] if the connection fails.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| OrderError::Storage(format!("Failed to connect: {e}")))?;
        Ok(Self::new(pool))
    }

    /// Runs the schema migrations in `./migrations`.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Storage`] if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| OrderError::Storage(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Fetches a page of orders with a shared WHERE fragment, then attaches
    /// their items in one extra query.
    async fn fetch_page(
        &self,
        customer_id: Option<&str>,
        page: PageRequest,
    ) -> Result<Paginated<Order>> {
        page.validate()?;

        let limit = i64::from(page.limit);
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);

        let (total, rows) = if let Some(customer_id) = customer_id {
            let (total,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM orders WHERE customer_id = $1")
                    .bind(customer_id)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| OrderError::Storage(format!("Failed to count orders: {e}")))?;
            let rows = sqlx::query(
                r"
                SELECT id, uuid, customer_id, status, total, created_at, updated_at
                FROM orders
                WHERE customer_id = $1
                ORDER BY created_at DESC
                LIMIT $2 OFFSET $3
                ",
            )
            .bind(customer_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| OrderError::Storage(format!("Failed to list orders: {e}")))?;
            (total, rows)
        } else {
            let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| OrderError::Storage(format!("Failed to count orders: {e}")))?;
            let rows = sqlx::query(
                r"
                SELECT id, uuid, customer_id, status, total, created_at, updated_at
                FROM orders
                ORDER BY created_at DESC
                LIMIT $1 OFFSET $2
                ",
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| OrderError::Storage(format!("Failed to list orders: {e}")))?;
            (total, rows)
        };

        let mut orders = rows
            .iter()
            .map(row_to_order)
            .collect::<Result<Vec<Order>>>()?;

        let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let mut items = self.load_items(&ids).await?;
        for order in &mut orders {
            order.items = items.remove(&order.id).unwrap_or_default();
        }

        let total = u64::try_from(total).unwrap_or(0);
        Ok(Paginated::new(orders, total, page))
    }

    /// Loads the items for a set of orders, grouped by owning order id.
    async fn load_items(&self, order_ids: &[i64]) -> Result<HashMap<i64, Vec<OrderItem>>> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            r"
            SELECT id, uuid, order_id, product_id, product_name, price, quantity, subtotal
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| OrderError::Storage(format!("Failed to load items: {e}")))?;

        let mut grouped: HashMap<i64, Vec<OrderItem>> = HashMap::new();
        for row in &rows {
            let order_id: i64 = row.get("order_id");
            grouped.entry(order_id).or_default().push(row_to_item(row));
        }
        Ok(grouped)
    }

    /// Loads a single order row (plus items) by an arbitrary WHERE column.
    async fn fetch_one_where(&self, row: Option<PgRow>) -> Result<Order> {
        let row = row.ok_or(OrderError::NotFound)?;
        let mut order = row_to_order(&row)?;
        let mut items = self.load_items(&[order.id]).await?;
        order.items = items.remove(&order.id).unwrap_or_default();
        Ok(order)
    }

    /// Checks the modifiability state machine before any mutation.
    async fn load_modifiable(&self, uuid: Uuid) -> Result<Order> {
        let order = OrderStore::find_by_uuid(self, uuid).await?;
        if order.status.is_modifiable() {
            Ok(order)
        } else {
            Err(OrderError::NotModifiable {
                status: order.status,
            })
        }
    }
}

impl OrderStore for PgOrderStore {
    async fn create(&self, customer_id: &str, items: Vec<NewOrderItem>) -> Result<Order> {
        let uuid = Uuid::new_v4();
        let total = compute_total(&items);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| OrderError::CreateFailed(format!("Failed to begin transaction: {e}")))?;

        let (order_id,): (i64,) = sqlx::query_as(
            r"
            INSERT INTO orders (uuid, customer_id, status, total)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(uuid)
        .bind(customer_id)
        .bind(OrderStatus::Pending.as_str())
        .bind(total)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| OrderError::CreateFailed(format!("Failed to insert order: {e}")))?;

        insert_items(&mut tx, order_id, &items)
            .await
            .map_err(|e| OrderError::CreateFailed(format!("Failed to insert items: {e}")))?;

        // Dropping an uncommitted transaction rolls it back, so any error
        // above leaves no trace of the order.
        tx.commit()
            .await
            .map_err(|e| OrderError::CreateFailed(format!("Failed to commit: {e}")))?;

        tracing::info!(
            order_uuid = %uuid,
            customer_id = customer_id,
            total = total,
            "Order created"
        );

        OrderStore::find_by_uuid(self, uuid).await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Paginated<Order>> {
        self.fetch_page(None, page).await
    }

    async fn find_by_customer(
        &self,
        customer_id: &str,
        page: PageRequest,
    ) -> Result<Paginated<Order>> {
        self.fetch_page(Some(customer_id), page).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Order> {
        let row = sqlx::query(
            r"
            SELECT id, uuid, customer_id, status, total, created_at, updated_at
            FROM orders
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| OrderError::Storage(format!("Failed to get order: {e}")))?;

        self.fetch_one_where(row).await
    }

    async fn find_by_uuid(&self, uuid: Uuid) -> Result<Order> {
        let row = sqlx::query(
            r"
            SELECT id, uuid, customer_id, status, total, created_at, updated_at
            FROM orders
            WHERE uuid = $1
            ",
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| OrderError::Storage(format!("Failed to get order: {e}")))?;

        self.fetch_one_where(row).await
    }

    async fn update(&self, uuid: Uuid, patch: OrderPatch) -> Result<Order> {
        let current = self.load_modifiable(uuid).await?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| OrderError::UpdateFailed(format!("Failed to begin transaction: {e}")))?;

        // Items are replaced wholesale: delete-all-then-insert-new, with the
        // total recomputed from the replacement set.
        if let Some(items) = &patch.items {
            sqlx::query("DELETE FROM order_items WHERE order_id = $1")
                .bind(current.id)
                .execute(&mut *tx)
                .await
                .map_err(|e| OrderError::UpdateFailed(format!("Failed to delete items: {e}")))?;

            insert_items(&mut tx, current.id, items)
                .await
                .map_err(|e| OrderError::UpdateFailed(format!("Failed to insert items: {e}")))?;

            sqlx::query("UPDATE orders SET total = $1, updated_at = now() WHERE id = $2")
                .bind(compute_total(items))
                .bind(current.id)
                .execute(&mut *tx)
                .await
                .map_err(|e| OrderError::UpdateFailed(format!("Failed to update total: {e}")))?;
        }

        if let Some(status) = patch.status {
            sqlx::query("UPDATE orders SET status = $1, updated_at = now() WHERE id = $2")
                .bind(status.as_str())
                .bind(current.id)
                .execute(&mut *tx)
                .await
                .map_err(|e| OrderError::UpdateFailed(format!("Failed to update status: {e}")))?;
        }

        if let Some(customer_id) = &patch.customer_id {
            sqlx::query("UPDATE orders SET customer_id = $1, updated_at = now() WHERE id = $2")
                .bind(customer_id)
                .bind(current.id)
                .execute(&mut *tx)
                .await
                .map_err(|e| OrderError::UpdateFailed(format!("Failed to update customer: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| OrderError::UpdateFailed(format!("Failed to commit: {e}")))?;

        tracing::info!(order_uuid = %uuid, "Order updated");

        OrderStore::find_by_uuid(self, uuid).await
    }

    async fn cancel(&self, uuid: Uuid) -> Result<Order> {
        self.load_modifiable(uuid).await?;

        // Single statement, but still transactional for consistency with the
        // rest of the write path.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| OrderError::UpdateFailed(format!("Failed to begin transaction: {e}")))?;

        sqlx::query("UPDATE orders SET status = $1, updated_at = now() WHERE uuid = $2")
            .bind(OrderStatus::Canceled.as_str())
            .bind(uuid)
            .execute(&mut *tx)
            .await
            .map_err(|e| OrderError::UpdateFailed(format!("Failed to cancel order: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| OrderError::UpdateFailed(format!("Failed to commit: {e}")))?;

        tracing::info!(order_uuid = %uuid, "Order cancelled");

        OrderStore::find_by_uuid(self, uuid).await
    }
}

/// Inserts a replacement or initial item set for an order.
async fn insert_items(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    order_id: i64,
    items: &[NewOrderItem],
) -> std::result::Result<(), sqlx::Error> {
    for item in items {
        sqlx::query(
            r"
            INSERT INTO order_items
                (uuid, order_id, product_id, product_name, price, quantity, subtotal)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(Uuid::new_v4())
        .bind(order_id)
        .bind(&item.product_id)
        .bind(&item.product_name)
        .bind(item.price)
        .bind(item.quantity)
        .bind(item.subtotal())
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Maps an `orders` row, items left empty for the caller to attach.
fn row_to_order(row: &PgRow) -> Result<Order> {
    let status_str: String = row.get("status");
    let status = OrderStatus::parse(&status_str)
        .ok_or_else(|| OrderError::Storage(format!("Invalid order status: {status_str}")))?;

    Ok(Order {
        id: row.get("id"),
        uuid: row.get("uuid"),
        customer_id: row.get("customer_id"),
        status,
        total: row.get("total"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        items: Vec::new(),
    })
}

fn row_to_item(row: &PgRow) -> OrderItem {
    OrderItem {
        id: row.get("id"),
        uuid: row.get("uuid"),
        product_id: row.get("product_id"),
        product_name: row.get("product_name"),
        price: row.get("price"),
        quantity: row.get("quantity"),
        subtotal: row.get("subtotal"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use ordersync_core::order::compute_total;
    use ordersync_core::{NewOrderItem, OrderStatus};

    // Row-level behavior is covered against a live database; these tests
    // pin the pure pieces the queries rely on.

    #[test]
    fn created_orders_start_pending() {
        assert_eq!(OrderStatus::Pending.as_str(), "PENDING");
    }

    #[test]
    fn replacement_total_matches_inserted_subtotals() {
        let items = vec![
            NewOrderItem::new("p1".into(), "A".into(), 10, 2),
            NewOrderItem::new("p2".into(), "B".into(), 20, 1),
        ];
        let subtotals: i64 = items.iter().map(NewOrderItem::subtotal).sum();
        assert_eq!(compute_total(&items), subtotals);
        assert_eq!(compute_total(&items), 40);
    }
}
