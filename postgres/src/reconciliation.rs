//! Durable recording of failed index propagations.
//!
//! Reconciliation is a best-effort safety net, not a critical path: the
//! triggering write already succeeded at the transactional store, so a
//! failure to persist a record here is logged and swallowed rather than
//! cascading into the original request.

use ordersync_core::{
    OperationKind, OrderError, ReconciliationRecord, ReconciliationStatus, ReconciliationStore,
    Result,
};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgRow};
use uuid::Uuid;

/// `PostgreSQL`-backed reconciliation recorder.
///
/// # Example
///
/// ```no_run
/// use ordersync_postgres::PgReconciliationStore;
/// use ordersync_core::ReconciliationStore;
/// # async fn example(pool: sqlx::PgPool) {
/// let recorder = PgReconciliationStore::new(pool);
/// let uuid = uuid::Uuid::new_v4();
/// // Never fails outward, whatever happens underneath.
/// recorder.record_failed_operation("update", uuid, "timeout").await;
/// # }
/// ```
#[derive(Clone)]
pub struct PgReconciliationStore {
    pool: PgPool,
}

impl PgReconciliationStore {
    /// Creates a recorder over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists pending records, oldest first (FIFO replay order).
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Storage`] if the query fails.
    pub async fn list_pending(&self, limit: usize) -> Result<Vec<ReconciliationRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, order_uuid, operation_type, status, error_message,
                   created_at, updated_at
            FROM reconciliation_records
            WHERE status = 'PENDING'
            ORDER BY created_at ASC
            LIMIT $1
            ",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| OrderError::Storage(format!("Failed to list pending records: {e}")))?;

        rows.iter().map(row_to_record).collect()
    }

    /// Marks a record as successfully replayed.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Storage`] if the update fails.
    pub async fn mark_processed(&self, id: i64) -> Result<()> {
        self.set_status(id, ReconciliationStatus::Processed, None)
            .await
    }

    /// Marks a record as permanently failed after exhausted retries.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Storage`] if the update fails.
    pub async fn mark_failed(&self, id: i64, reason: &str) -> Result<()> {
        self.set_status(id, ReconciliationStatus::Failed, Some(reason))
            .await
    }

    async fn set_status(
        &self,
        id: i64,
        status: ReconciliationStatus,
        reason: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r"
            UPDATE reconciliation_records
            SET status = $1,
                error_message = COALESCE($2, error_message),
                updated_at = now()
            WHERE id = $3
            ",
        )
        .bind(status.as_str())
        .bind(reason)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| OrderError::Storage(format!("Failed to update record: {e}")))?;

        tracing::info!(record_id = id, status = status.as_str(), "Reconciliation record updated");
        Ok(())
    }
}

/// Maps a free-text operation kind, defaulting unrecognized strings to
/// `INDEX`. Returns whether the input was recognized so the caller can warn.
fn resolve_kind(operation: &str) -> (OperationKind, bool) {
    OperationKind::parse(operation)
        .map_or((OperationKind::Index, false), |kind| (kind, true))
}

impl ReconciliationStore for PgReconciliationStore {
    async fn record_failed_operation(&self, operation: &str, order_uuid: Uuid, error_message: &str) {
        let (kind, recognized) = resolve_kind(operation);
        if !recognized {
            tracing::warn!(
                operation = operation,
                order_uuid = %order_uuid,
                "Unrecognized operation kind, defaulting to INDEX"
            );
        }

        let inserted = sqlx::query(
            r"
            INSERT INTO reconciliation_records (order_uuid, operation_type, status, error_message)
            VALUES ($1, $2, 'PENDING', $3)
            ",
        )
        .bind(order_uuid)
        .bind(kind.as_str())
        .bind(error_message)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => {
                tracing::warn!(
                    order_uuid = %order_uuid,
                    operation = kind.as_str(),
                    error = error_message,
                    "Index propagation failure recorded for reconciliation"
                );
                metrics::counter!(
                    "ordersync.reconciliation.recorded",
                    "operation" => kind.as_str()
                )
                .increment(1);
            }
            Err(e) => {
                // Swallowed: losing a reconciliation record must not lose
                // the triggering request's response.
                tracing::error!(
                    order_uuid = %order_uuid,
                    operation = kind.as_str(),
                    error = %e,
                    "Failed to persist reconciliation record"
                );
            }
        }
    }

    async fn process_failed_operations(&self) -> Result<u64> {
        // Replay is driven by a scheduled job outside this crate; this stub
        // only reports the backlog.
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM reconciliation_records WHERE status = 'PENDING'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| OrderError::Storage(format!("Failed to count pending records: {e}")))?;

        let count = u64::try_from(count).unwrap_or(0);
        tracing::info!(pending = count, "Reconciliation backlog checked");
        Ok(count)
    }
}

fn row_to_record(row: &PgRow) -> Result<ReconciliationRecord> {
    let operation_str: String = row.get("operation_type");
    let operation = OperationKind::parse(&operation_str)
        .ok_or_else(|| OrderError::Storage(format!("Invalid operation type: {operation_str}")))?;

    let status_str: String = row.get("status");
    let status = ReconciliationStatus::parse(&status_str)
        .ok_or_else(|| OrderError::Storage(format!("Invalid record status: {status_str}")))?;

    Ok(ReconciliationRecord {
        id: row.get("id"),
        order_uuid: row.get("order_uuid"),
        operation,
        status,
        error_message: row.get("error_message"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn recognized_kinds_resolve_directly() {
        assert_eq!(resolve_kind("update"), (OperationKind::Update, true));
        assert_eq!(resolve_kind("DELETE"), (OperationKind::Delete, true));
        assert_eq!(resolve_kind("Index"), (OperationKind::Index, true));
    }

    #[test]
    fn unrecognized_kind_defaults_to_index() {
        assert_eq!(resolve_kind("reindex-all"), (OperationKind::Index, false));
        assert_eq!(resolve_kind(""), (OperationKind::Index, false));
    }
}
