//! Recording fakes for the reconciliation store and the event publisher.

use ordersync_core::{
    EventPublisher, OperationKind, OrderEvent, PublishError, ReconciliationStore, Result,
};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// One captured failed-operation record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedFailure {
    /// Parsed operation kind (unrecognized input defaults to `Index`).
    pub operation: OperationKind,
    /// The affected order.
    pub order_uuid: Uuid,
    /// The error message as recorded.
    pub error_message: String,
}

/// [`ReconciliationStore`] fake that captures records in memory.
///
/// Mirrors the durable store's contract: recording never fails, and
/// `process_failed_operations` reports the pending count without replaying.
#[derive(Clone, Default)]
pub struct RecordingReconciliationStore {
    records: Arc<RwLock<Vec<RecordedFailure>>>,
}

impl RecordingReconciliationStore {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured records, in recording order.
    #[must_use]
    pub fn records(&self) -> Vec<RecordedFailure> {
        self.records.read().unwrap().clone()
    }

    /// Number of captured records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().unwrap().is_empty()
    }
}

impl ReconciliationStore for RecordingReconciliationStore {
    async fn record_failed_operation(&self, operation: &str, order_uuid: Uuid, error_message: &str) {
        let operation = OperationKind::parse(operation).unwrap_or(OperationKind::Index);
        self.records.write().unwrap().push(RecordedFailure {
            operation,
            order_uuid,
            error_message: error_message.to_string(),
        });
    }

    async fn process_failed_operations(&self) -> Result<u64> {
        Ok(self.records.read().unwrap().len() as u64)
    }
}

/// [`EventPublisher`] fake that captures events in memory.
///
/// Arm a failure with [`RecordingPublisher::fail_with`] to exercise the
/// orchestrator's "writes survive a dead bus" behavior.
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    events: Arc<RwLock<Vec<OrderEvent>>>,
    failure: Arc<RwLock<Option<PublishError>>>,
}

impl RecordingPublisher {
    /// Creates an empty, healthy publisher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a failure: every subsequent publish fails with a clone of
    /// `error` until [`RecordingPublisher::heal`] is called.
    pub fn fail_with(&self, error: PublishError) {
        *self.failure.write().unwrap() = Some(error);
    }

    /// Disarms any armed failure.
    pub fn heal(&self) {
        *self.failure.write().unwrap() = None;
    }

    /// All captured events, in publish order.
    #[must_use]
    pub fn events(&self) -> Vec<OrderEvent> {
        self.events.read().unwrap().clone()
    }

    /// Number of captured events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().unwrap().len()
    }

    /// Whether nothing was published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().unwrap().is_empty()
    }
}

impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: OrderEvent) -> std::result::Result<(), PublishError> {
        if let Some(error) = self.failure.read().unwrap().clone() {
            return Err(error);
        }
        self.events.write().unwrap().push(event);
        Ok(())
    }
}
