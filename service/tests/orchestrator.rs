//! Orchestrator tests over the in-memory fakes.
//!
//! The fakes are `Clone` and share state with the service, so each test
//! holds its own handles for staging outages and asserting side effects.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use ordersync_core::{
    IndexError, NewOrderItem, OperationKind, OrderError, OrderIndex, OrderPatch, OrderStatus,
    PageRequest, PublishError,
};
use ordersync_service::OrderService;
use ordersync_testing::{
    InMemoryOrderIndex, InMemoryOrderStore, RecordingPublisher, RecordingReconciliationStore,
};
use uuid::Uuid;

type Service =
    OrderService<InMemoryOrderStore, InMemoryOrderIndex, RecordingReconciliationStore, RecordingPublisher>;

fn harness() -> (
    Service,
    InMemoryOrderStore,
    InMemoryOrderIndex,
    RecordingReconciliationStore,
    RecordingPublisher,
) {
    let store = InMemoryOrderStore::new();
    let index = InMemoryOrderIndex::new();
    let recorder = RecordingReconciliationStore::new();
    let publisher = RecordingPublisher::new();
    let service = OrderService::new(
        store.clone(),
        index.clone(),
        recorder.clone(),
        publisher.clone(),
    );
    (service, store, index, recorder, publisher)
}

fn items() -> Vec<NewOrderItem> {
    vec![
        NewOrderItem::new("p1".into(), "Widget".into(), 1500, 2),
        NewOrderItem::new("p2".into(), "Gadget".into(), 1500, 1),
    ]
}

#[tokio::test]
async fn create_persists_indexes_and_announces() {
    let (service, store, index, recorder, publisher) = harness();

    let order = service.create("cust-1", items()).await.unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total, 4500);
    assert_eq!(order.computed_total(), 4500);
    assert_eq!(store.len(), 1);
    assert!(index.contains(order.uuid));
    assert!(recorder.is_empty());
    assert_eq!(publisher.events()[0].event_type(), "ORDER_CREATED");
}

#[tokio::test]
async fn create_rejects_invalid_items_before_any_write() {
    let (service, store, index, _, publisher) = harness();

    let err = service.create("cust-1", vec![]).await.unwrap_err();
    assert!(matches!(err, OrderError::Validation { .. }));

    let bad_price = vec![NewOrderItem::new("p1".into(), "Widget".into(), 0, 1)];
    let err = service.create("cust-1", bad_price).await.unwrap_err();
    assert!(err.is_client_error());

    assert!(store.is_empty());
    assert!(index.is_empty());
    assert!(publisher.is_empty());
}

#[tokio::test]
async fn index_outage_becomes_a_reconciliation_record() {
    let (service, store, index, recorder, publisher) = harness();
    index.fail_with(IndexError::Unavailable("connection refused".into()));

    let order = service.create("cust-1", items()).await.unwrap();

    // The write succeeded and was announced; only the propagation failed.
    assert_eq!(store.len(), 1);
    assert!(!index.contains(order.uuid));
    assert_eq!(publisher.len(), 1);

    let records = recorder.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].operation, OperationKind::Index);
    assert_eq!(records[0].order_uuid, order.uuid);
    assert!(records[0].error_message.contains("connection refused"));
}

#[tokio::test]
async fn update_propagation_failure_records_update_kind() {
    let (service, _, index, recorder, _) = harness();
    let order = service.create("cust-1", items()).await.unwrap();

    index.fail_with(IndexError::Execution("shard failure".into()));
    let patch = OrderPatch {
        status: Some(OrderStatus::Processing),
        ..OrderPatch::default()
    };
    let updated = service.update(order.uuid, patch).await.unwrap();

    assert_eq!(updated.status, OrderStatus::Processing);
    let records = recorder.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].operation, OperationKind::Update);
    assert_eq!(service.pending_reconciliations().await.unwrap(), 1);
}

#[tokio::test]
async fn cancel_updates_the_index_document_and_announces() {
    let (service, _, index, _, publisher) = harness();
    let order = service.create("cust-1", items()).await.unwrap();

    let canceled = service.cancel(order.uuid).await.unwrap();

    assert_eq!(canceled.status, OrderStatus::Canceled);
    let doc = index.find_by_uuid(order.uuid).await.unwrap();
    assert_eq!(doc.status, OrderStatus::Canceled);
    let events = publisher.events();
    assert_eq!(events.last().unwrap().event_type(), "ORDER_CANCELED");
}

#[tokio::test]
async fn terminal_orders_propagate_not_modifiable() {
    let (service, _, _, _, _) = harness();
    let order = service.create("cust-1", items()).await.unwrap();

    let patch = OrderPatch {
        status: Some(OrderStatus::Delivered),
        ..OrderPatch::default()
    };
    service.update(order.uuid, patch).await.unwrap();

    let err = service.cancel(order.uuid).await.unwrap_err();
    assert_eq!(
        err,
        OrderError::NotModifiable {
            status: OrderStatus::Delivered
        }
    );
}

#[tokio::test]
async fn update_replaces_items_wholesale() {
    let (service, _, _, _, _) = harness();
    let order = service.create("cust-1", items()).await.unwrap();

    let patch = OrderPatch {
        items: Some(vec![
            NewOrderItem::new("p3".into(), "Bolt".into(), 10, 2),
            NewOrderItem::new("p4".into(), "Nut".into(), 20, 1),
        ]),
        ..OrderPatch::default()
    };
    let updated = service.update(order.uuid, patch).await.unwrap();

    assert_eq!(updated.total, 40);
    assert_eq!(updated.items.len(), 2);
    assert!(updated.items.iter().all(|i| i.product_id != "p1"));
}

#[tokio::test]
async fn reads_fall_back_to_the_store_on_index_outage() {
    let (service, _, index, _, _) = harness();
    let order = service.create("cust-1", items()).await.unwrap();
    index.fail_with(IndexError::Unavailable("connection refused".into()));

    let found = service.find_by_uuid(order.uuid).await.unwrap();
    assert_eq!(found.uuid, order.uuid);

    let all = service.find_all(PageRequest::default()).await.unwrap();
    assert_eq!(all.total, 1);

    let mine = service
        .find_by_customer("cust-1", PageRequest::default())
        .await
        .unwrap();
    assert_eq!(mine.total, 1);
}

#[tokio::test]
async fn zero_customer_hits_in_the_index_fall_back_to_the_store() {
    let (service, store, index, _, _) = harness();

    // Index is healthy but the customer's documents never propagated.
    index.fail_with(IndexError::Unavailable("down during create".into()));
    let order = service.create("cust-1", items()).await.unwrap();
    index.heal();
    assert!(store.len() == 1 && index.is_empty());

    let mine = service
        .find_by_customer("cust-1", PageRequest::default())
        .await
        .unwrap();
    assert_eq!(mine.total, 1);
    assert_eq!(mine.data[0].uuid, order.uuid);
}

#[tokio::test]
async fn an_empty_index_page_is_a_valid_find_all_result() {
    let (service, _, index, _, _) = harness();

    index.fail_with(IndexError::Unavailable("down during create".into()));
    service.create("cust-1", items()).await.unwrap();
    index.heal();

    // find_all trusts a healthy index even when it lags the store.
    let all = service.find_all(PageRequest::default()).await.unwrap();
    assert_eq!(all.total, 0);
    assert!(all.data.is_empty());
}

#[tokio::test]
async fn find_by_id_prefers_the_index_result() {
    let (service, _, index, _, _) = harness();
    let order = service.create("cust-1", items()).await.unwrap();

    let mut fresher = order.clone();
    fresher.status = OrderStatus::Shipped;
    index.insert(fresher);

    let found = service.find_by_id(order.id).await.unwrap();
    assert_eq!(found.status, OrderStatus::Shipped);

    // Any index failure silently keeps the store result.
    index.fail_with(IndexError::Execution("shard failure".into()));
    let found = service.find_by_id(order.id).await.unwrap();
    assert_eq!(found.status, OrderStatus::Pending);
}

#[tokio::test]
async fn missing_orders_are_not_found_everywhere() {
    let (service, _, _, _, _) = harness();
    let unknown = Uuid::new_v4();

    assert_eq!(
        service.find_by_uuid(unknown).await.unwrap_err(),
        OrderError::NotFound
    );
    assert_eq!(
        service.find_by_id(99).await.unwrap_err(),
        OrderError::NotFound
    );
    assert_eq!(
        service.cancel(unknown).await.unwrap_err(),
        OrderError::NotFound
    );
}

#[tokio::test]
async fn publisher_outage_never_surfaces() {
    let (service, store, _, _, publisher) = harness();
    publisher.fail_with(PublishError::Failed {
        topic: "orders.events".into(),
        reason: "all brokers down".into(),
    });

    let order = service.create("cust-1", items()).await.unwrap();
    service.cancel(order.uuid).await.unwrap();

    assert_eq!(store.len(), 1);
    assert!(publisher.is_empty());
}

#[tokio::test]
async fn pagination_is_validated_before_the_index_is_consulted() {
    let (service, _, index, _, _) = harness();
    index.fail_with(IndexError::Unavailable("must never be reached".into()));

    let err = service
        .find_all(PageRequest::new(0, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::Validation { .. }));

    let err = service
        .find_by_customer("cust-1", PageRequest::new(1, 500))
        .await
        .unwrap_err();
    assert!(err.is_client_error());
}
