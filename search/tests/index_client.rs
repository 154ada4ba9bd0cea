//! Integration tests for the index client against a stubbed index store.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use chrono::Utc;
use ordersync_core::{IndexError, Order, OrderIndex, OrderStatus, PageRequest};
use ordersync_search::{IndexClient, OrderDocument, OrderFilter};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sample_order() -> Order {
    Order {
        id: 1,
        uuid: Uuid::new_v4(),
        customer_id: "cust-x".into(),
        status: OrderStatus::Pending,
        total: 4500,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        items: vec![],
    }
}

fn client_for(server: &MockServer) -> IndexClient {
    IndexClient::builder()
        .base_url(server.uri())
        .index("orders")
        .build()
        .unwrap()
}

#[tokio::test]
async fn index_order_puts_document_by_uuid() {
    let server = MockServer::start().await;
    let order = sample_order();

    Mock::given(method("PUT"))
        .and(path(format!("/orders/_doc/{}", order.uuid)))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).index_order(&order).await.unwrap();
}

#[tokio::test]
async fn delete_is_idempotent_on_missing_document() {
    let server = MockServer::start().await;
    let uuid = Uuid::new_v4();

    Mock::given(method("DELETE"))
        .and(path(format!("/orders/_doc/{uuid}")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    client_for(&server).delete_order(uuid).await.unwrap();
}

#[tokio::test]
async fn find_by_uuid_with_zero_hits_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/orders/_search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "hits": {"total": {"value": 0, "relation": "eq"}, "hits": []}
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .find_by_uuid(Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err, IndexError::NotFound);
}

#[tokio::test]
async fn find_by_customer_with_zero_hits_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/orders/_search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "hits": {"total": 0, "hits": []}
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .find_by_customer("cust-x", PageRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err, IndexError::NotFound);
}

#[tokio::test]
async fn find_all_with_zero_hits_is_a_valid_empty_page() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/orders/_search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "hits": {"total": 0, "hits": []}
        })))
        .mount(&server)
        .await;

    let page = client_for(&server)
        .find_all(PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
    assert_eq!(page.pages, 0);
    assert!(page.data.is_empty());
}

#[tokio::test]
async fn search_decodes_wrapped_body_shape() {
    let server = MockServer::start().await;
    let order = sample_order();
    let doc = serde_json::to_value(OrderDocument::from_order(&order)).unwrap();

    Mock::given(method("POST"))
        .and(path("/orders/_search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "body": {
                "hits": {
                    "total": {"value": 1, "relation": "eq"},
                    "hits": [{"_source": doc}]
                }
            }
        })))
        .mount(&server)
        .await;

    let found = client_for(&server).find_by_uuid(order.uuid).await.unwrap();
    assert_eq!(found.uuid, order.uuid);
    assert_eq!(found.total, 4500);
}

#[tokio::test]
async fn execution_failure_is_not_transport_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/orders/_search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("shard failure"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .find_all(PageRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, IndexError::Execution(_)));
    assert!(!err.is_unavailable());
}

#[tokio::test]
async fn filtered_search_validates_before_any_call() {
    // No mock mounted: a request would fail, so passing proves fail-fast.
    let server = MockServer::start().await;
    let client = client_for(&server);

    let err = client
        .search_orders(&OrderFilter::new(), PageRequest::new(0, 10))
        .await
        .unwrap_err();
    assert!(err.is_client_error());

    let bad_range = OrderFilter::new().with_created_range(Some("not-a-date"), None::<String>);
    let err = client
        .search_orders(&bad_range, PageRequest::default())
        .await
        .unwrap_err();
    assert!(err.is_client_error());
}
