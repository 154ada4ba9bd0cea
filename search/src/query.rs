//! Typed filter criteria compiled into index-store queries.
//!
//! Every query shares one shape: `{query, sort: [{createdAt: desc}], from,
//! size}`. Pagination and date-range validation happen before any HTTP call
//! is made (fail fast, no wasted round-trip).

use crate::client::IndexClient;
use chrono::NaiveDate;
use ordersync_core::{
    IndexError, Order, OrderError, OrderStatus, PageRequest, Paginated, Result,
};
use serde_json::{Value, json};
use uuid::Uuid;

/// Wraps a query clause in the shared request shape.
fn request(query: Value, page: PageRequest) -> Value {
    json!({
        "query": query,
        "sort": [{"createdAt": {"order": "desc"}}],
        "from": page.offset(),
        "size": page.limit,
    })
}

/// Exact-match query by document id.
#[must_use]
pub fn by_uuid(uuid: Uuid) -> Value {
    request(
        json!({"term": {"uuid": uuid.to_string()}}),
        PageRequest::new(1, 1),
    )
}

/// Match-all query with paging.
#[must_use]
pub fn match_all(page: PageRequest) -> Value {
    request(json!({"match_all": {}}), page)
}

/// Customer-scoped term query with paging.
#[must_use]
pub fn by_customer(customer_id: &str, page: PageRequest) -> Value {
    request(json!({"term": {"customerId": customer_id}}), page)
}

/// A created-at date range; at least one bound is required.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
    /// Inclusive lower bound, `YYYY-MM-DD`.
    pub from: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD`.
    pub to: Option<String>,
}

/// Typed filter criteria for order search.
///
/// Each present field compiles into one clause of a boolean query; all
/// clauses must match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderFilter {
    /// Exact order UUID.
    pub uuid: Option<Uuid>,
    /// Exact customer id.
    pub customer_id: Option<String>,
    /// Exact status.
    pub status: Option<OrderStatus>,
    /// Created-at date range.
    pub created: Option<DateRange>,
    /// Exact product id across items (nested match).
    pub product_id: Option<String>,
    /// Partial product name across items (nested match).
    pub product_name: Option<String>,
}

impl OrderFilter {
    /// Creates an empty filter (matches everything).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by exact order UUID.
    #[must_use]
    pub const fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = Some(uuid);
        self
    }

    /// Filter by exact customer id.
    #[must_use]
    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Filter by exact status.
    #[must_use]
    pub const fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Filter by creation date range.
    #[must_use]
    pub fn with_created_range(
        mut self,
        from: Option<impl Into<String>>,
        to: Option<impl Into<String>>,
    ) -> Self {
        self.created = Some(DateRange {
            from: from.map(Into::into),
            to: to.map(Into::into),
        });
        self
    }

    /// Filter by exact product id on any item.
    #[must_use]
    pub fn with_product_id(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    /// Filter by partial product name on any item.
    #[must_use]
    pub fn with_product_name(mut self, product_name: impl Into<String>) -> Self {
        self.product_name = Some(product_name.into());
        self
    }

    /// Validates the filter: a date range needs at least one bound and each
    /// bound must be a valid calendar date.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Validation`] with itemized reasons.
    pub fn validate(&self) -> Result<()> {
        let mut violations = Vec::new();

        if let Some(range) = &self.created {
            if range.from.is_none() && range.to.is_none() {
                violations.push("date range requires at least one bound".to_string());
            }
            for (name, bound) in [("from", &range.from), ("to", &range.to)] {
                if let Some(value) = bound {
                    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
                        violations.push(format!("{name} is not a valid date: {value}"));
                    }
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(OrderError::Validation { violations })
        }
    }

    /// Compiles the filter into the shared request shape.
    ///
    /// Call [`OrderFilter::validate`] first; compilation assumes valid
    /// bounds.
    #[must_use]
    pub fn compile(&self, page: PageRequest) -> Value {
        let mut must: Vec<Value> = Vec::new();

        if let Some(uuid) = self.uuid {
            must.push(json!({"term": {"uuid": uuid.to_string()}}));
        }
        if let Some(customer_id) = &self.customer_id {
            must.push(json!({"term": {"customerId": customer_id}}));
        }
        if let Some(status) = self.status {
            must.push(json!({"term": {"status": status.as_str()}}));
        }
        if let Some(range) = &self.created {
            let mut bounds = serde_json::Map::new();
            if let Some(from) = &range.from {
                bounds.insert("gte".to_string(), json!(from));
            }
            if let Some(to) = &range.to {
                bounds.insert("lte".to_string(), json!(to));
            }
            must.push(json!({"range": {"createdAt": Value::Object(bounds)}}));
        }
        if let Some(product_id) = &self.product_id {
            must.push(json!({
                "nested": {
                    "path": "items",
                    "query": {"term": {"items.productId": product_id}},
                }
            }));
        }
        if let Some(product_name) = &self.product_name {
            must.push(json!({
                "nested": {
                    "path": "items",
                    "query": {"wildcard": {"items.productName": format!("*{product_name}*")}},
                }
            }));
        }

        let query = if must.is_empty() {
            json!({"match_all": {}})
        } else {
            json!({"bool": {"must": must}})
        };

        request(query, page)
    }
}

impl IndexClient {
    /// Validates, compiles, and executes a filtered search.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Validation`] before any index call for bad
    /// pagination or date bounds; [`OrderError::SearchUnavailable`] for
    /// connection-class failures (retry guidance: try again later);
    /// [`OrderError::SearchFailed`] for everything else.
    pub async fn search_orders(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> Result<Paginated<Order>> {
        page.validate()?;
        filter.validate()?;

        let body = self.search(&filter.compile(page)).await.map_err(|e| match e {
            IndexError::Unavailable(reason) => OrderError::SearchUnavailable(reason),
            IndexError::Execution(reason) => OrderError::SearchFailed(reason),
            IndexError::NotFound => OrderError::NotFound,
        })?;

        let total = body.hits.total.value();
        let orders: Vec<Order> = body
            .hits
            .hits
            .into_iter()
            .map(|hit| hit.source.into_order())
            .collect();
        Ok(Paginated::new(orders, total, page))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn shared_request_shape() {
        let query = match_all(PageRequest::new(3, 20));
        assert_eq!(query["from"], 40);
        assert_eq!(query["size"], 20);
        assert_eq!(query["sort"][0]["createdAt"]["order"], "desc");
    }

    #[test]
    fn empty_filter_compiles_to_match_all() {
        let query = OrderFilter::new().compile(PageRequest::default());
        assert!(query["query"].get("match_all").is_some());
    }

    #[test]
    fn combined_filter_compiles_to_bool_must() {
        let filter = OrderFilter::new()
            .with_customer("cust-1")
            .with_status(OrderStatus::Shipped)
            .with_product_id("p1");
        let query = filter.compile(PageRequest::default());

        let must = query["query"]["bool"]["must"].as_array().unwrap();
        assert_eq!(must.len(), 3);
        assert_eq!(must[0]["term"]["customerId"], "cust-1");
        assert_eq!(must[1]["term"]["status"], "SHIPPED");
        assert_eq!(must[2]["nested"]["path"], "items");
    }

    #[test]
    fn product_name_is_partial_match() {
        let query = OrderFilter::new()
            .with_product_name("Wid")
            .compile(PageRequest::default());
        let must = query["query"]["bool"]["must"].as_array().unwrap();
        assert_eq!(
            must[0]["nested"]["query"]["wildcard"]["items.productName"],
            "*Wid*"
        );
    }

    #[test]
    fn date_range_requires_a_bound() {
        let filter = OrderFilter {
            created: Some(DateRange::default()),
            ..OrderFilter::default()
        };
        let err = filter.validate().unwrap_err();
        assert!(matches!(err, OrderError::Validation { .. }));
    }

    #[test]
    fn date_bounds_must_parse() {
        let filter = OrderFilter::new().with_created_range(Some("2026-02-30"), None::<String>);
        assert!(filter.validate().is_err());

        let filter = OrderFilter::new().with_created_range(Some("2026-02-28"), None::<String>);
        assert!(filter.validate().is_ok());
    }

    #[test]
    fn one_sided_range_compiles_single_bound() {
        let filter = OrderFilter::new().with_created_range(None::<String>, Some("2026-08-01"));
        let query = filter.compile(PageRequest::default());
        let range = &query["query"]["bool"]["must"][0]["range"]["createdAt"];
        assert!(range.get("gte").is_none());
        assert_eq!(range["lte"], "2026-08-01");
    }
}
