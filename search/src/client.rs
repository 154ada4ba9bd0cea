//! HTTP client for the index store.
//!
//! Speaks a minimal Elasticsearch-compatible surface: document upsert by
//! id, delete by id, and `_search`. Connection-class failures (connect,
//! timeout) map to [`IndexError::Unavailable`]; everything else the store
//! answers with maps to [`IndexError::Execution`].

use crate::document::{OrderDocument, SearchBody, SearchResponse};
use ordersync_core::IndexError;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use uuid::Uuid;

/// Default logical index holding order documents.
pub const DEFAULT_INDEX: &str = "orders";

/// Client for the search/index store.
///
/// # Example
///
/// ```no_run
/// use ordersync_search::IndexClient;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), ordersync_core::IndexError> {
/// let client = IndexClient::builder()
///     .base_url("http://localhost:9200")
///     .index("orders")
///     .timeout(Duration::from_secs(5))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct IndexClient {
    http: Client,
    base_url: String,
    index: String,
}

impl IndexClient {
    /// Creates a client for the given base URL with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Execution`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, IndexError> {
        Self::builder().base_url(base_url).build()
    }

    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> IndexClientBuilder {
        IndexClientBuilder::default()
    }

    /// The logical index this client writes to.
    #[must_use]
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Upserts a document by id (`PUT {index}/_doc/{id}`).
    ///
    /// Create and update are the same operation at the storage level: both
    /// put current state.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Unavailable`] or [`IndexError::Execution`].
    pub async fn put_document(&self, id: Uuid, doc: &OrderDocument) -> Result<(), IndexError> {
        let url = format!("{}/{}/_doc/{id}?refresh=true", self.base_url, self.index);
        let response = self
            .http
            .put(&url)
            .json(doc)
            .send()
            .await
            .map_err(classify)?;

        if response.status().is_success() {
            tracing::debug!(document_id = %id, index = %self.index, "Document indexed");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(IndexError::Execution(format!(
                "Index responded {status}: {body}"
            )))
        }
    }

    /// Deletes a document by id. A 404 from the store is success: deleting
    /// an already-deleted document is idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Unavailable`] or [`IndexError::Execution`].
    pub async fn delete_document(&self, id: Uuid) -> Result<(), IndexError> {
        let url = format!("{}/{}/_doc/{id}?refresh=true", self.base_url, self.index);
        let response = self.http.delete(&url).send().await.map_err(classify)?;

        match response.status() {
            status if status.is_success() => {
                tracing::debug!(document_id = %id, index = %self.index, "Document deleted");
                Ok(())
            }
            StatusCode::NOT_FOUND => {
                tracing::debug!(document_id = %id, index = %self.index, "Document already absent");
                Ok(())
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(IndexError::Execution(format!(
                    "Delete responded {status}: {body}"
                )))
            }
        }
    }

    /// Runs a `_search` request and decodes either response shape.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Unavailable`] for transport failures,
    /// [`IndexError::Execution`] for non-success statuses and undecodable
    /// bodies.
    pub async fn search(&self, query: &serde_json::Value) -> Result<SearchBody, IndexError> {
        let url = format!("{}/{}/_search", self.base_url, self.index);
        let response = self
            .http
            .post(&url)
            .json(query)
            .send()
            .await
            .map_err(classify)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IndexError::Execution(format!(
                "Search responded {status}: {body}"
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| IndexError::Execution(format!("Failed to parse search response: {e}")))?;
        Ok(parsed.into_body())
    }
}

/// Splits transport-level failures from everything else.
fn classify(e: reqwest::Error) -> IndexError {
    if e.is_connect() || e.is_timeout() {
        IndexError::Unavailable(e.to_string())
    } else {
        IndexError::Execution(e.to_string())
    }
}

/// Builder for [`IndexClient`].
#[derive(Default)]
pub struct IndexClientBuilder {
    base_url: Option<String>,
    index: Option<String>,
    timeout: Option<Duration>,
}

impl IndexClientBuilder {
    /// Sets the index store base URL (e.g. `http://localhost:9200`).
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the logical index name. Default: `orders`.
    #[must_use]
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    /// Sets the per-request timeout. Default: 10 seconds.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Execution`] if the base URL is missing or the
    /// HTTP client cannot be constructed.
    pub fn build(self) -> Result<IndexClient, IndexError> {
        let base_url = self
            .base_url
            .ok_or_else(|| IndexError::Execution("Base URL not configured".to_string()))?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let http = Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(10)))
            .build()
            .map_err(|e| IndexError::Execution(format!("Failed to build HTTP client: {e}")))?;

        Ok(IndexClient {
            http,
            base_url,
            index: self.index.unwrap_or_else(|| DEFAULT_INDEX.to_string()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn builder_requires_base_url() {
        assert!(IndexClient::builder().build().is_err());
    }

    #[test]
    fn builder_trims_trailing_slash() {
        let client = IndexClient::builder()
            .base_url("http://localhost:9200/")
            .build()
            .unwrap();
        assert_eq!(client.base_url, "http://localhost:9200");
        assert_eq!(client.index(), DEFAULT_INDEX);
    }
}
