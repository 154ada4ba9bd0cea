//! Error taxonomy for the dual-store write and read paths.
//!
//! Three families, matching who is allowed to see them:
//!
//! - [`OrderError`] — the client-visible taxonomy returned by the store and
//!   the orchestrator. Domain errors (`NotFound`, `NotModifiable`,
//!   `Validation`) propagate unchanged; infrastructure failures are wrapped
//!   with only their message.
//! - [`IndexError`] — produced by the index store. Never crosses the
//!   orchestrator boundary on reads (fallback) and is converted into a
//!   reconciliation record on writes.
//! - [`PublishError`] — produced by the event publisher. Logged, never
//!   surfaced.

use crate::order::OrderStatus;
use thiserror::Error;

/// Result type alias for order operations.
pub type Result<T> = std::result::Result<T, OrderError>;

/// Client-visible error taxonomy for order operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// The order (or customer scope) does not exist. Never retried.
    #[error("Order not found")]
    NotFound,

    /// The order is in a terminal state and cannot be updated or cancelled.
    #[error("Order in status {status} cannot be modified")]
    NotModifiable {
        /// The offending terminal status.
        status: OrderStatus,
    },

    /// Input failed validation before any store call was made.
    #[error("Validation failed: {}", violations.join("; "))]
    Validation {
        /// Itemized reasons.
        violations: Vec<String>,
    },

    /// The creation transaction failed and was rolled back.
    #[error("Order creation failed: {0}")]
    CreateFailed(String),

    /// The update transaction failed and was rolled back.
    #[error("Order update failed: {0}")]
    UpdateFailed(String),

    /// A non-transactional storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The index store looks unreachable; the caller may retry later.
    #[error("Search service unavailable: {0}")]
    SearchUnavailable(String),

    /// The index store rejected or failed the query for a non-transport
    /// reason.
    #[error("Search execution failed: {0}")]
    SearchFailed(String),
}

impl OrderError {
    /// Convenience constructor for a single-violation validation error.
    #[must_use]
    pub fn validation(violation: impl Into<String>) -> Self {
        Self::Validation {
            violations: vec![violation.into()],
        }
    }

    /// Returns `true` for domain errors caused by the request itself
    /// (404/409/422-equivalents), as opposed to infrastructure failures.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound | Self::NotModifiable { .. } | Self::Validation { .. }
        )
    }

    /// Returns `true` when the failure is transient and "try again later"
    /// is sound retry guidance.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::SearchUnavailable(_))
    }
}

/// Errors produced by the index store.
///
/// Every index operation distinguishes logical absence (`NotFound`) from
/// transport/availability failure (`Unavailable`) and from all other
/// failures (`Execution`). Callers apply fallback; this layer never does.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// The query matched no documents.
    #[error("Document not found in index")]
    NotFound,

    /// Transport/connection-class failure reaching the index store.
    #[error("Index store unavailable: {0}")]
    Unavailable(String),

    /// The index store answered but the operation failed.
    #[error("Index operation failed: {0}")]
    Execution(String),
}

impl IndexError {
    /// Returns `true` for connection-class failures.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Errors produced by the event publisher.
///
/// These never reach the original request's caller; the orchestrator logs
/// them and moves on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// The event could not be serialized.
    #[error("Event serialization failed: {0}")]
    Serialization(String),

    /// The broker rejected the message or is unreachable.
    #[error("Publish to {topic} failed: {reason}")]
    Failed {
        /// Destination topic.
        topic: String,
        /// Underlying failure.
        reason: String,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn domain_errors_are_client_errors() {
        assert!(OrderError::NotFound.is_client_error());
        assert!(
            OrderError::NotModifiable {
                status: OrderStatus::Delivered
            }
            .is_client_error()
        );
        assert!(OrderError::validation("items must not be empty").is_client_error());
        assert!(!OrderError::CreateFailed("boom".into()).is_client_error());
    }

    #[test]
    fn unavailable_is_retryable() {
        assert!(OrderError::SearchUnavailable("refused".into()).is_retryable());
        assert!(!OrderError::SearchFailed("parse".into()).is_retryable());
    }

    #[test]
    fn not_modifiable_carries_status() {
        let err = OrderError::NotModifiable {
            status: OrderStatus::Delivered,
        };
        assert!(err.to_string().contains("DELIVERED"));
    }
}
