//! Reconciliation types: durable records of index-store operations that
//! failed and must be replayed later.
//!
//! A record references its order only by UUID (weak reference, no cascade),
//! since the index failure may happen after the transactional row was
//! committed or even deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of index-store operation that failed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    /// Initial document indexing failed.
    Index,
    /// Document update failed.
    Update,
    /// Document deletion failed.
    Delete,
}

impl OperationKind {
    /// Storage string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Index => "INDEX",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }

    /// Case-insensitive parse of a free-text operation kind.
    ///
    /// Returns `None` for unrecognized strings; the recorder maps those to
    /// [`OperationKind::Index`] with a warning rather than failing.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INDEX" => Some(Self::Index),
            "UPDATE" => Some(Self::Update),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// Processing status of a reconciliation record.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconciliationStatus {
    /// Recorded, awaiting replay (initial state).
    Pending,
    /// Replay succeeded.
    Processed,
    /// Replay exhausted its retries.
    Failed,
}

impl ReconciliationStatus {
    /// Storage string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processed => "PROCESSED",
            Self::Failed => "FAILED",
        }
    }

    /// Parse a status from its storage string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "PROCESSED" => Some(Self::Processed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A durable record of one failed index propagation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRecord {
    /// Internal sequential id.
    pub id: i64,
    /// UUID of the affected order (weak reference).
    pub order_uuid: Uuid,
    /// What failed.
    pub operation: OperationKind,
    /// Where the record is in its replay lifecycle.
    pub status: ReconciliationStatus,
    /// Free-text diagnostic from the original failure.
    pub error_message: String,
    /// When the failure was recorded.
    pub created_at: DateTime<Utc>,
    /// When the record last changed.
    pub updated_at: DateTime<Utc>,
}
