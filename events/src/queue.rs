//! In-memory FIFO queue of outbound messages.
//!
//! Owned by one publisher instance; unbounded by design (accepted risk —
//! the bus being down should not fail writes), mutated by at most one drain
//! loop at a time.

use std::collections::VecDeque;
use tokio::sync::Mutex;

/// One serialized event waiting to reach the broker.
#[derive(Debug)]
pub(crate) struct QueuedMessage {
    /// Message key (order UUID) for partitioning.
    pub key: String,
    /// JSON payload.
    pub payload: Vec<u8>,
    /// Stable event-type name for logs and metrics.
    pub event_type: &'static str,
}

#[derive(Default)]
pub(crate) struct OutboundQueue {
    inner: Mutex<VecDeque<QueuedMessage>>,
}

impl OutboundQueue {
    pub(crate) const fn new() -> Self {
        Self {
            inner: Mutex::const_new(VecDeque::new()),
        }
    }

    /// Appends a newly submitted message.
    pub(crate) async fn push_back(&self, message: QueuedMessage) {
        self.inner.lock().await.push_back(message);
    }

    /// Puts a message back at the head after a transient send failure, so
    /// submission order is preserved.
    pub(crate) async fn push_front(&self, message: QueuedMessage) {
        self.inner.lock().await.push_front(message);
    }

    /// Takes the next message to send.
    pub(crate) async fn pop_front(&self) -> Option<QueuedMessage> {
        self.inner.lock().await.pop_front()
    }

    pub(crate) async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub(crate) async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}
