//! Kafka/Redpanda lifecycle event publisher for ordersync.
//!
//! This crate provides [`KafkaEventPublisher`], the production implementation
//! of the [`EventPublisher`] trait from `ordersync-core`. Events are JSON and
//! keyed by order UUID, so every event for one order lands on the same
//! partition and consumers observe them in order.
//!
//! # Delivery Semantics
//!
//! Publishing is **best-effort and non-blocking**: `publish` serializes the
//! event, appends it to an in-memory FIFO queue, and returns. A background
//! drain loop moves queued messages to the broker:
//!
//! - **Transient failures** (broker down, queue full, leadership change) put
//!   the message back at the head of the queue and back off exponentially.
//!   Submission order is preserved across retries.
//! - **Non-transient failures** (unknown topic config, message too large)
//!   drop the message with an `error` log and a counter increment. A poison
//!   message must not wedge the queue.
//! - After `max_attempts` consecutive transient failures the drain loop
//!   parks; the next `publish` call wakes it, so a recovered broker receives
//!   the whole backlog.
//!
//! The queue is in-memory only. Events queued at the moment of a process
//! crash are lost; the orders they describe survive in Postgres, which stays
//! the source of truth.
//!
//! # Example
//!
//! ```no_run
//! use ordersync_core::{EventPublisher, OrderEvent};
//! use ordersync_events::KafkaEventPublisher;
//!
//! # async fn example(order: ordersync_core::Order) -> Result<(), Box<dyn std::error::Error>> {
//! let publisher = KafkaEventPublisher::builder()
//!     .brokers("localhost:9092")
//!     .build()?;
//! publisher.ensure_topic().await;
//!
//! publisher.publish(OrderEvent::created(&order)).await?;
//!
//! // Drain whatever is still queued before shutdown.
//! publisher.flush().await;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backoff;
mod queue;

pub use backoff::RetryPolicy;

use ordersync_core::event::ORDER_EVENTS_TOPIC;
use ordersync_core::{EventPublisher, OrderEvent, PublishError};
use queue::{OutboundQueue, QueuedMessage};
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Kafka-backed order event publisher.
///
/// Cheap to clone; clones share one producer, one admin client, and one
/// outbound queue.
///
/// See the [crate docs](crate) for delivery semantics.
#[derive(Clone)]
pub struct KafkaEventPublisher {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for KafkaEventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaEventPublisher")
            .field("topic", &self.inner.topic)
            .finish_non_exhaustive()
    }
}

struct Inner {
    producer: FutureProducer,
    admin: AdminClient<DefaultClientContext>,
    topic: String,
    send_timeout: Duration,
    policy: RetryPolicy,
    queue: OutboundQueue,
    /// True while exactly one drain loop is running.
    draining: AtomicBool,
    topic_ready: AtomicBool,
}

impl KafkaEventPublisher {
    /// Creates a publisher with default configuration.
    ///
    /// # Parameters
    ///
    /// - `brokers`: Comma-separated broker addresses (e.g., "localhost:9092")
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Failed`] if the producer or admin client
    /// cannot be created from the configuration. Broker reachability is not
    /// checked here; an unreachable broker surfaces as transient failures in
    /// the drain loop.
    pub fn new(brokers: &str) -> Result<Self, PublishError> {
        Self::builder().brokers(brokers).build()
    }

    /// Creates a builder for configuring the publisher.
    #[must_use]
    pub fn builder() -> KafkaEventPublisherBuilder {
        KafkaEventPublisherBuilder::default()
    }

    /// The topic this publisher writes to.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.inner.topic
    }

    /// Number of events waiting for the broker.
    pub async fn queued(&self) -> usize {
        self.inner.queue.len().await
    }

    /// Creates the topic if it does not exist yet.
    ///
    /// Idempotent and best-effort: an already-existing topic counts as
    /// success, any other failure is logged and retried lazily before the
    /// next send. Call once at startup so first sends do not race topic
    /// auto-creation.
    pub async fn ensure_topic(&self) {
        self.inner.ensure_topic().await;
    }

    /// Drains the queue inline, blocking until it is empty or the retry
    /// budget is exhausted. Intended for graceful shutdown.
    pub async fn flush(&self) {
        Arc::clone(&self.inner).drain().await;
    }
}

impl EventPublisher for KafkaEventPublisher {
    async fn publish(&self, event: OrderEvent) -> Result<(), PublishError> {
        let payload = serde_json::to_vec(&event)
            .map_err(|e| PublishError::Serialization(format!("Failed to serialize event: {e}")))?;

        let message = QueuedMessage {
            key: event.order_uuid().to_string(),
            payload,
            event_type: event.event_type(),
        };

        self.inner.queue.push_back(message).await;
        tracing::debug!(
            topic = %self.inner.topic,
            event_type = event.event_type(),
            order_uuid = %event.order_uuid(),
            "Event queued"
        );

        // Wake the drain loop; a no-op if one is already running.
        let inner = Arc::clone(&self.inner);
        tokio::spawn(inner.drain());

        Ok(())
    }
}

impl Inner {
    /// Moves queued messages to the broker, one at a time, in FIFO order.
    ///
    /// At most one drain loop runs per publisher; the `draining` flag keeps
    /// late spawns from racing an active loop.
    async fn drain(self: Arc<Self>) {
        if self.draining.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut attempt = 0usize;

        loop {
            let Some(message) = self.queue.pop_front().await else {
                self.draining.store(false, Ordering::SeqCst);
                // A publish may have enqueued between the empty pop and the
                // flag reset; reclaim the loop if nobody else has.
                if self.queue.is_empty().await || self.draining.swap(true, Ordering::SeqCst) {
                    return;
                }
                continue;
            };

            if !self.topic_ready.load(Ordering::SeqCst) {
                self.ensure_topic().await;
            }

            let record = FutureRecord::to(&self.topic)
                .key(&message.key)
                .payload(&message.payload);

            match self.producer.send(record, Timeout::After(self.send_timeout)).await {
                Ok((partition, offset)) => {
                    attempt = 0;
                    tracing::debug!(
                        topic = %self.topic,
                        partition,
                        offset,
                        event_type = message.event_type,
                        "Event published"
                    );
                }
                Err((error, _)) if is_transient(&error) => {
                    self.queue.push_front(message).await;
                    attempt += 1;

                    if attempt >= self.policy.max_attempts {
                        let queued = self.queue.len().await;
                        tracing::error!(
                            topic = %self.topic,
                            error = %error,
                            queued,
                            "Broker unreachable after {attempt} attempts, parking until next publish"
                        );
                        self.draining.store(false, Ordering::SeqCst);
                        return;
                    }

                    let delay = self.policy.delay_for_attempt(attempt - 1);
                    tracing::warn!(
                        topic = %self.topic,
                        error = %error,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Transient publish failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err((error, _)) => {
                    attempt = 0;
                    tracing::error!(
                        topic = %self.topic,
                        error = %error,
                        event_type = message.event_type,
                        key = %message.key,
                        "Dropping event after non-retryable failure"
                    );
                    metrics::counter!(
                        "ordersync.publisher.dropped",
                        "event_type" => message.event_type
                    )
                    .increment(1);
                }
            }
        }
    }

    async fn ensure_topic(&self) {
        let topic = NewTopic::new(&self.topic, 1, TopicReplication::Fixed(1));

        match self.admin.create_topics([&topic], &AdminOptions::new()).await {
            Ok(results) => {
                for result in results {
                    match result {
                        Ok(name) => {
                            self.topic_ready.store(true, Ordering::SeqCst);
                            tracing::info!(topic = %name, "Topic created");
                        }
                        Err((name, RDKafkaErrorCode::TopicAlreadyExists)) => {
                            self.topic_ready.store(true, Ordering::SeqCst);
                            tracing::debug!(topic = %name, "Topic already exists");
                        }
                        Err((name, code)) => {
                            tracing::warn!(
                                topic = %name,
                                error = %code,
                                "Failed to ensure topic"
                            );
                        }
                    }
                }
            }
            Err(error) => {
                tracing::warn!(
                    topic = %self.topic,
                    error = %error,
                    "Topic creation request failed"
                );
            }
        }
    }
}

/// Whether a send failure is worth retrying.
///
/// Connectivity and leadership problems resolve themselves; everything else
/// (message too large, invalid config, authorization) will fail the same way
/// on every retry.
fn is_transient(error: &KafkaError) -> bool {
    matches!(
        error.rdkafka_error_code(),
        Some(
            RDKafkaErrorCode::QueueFull
                | RDKafkaErrorCode::AllBrokersDown
                | RDKafkaErrorCode::BrokerTransportFailure
                | RDKafkaErrorCode::LeaderNotAvailable
                | RDKafkaErrorCode::NotLeaderForPartition
                | RDKafkaErrorCode::NetworkException
                | RDKafkaErrorCode::CoordinatorNotAvailable
                | RDKafkaErrorCode::MessageTimedOut
                | RDKafkaErrorCode::RequestTimedOut
        )
    )
}

/// Builder for configuring a [`KafkaEventPublisher`].
///
/// # Example
///
/// ```no_run
/// use ordersync_events::{KafkaEventPublisher, RetryPolicy};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let publisher = KafkaEventPublisher::builder()
///     .brokers("localhost:9092,localhost:9093")
///     .topic("orders.events")
///     .acks("all")
///     .send_timeout(Duration::from_secs(10))
///     .retry_policy(RetryPolicy::default())
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct KafkaEventPublisherBuilder {
    brokers: Option<String>,
    topic: Option<String>,
    acks: Option<String>,
    send_timeout: Option<Duration>,
    policy: Option<RetryPolicy>,
}

impl KafkaEventPublisherBuilder {
    /// Sets the broker addresses (comma-separated).
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Sets the target topic. Default: [`ORDER_EVENTS_TOPIC`].
    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Sets the producer acknowledgment mode: "0", "1", or "all".
    ///
    /// Default: "1"
    #[must_use]
    pub fn acks(mut self, acks: impl Into<String>) -> Self {
        self.acks = Some(acks.into());
        self
    }

    /// Sets the per-send timeout. Default: 5 seconds.
    #[must_use]
    pub const fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    /// Sets the backoff policy for transient failures.
    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Builds the [`KafkaEventPublisher`].
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Failed`] if brokers are not set or the
    /// producer/admin client cannot be created.
    pub fn build(self) -> Result<KafkaEventPublisher, PublishError> {
        let topic = self.topic.unwrap_or_else(|| ORDER_EVENTS_TOPIC.to_string());
        let brokers = self.brokers.ok_or_else(|| PublishError::Failed {
            topic: topic.clone(),
            reason: "Brokers not configured".to_string(),
        })?;

        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", "5000")
            .set("acks", self.acks.as_deref().unwrap_or("1"));

        let producer: FutureProducer = config.create().map_err(|e| PublishError::Failed {
            topic: topic.clone(),
            reason: format!("Failed to create producer: {e}"),
        })?;

        let admin: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .create()
            .map_err(|e| PublishError::Failed {
                topic: topic.clone(),
                reason: format!("Failed to create admin client: {e}"),
            })?;

        tracing::info!(
            brokers = %brokers,
            topic = %topic,
            acks = self.acks.as_deref().unwrap_or("1"),
            "KafkaEventPublisher created"
        );

        Ok(KafkaEventPublisher {
            inner: Arc::new(Inner {
                producer,
                admin,
                topic,
                send_timeout: self.send_timeout.unwrap_or(Duration::from_secs(5)),
                policy: self.policy.unwrap_or_default(),
                queue: OutboundQueue::new(),
                draining: AtomicBool::new(false),
                topic_ready: AtomicBool::new(false),
            }),
        })
    }
}
