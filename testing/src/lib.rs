//! In-memory fakes for testing ordersync services.
//!
//! Provides fast, deterministic implementations of every contract the
//! orchestrator depends on:
//!
//! - [`InMemoryOrderStore`]: HashMap-backed system of record
//! - [`InMemoryOrderIndex`]: read-side index with failure injection
//! - [`RecordingReconciliationStore`]: captures failed-operation records
//! - [`RecordingPublisher`]: captures published events
//!
//! All fakes are `Clone`; clones share state, so a test can hold a handle
//! for assertions while the service under test holds another.
//!
//! # Example
//!
//! ```
//! use ordersync_core::{NewOrderItem, OrderStore};
//! use ordersync_testing::InMemoryOrderStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryOrderStore::new();
//! let order = store
//!     .create("cust-1", vec![NewOrderItem {
//!         product_id: "p1".into(),
//!         product_name: "Widget".into(),
//!         price: 1500,
//!         quantity: 3,
//!     }])
//!     .await?;
//! assert_eq!(order.total, 4500);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning is the only panic source

mod index;
mod recording;
mod store;

pub use index::InMemoryOrderIndex;
pub use recording::{RecordedFailure, RecordingPublisher, RecordingReconciliationStore};
pub use store::InMemoryOrderStore;
