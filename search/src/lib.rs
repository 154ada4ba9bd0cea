//! Search/index store integration for ordersync.
//!
//! The index store holds a denormalized, eventually consistent copy of each
//! order, keyed by UUID, in one logical index. It is a read optimization,
//! never the system of record: this crate reports failures precisely
//! (absence vs. transport vs. execution) and leaves fallback to the
//! orchestrator.
//!
//! Pieces:
//!
//! - [`client::IndexClient`] — thin HTTP client for an
//!   Elasticsearch-compatible API (document put/delete, `_search`),
//!   tolerant of both flat and `{body: ...}`-wrapped response shapes.
//! - [`document::OrderDocument`] — the flattened, query-friendly document
//!   shape, reconstructible back into an [`ordersync_core::Order`].
//! - [`projector`] — the [`ordersync_core::OrderIndex`] implementation.
//! - [`query::OrderFilter`] — typed filters compiled into index-store
//!   queries with consistent pagination and sorting.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod document;
pub mod projector;
pub mod query;

pub use client::IndexClient;
pub use document::OrderDocument;
pub use query::OrderFilter;
