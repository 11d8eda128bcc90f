//! Buffered, cached visit counting on top of shard routing.
//!
//! This crate turns a [`sharding::ShardRouter`] into a low-latency counter:
//! - writes land in an in-memory buffer and return immediately
//! - a background task drains the buffer into the shards on an interval
//! - reads combine the buffered delta with a short-lived cache of the stored
//!   value, falling back to the owning shard when the cache is stale
//!
//! The stored value and the buffered delta are kept apart everywhere, so a
//! cache refresh never double counts visits that are still buffered.

pub mod buffer;
pub mod cache;
pub mod config;
pub mod flush;
pub mod service;
pub mod visit;

pub use buffer::WriteBuffer;
pub use cache::{CacheEntry, ReadCache};
pub use config::{CounterConfig, FlushFailurePolicy};
pub use flush::FlushTask;
pub use service::{CounterService, FlushReport};
pub use visit::{ServedVia, VisitCount};
