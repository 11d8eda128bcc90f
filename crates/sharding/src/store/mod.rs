//! Backing-store abstractions.
//!
//! A shard is any integer-counter store that can `INCRBY` and `GET`. The
//! store owns durability; the router only needs these two calls.

pub mod memory;
pub mod redis;

pub use self::memory::{MemoryStore, StoreCall};
pub use self::redis::RedisStore;

use crate::error::StoreError;
use async_trait::async_trait;
use std::sync::Arc;

/// Remote integer-counter store for one shard.
///
/// # Thread Safety
///
/// Implementations are shared behind `Arc` by every request and by the flush
/// task, so they must be `Send + Sync` and do their own connection pooling.
#[async_trait]
pub trait CounterStore: Send + Sync + 'static {
    /// Atomically add `amount` to `key` and return the new stored value.
    /// A missing key counts as 0.
    async fn incr_by(&self, key: &str, amount: i64) -> Result<i64, StoreError>;

    /// Current value of `key`, or `None` if it was never written.
    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError>;

    /// Implementation name (for logging).
    fn name(&self) -> &'static str;
}

/// Build the store for a shard address, picking the implementation by scheme.
///
/// - `redis://` / `rediss://` → [`RedisStore`] (connects lazily)
/// - `memory://<name>` → [`MemoryStore`], for local runs without Redis
pub fn connect_store(address: &str) -> Result<Arc<dyn CounterStore>, StoreError> {
    let scheme = address
        .split_once("://")
        .map(|(scheme, _)| scheme.to_ascii_lowercase())
        .ok_or_else(|| StoreError::InvalidAddress(format!("missing scheme in {address:?}")))?;

    match scheme.as_str() {
        "redis" | "rediss" => Ok(Arc::new(RedisStore::open(address)?)),
        "memory" => Ok(Arc::new(MemoryStore::new(address))),
        other => Err(StoreError::InvalidAddress(format!(
            "unsupported scheme {other:?} in {address:?}"
        ))),
    }
}
