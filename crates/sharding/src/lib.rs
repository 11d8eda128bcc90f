//! Shard routing for counter keys.
//!
//! This crate owns the connection to every backing-store shard and routes each
//! counter operation to the one shard that owns the key:
//! - `CounterStore`: the `INCRBY` / `GET` seam a shard must provide
//! - `RedisStore` / `MemoryStore`: the two implementations of that seam
//! - `ShardRouter`: hash ring + one store per shard
//!
//! There is no caching, buffering or retrying here; consistency policy lives
//! one layer up.

pub mod error;
pub mod router;
pub mod store;

pub use error::{RouterError, StoreError};
pub use router::{ShardReply, ShardRouter};
pub use store::{connect_store, CounterStore, MemoryStore, RedisStore, StoreCall};

pub use corelib::ShardId;
