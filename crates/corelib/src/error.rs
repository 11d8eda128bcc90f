//! Error types for the core library.

use thiserror::Error;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No shards are registered, so no key can be routed.
    #[error("No shards available in the hash ring")]
    EmptyRing,
    /// Shard identifier rejected (blank or otherwise unusable).
    #[error("Invalid shard: {0}")]
    InvalidShard(String),
    /// The ring places zero virtual nodes per shard, so a shard could never own a key.
    #[error("Virtual nodes per shard must be at least 1")]
    NoVirtualNodes,
}
