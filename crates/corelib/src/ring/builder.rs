//! Builder for [`HashRing`].

use crate::error::Result;
use crate::node::ShardId;
use crate::ring::HashRing;
use crate::vnode::DEFAULT_VNODES_PER_SHARD;

/// Collects shards and a vnode count, then builds the ring in one go.
///
/// # Example
/// ```rust
/// use corelib::RingBuilder;
///
/// let ring = RingBuilder::new()
///     .with_vnodes(8)
///     .add_shard("redis://a:6379")
///     .add_shard("redis://b:6379")
///     .build()
///     .unwrap();
/// assert_eq!(ring.entry_count(), 16);
/// ```
#[derive(Debug, Clone)]
pub struct RingBuilder {
    vnodes_per_shard: usize,
    shards: Vec<ShardId>,
}

impl RingBuilder {
    pub fn new() -> Self {
        Self {
            vnodes_per_shard: DEFAULT_VNODES_PER_SHARD,
            shards: Vec::new(),
        }
    }

    pub fn with_vnodes(mut self, vnodes_per_shard: usize) -> Self {
        self.vnodes_per_shard = vnodes_per_shard;
        self
    }

    pub fn add_shard(mut self, shard: impl Into<ShardId>) -> Self {
        self.shards.push(shard.into());
        self
    }

    pub fn build(self) -> Result<HashRing> {
        HashRing::new(self.shards, self.vnodes_per_shard)
    }
}

impl Default for RingBuilder {
    fn default() -> Self {
        Self::new()
    }
}
