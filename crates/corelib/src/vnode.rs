//! Virtual node abstractions.
//!
//! # Virtual Nodes (VNodes) Concept
//!
//! Each physical shard is placed on the ring many times instead of once. Every
//! placement is a [`RingEntry`] whose token is the hash of `"{shard}#{i}"`.
//! This provides:
//!
//! 1. **Better Load Distribution**: More entries = smoother split of the key space
//! 2. **Minimal Disruption**: When a shard joins/leaves, only keys owned by its
//!    entries move, and those are spread across all other shards
//!
//! # Performance Characteristics
//!
//! - **Memory**: O(s * v) entries where s = shards, v = vnodes per shard
//! - **Lookup**: O(log(s * v)) binary search
//! - **Membership change**: O(s * v * log(s * v)) re-sort
//!
//! The default of 100 vnodes per shard keeps the standard deviation of shard
//! load around 10% for small shard counts.

use crate::node::ShardId;
use crate::token::RingToken;
use std::fmt;

/// Default number of virtual nodes per physical shard.
pub const DEFAULT_VNODES_PER_SHARD: usize = 100;

/// A virtual node on the hash ring.
///
/// Ordering is by token first, so a sorted `Vec<RingEntry>` is the ring.
/// Equal tokens are not merged; the ring keeps them in shard-addition order.
///
/// # Example
///
/// ```rust
/// use corelib::{RingEntry, ShardId};
///
/// let entry = RingEntry::from_index(&ShardId::new("redis://a:6379"), 0);
/// assert_eq!(entry.shard().as_str(), "redis://a:6379");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RingEntry {
    /// Token position on the ring.
    pub token: RingToken,

    /// The physical shard that owns this virtual node.
    pub shard: ShardId,
}

impl RingEntry {
    #[inline]
    pub fn new(token: RingToken, shard: ShardId) -> Self {
        Self { token, shard }
    }

    /// Create virtual node `vnode_index` of `shard`.
    ///
    /// The token is the hash of `"{shard}#{vnode_index}"`, which keeps
    /// placement reproducible for anyone who knows the shard list.
    pub fn from_index(shard: &ShardId, vnode_index: usize) -> Self {
        let token = RingToken::from_key(&shard.vnode_key(vnode_index));
        Self::new(token, shard.clone())
    }

    /// Generate all `vnodes` entries for `shard`, in index order.
    pub fn for_shard(shard: &ShardId, vnodes: usize) -> Vec<RingEntry> {
        (0..vnodes).map(|i| Self::from_index(shard, i)).collect()
    }

    #[inline]
    pub fn token(&self) -> RingToken {
        self.token
    }

    #[inline]
    pub fn shard(&self) -> &ShardId {
        &self.shard
    }
}

impl fmt::Display for RingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VNode(token={}, shard={})", self.token, self.shard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_from_index() {
        let shard = ShardId::new("shard-1");
        let vnode0 = RingEntry::from_index(&shard, 0);
        let vnode1 = RingEntry::from_index(&shard, 1);

        // Different positions, same owner
        assert_ne!(vnode0.token(), vnode1.token());
        assert_eq!(vnode0.shard(), vnode1.shard());
        assert_eq!(vnode0.token(), RingToken::from_key("shard-1#0"));
    }

    #[test]
    fn test_for_shard_count() {
        let entries = RingEntry::for_shard(&ShardId::new("s"), 7);
        assert_eq!(entries.len(), 7);
        assert!(entries.iter().all(|e| e.shard().as_str() == "s"));
    }

    #[test]
    fn test_for_shard_zero_vnodes() {
        assert!(RingEntry::for_shard(&ShardId::new("s"), 0).is_empty());
    }
}
