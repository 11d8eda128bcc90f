//! Hash ring data structure.
//!
//! # Algorithm
//!
//! The ring is a `Vec<RingEntry>` sorted by token. To route a key:
//!
//! 1. Hash the key into a [`RingToken`]
//! 2. Binary search for the first entry with `token >= key_token`
//! 3. If there is none, wrap around to the first entry
//!
//! Entries with equal tokens keep the order their shards were added in (the
//! sort is stable), so two rings built from the same shard sequence always
//! agree, even on collisions.
//!
//! # Thread Safety
//!
//! Membership lives behind a `parking_lot::RwLock`: lookups take the read
//! lock and proceed in parallel, `add_shard` / `remove_shard` take the write
//! lock. This lets one ring be shared behind an `Arc` by every request.

use crate::error::{Error, Result};
use crate::node::ShardId;
use crate::token::RingToken;
use crate::vnode::{RingEntry, DEFAULT_VNODES_PER_SHARD};
use parking_lot::RwLock;

#[derive(Debug, Default)]
struct RingState {
    /// Sorted by token; ties in shard-addition order.
    entries: Vec<RingEntry>,
    /// Distinct physical shards in addition order.
    shards: Vec<ShardId>,
}

/// Consistent hash ring mapping keys to shard identifiers.
#[derive(Debug)]
pub struct HashRing {
    state: RwLock<RingState>,
    vnodes_per_shard: usize,
}

impl HashRing {
    /// Build a ring over `shards`, placing `vnodes_per_shard` entries for each.
    ///
    /// # Errors
    /// - [`Error::InvalidShard`] if any shard id is blank
    /// - [`Error::NoVirtualNodes`] if `vnodes_per_shard` is zero and any shard is given
    ///
    /// # Example
    /// ```rust
    /// use corelib::HashRing;
    ///
    /// let ring = HashRing::new(["redis://a:6379", "redis://b:6379"], 100).unwrap();
    /// assert_eq!(ring.entry_count(), 200);
    /// ```
    pub fn new<I, S>(shards: I, vnodes_per_shard: usize) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<ShardId>,
    {
        let ring = Self::with_vnodes(vnodes_per_shard);
        for shard in shards {
            ring.add_shard(shard)?;
        }
        Ok(ring)
    }

    /// Create an empty ring.
    pub fn with_vnodes(vnodes_per_shard: usize) -> Self {
        Self {
            state: RwLock::new(RingState::default()),
            vnodes_per_shard,
        }
    }

    /// Insert `vnodes_per_shard` entries for `shard` and re-sort.
    ///
    /// Re-adding a shard that is already present is not idempotent: its
    /// entries are inserted a second time. Callers must not re-add.
    ///
    /// # Errors
    /// - [`Error::InvalidShard`] if the id is blank
    /// - [`Error::NoVirtualNodes`] if the ring places zero entries per shard
    ///
    /// # Performance
    /// - **Time**: O(n log n) where n = total entries after insertion
    pub fn add_shard(&self, shard: impl Into<ShardId>) -> Result<()> {
        let shard = shard.into();
        if shard.as_str().trim().is_empty() {
            return Err(Error::InvalidShard("shard id must not be blank".into()));
        }
        // A shard without entries would be registered yet unroutable.
        if self.vnodes_per_shard == 0 {
            return Err(Error::NoVirtualNodes);
        }

        // Hash outside the lock.
        let new_entries = RingEntry::for_shard(&shard, self.vnodes_per_shard);

        let mut state = self.state.write();
        insert_sorted(&mut state.entries, new_entries);
        if !state.shards.contains(&shard) {
            state.shards.push(shard);
        }
        Ok(())
    }

    /// Remove every entry owned by `shard`.
    ///
    /// # Returns
    /// `true` if the shard was present, `false` (no-op) otherwise.
    pub fn remove_shard(&self, shard: &str) -> bool {
        let mut state = self.state.write();
        let before = state.entries.len();
        state.entries.retain(|entry| entry.shard.as_str() != shard);
        state.shards.retain(|id| id.as_str() != shard);
        state.entries.len() != before
    }

    /// Find the shard responsible for `key`.
    ///
    /// # Errors
    /// [`Error::EmptyRing`] if no shards are registered.
    ///
    /// # Performance
    /// - **Time**: O(k + log n), k = key length, n = total entries
    pub fn route(&self, key: &str) -> Result<ShardId> {
        self.route_token(RingToken::from_key(key))
    }

    /// Find the shard owning an already-hashed position.
    pub fn route_token(&self, token: RingToken) -> Result<ShardId> {
        let state = self.state.read();
        if state.entries.is_empty() {
            return Err(Error::EmptyRing);
        }

        let idx = state.entries.partition_point(|entry| entry.token < token);
        // Past the last entry: wrap to the start of the ring.
        let idx = if idx == state.entries.len() { 0 } else { idx };
        Ok(state.entries[idx].shard.clone())
    }

    /// True if `shard` currently has entries on the ring.
    pub fn contains(&self, shard: &str) -> bool {
        self.state.read().shards.iter().any(|id| id.as_str() == shard)
    }

    /// Distinct shards in the order they were added.
    pub fn shards(&self) -> Vec<ShardId> {
        self.state.read().shards.clone()
    }

    pub fn shard_count(&self) -> usize {
        self.state.read().shards.len()
    }

    /// Total number of virtual nodes on the ring.
    pub fn entry_count(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }

    /// Snapshot of all entries in ring order (for debugging).
    pub fn entries(&self) -> Vec<RingEntry> {
        self.state.read().entries.clone()
    }

    pub fn vnodes_per_shard(&self) -> usize {
        self.vnodes_per_shard
    }
}

/// Append `new_entries` and restore token order. The sort is stable, so
/// entries already on the ring stay ahead of new ones with an equal token.
fn insert_sorted(entries: &mut Vec<RingEntry>, new_entries: Vec<RingEntry>) {
    entries.extend(new_entries);
    entries.sort_by_key(|entry| entry.token);
}

impl Default for HashRing {
    fn default() -> Self {
        Self::with_vnodes(DEFAULT_VNODES_PER_SHARD)
    }
}
