//! Time-bounded cache of stored counter values.
//!
//! An entry is the value a shard reported and the instant the request that
//! produced it was issued. It never includes buffered visits; readers add
//! the buffer on top. Freshness is checked on every read (`now - captured_at
//! < ttl`); nothing expires in the background.
//!
//! Entries live in a `DashMap`, so readers of different keys hit different
//! shard locks, and a `(value, captured_at)` pair is always replaced as a
//! whole.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    /// Stored value as of `captured_at`.
    pub value: i64,
    /// When the store request behind `value` was issued.
    pub captured_at: Instant,
}

impl CacheEntry {
    #[inline]
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.captured_at) < ttl
    }
}

#[derive(Debug)]
pub struct ReadCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ReadCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stored value for `key` if its entry is still fresh at `now`.
    pub fn get_fresh(&self, key: &str, now: Instant) -> Option<i64> {
        let entry = *self.entries.get(key)?;
        entry.is_fresh(now, self.ttl).then_some(entry.value)
    }

    /// Raw entry regardless of freshness.
    pub fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.entries.get(key).map(|e| *e)
    }

    /// Record `value` read by a request issued at `captured_at`.
    ///
    /// An entry captured later is kept: answers from slow requests must not
    /// roll the cache back. Returns whether the entry was written.
    pub fn store(&self, key: &str, value: i64, captured_at: Instant) -> bool {
        let candidate = CacheEntry { value, captured_at };
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().captured_at <= captured_at {
                    occupied.insert(candidate);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(candidate);
                true
            }
        }
    }

    /// Like [`ReadCache::store`], but only for keys already cached.
    ///
    /// Used after a flush: the new stored value makes an existing entry
    /// current again, without populating the cache for keys nobody reads.
    pub fn refresh(&self, key: &str, value: i64, captured_at: Instant) -> bool {
        match self.entries.get_mut(key) {
            Some(mut entry) if entry.captured_at <= captured_at => {
                *entry = CacheEntry { value, captured_at };
                true
            }
            _ => false,
        }
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Drop entries that can no longer be served. Only bounds memory; reads
    /// already ignore stale entries.
    pub fn purge_stale(&self, now: Instant) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.is_fresh(now, ttl));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
