//! In-memory write buffer.
//!
//! Holds visits that were accepted but not yet written to a shard. One coarse
//! lock guards the whole map: every operation is a few hash-map steps and
//! never awaits, so contention stays short, and [`WriteBuffer::drain`] can
//! swap the whole map out in a single critical section.

use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct WriteBuffer {
    pending: Mutex<HashMap<String, i64>>,
}

impl WriteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` to `key` and return the key's new buffered total.
    pub fn add(&self, key: &str, delta: i64) -> i64 {
        let mut pending = self.pending.lock();
        let slot = pending.entry(key.to_string()).or_insert(0);
        *slot = slot.saturating_add(delta);
        *slot
    }

    /// Buffered delta for `key` (0 if none).
    pub fn get(&self, key: &str) -> i64 {
        self.pending.lock().get(key).copied().unwrap_or(0)
    }

    /// Take every pending `(key, delta)` and leave the buffer empty.
    ///
    /// Snapshot and clear happen under one lock acquisition: an `add` racing
    /// with this call lands either in the returned batch or in the fresh
    /// buffer, never in both and never in neither.
    pub fn drain(&self) -> Vec<(String, i64)> {
        let taken = std::mem::take(&mut *self.pending.lock());
        taken.into_iter().collect()
    }

    /// Fold deltas back in (used to requeue failed flushes).
    pub fn merge<I>(&self, deltas: I)
    where
        I: IntoIterator<Item = (String, i64)>,
    {
        let mut pending = self.pending.lock();
        for (key, delta) in deltas {
            let slot = pending.entry(key).or_insert(0);
            *slot = slot.saturating_add(delta);
        }
    }

    /// Number of keys with a pending delta.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Sum of all pending deltas.
    pub fn pending_total(&self) -> i64 {
        self.pending.lock().values().sum()
    }
}
