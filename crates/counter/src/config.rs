//! Tuning knobs for [`crate::CounterService`].

use std::time::Duration;

/// What the flush does with a key whose `INCRBY` failed or timed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushFailurePolicy {
    /// Discard the delta for this cycle. Visits can be lost during an outage.
    #[default]
    Drop,
    /// Merge the delta back into the live buffer for the next cycle. Visits
    /// can be counted twice if a timed-out `INCRBY` actually landed.
    Requeue,
}

#[derive(Debug, Clone)]
pub struct CounterConfig {
    /// How long a stored value read from a shard may be served from memory.
    pub cache_ttl: Duration,
    /// Period of the background flush.
    pub flush_interval: Duration,
    /// Upper bound on a read's shard round-trip.
    pub request_timeout: Duration,
    /// Upper bound on each key's `INCRBY` during a flush.
    pub flush_timeout: Duration,
    /// Keys flushed in parallel.
    pub max_concurrent_flushes: usize,
    pub on_flush_failure: FlushFailurePolicy,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(5),
            flush_interval: Duration::from_secs(30),
            request_timeout: Duration::from_secs(2),
            flush_timeout: Duration::from_secs(5),
            max_concurrent_flushes: 64,
            on_flush_failure: FlushFailurePolicy::Drop,
        }
    }
}
