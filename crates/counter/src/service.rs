//! The visit counter service.
//!
//! # Write path
//!
//! `increment_visit` adds 1 to the page's buffered delta and returns the new
//! delta. It never touches a shard, so it cannot fail or block on the store.
//!
//! # Read path
//!
//! 1. Fresh cache entry → `cached + buffered`, served `in_memory`
//! 2. Otherwise `GET` on the owning shard (bounded by `request_timeout`),
//!    cache the stored value → `stored + buffered`, served `shard:<id>`
//! 3. Shard failure or timeout → `0`, served `error`
//!
//! # Flush
//!
//! Drain the buffer atomically, then `INCRBY` every `(key, delta)` on its
//! shard, each bounded by `flush_timeout` and independent of the others.
//! Failed deltas are dropped or requeued according to
//! [`FlushFailurePolicy`].
//!
//! No lock is held across a store call: buffer and cache are read or
//! updated before and after the I/O, never during.

use crate::buffer::WriteBuffer;
use crate::cache::ReadCache;
use crate::config::{CounterConfig, FlushFailurePolicy};
use crate::visit::VisitCount;
use sharding::ShardRouter;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Outcome of one flush cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Keys whose delta reached their shard.
    pub flushed_keys: usize,
    /// Visits written to shards.
    pub flushed_total: i64,
    /// Keys whose `INCRBY` failed or timed out.
    pub failed_keys: usize,
    /// Visits lost under [`FlushFailurePolicy::Drop`].
    pub dropped_total: i64,
    /// Visits put back into the buffer under [`FlushFailurePolicy::Requeue`].
    pub requeued_total: i64,
}

impl FlushReport {
    pub fn is_empty(&self) -> bool {
        self.flushed_keys == 0 && self.failed_keys == 0
    }
}

struct KeyFlush {
    key: String,
    delta: i64,
    issued_at: Instant,
    result: Result<i64, String>,
}

/// Buffered, cached visit counter over a [`ShardRouter`].
///
/// Owns its buffer and cache exclusively; share the service itself behind an
/// `Arc` between request handlers and the [`crate::FlushTask`].
pub struct CounterService {
    router: Arc<ShardRouter>,
    buffer: WriteBuffer,
    cache: ReadCache,
    config: CounterConfig,
    /// Serializes flush cycles (periodic, manual, shutdown).
    flush_gate: Mutex<()>,
}

impl CounterService {
    pub fn new(router: Arc<ShardRouter>, config: CounterConfig) -> Self {
        Self {
            router,
            buffer: WriteBuffer::new(),
            cache: ReadCache::new(config.cache_ttl),
            config,
            flush_gate: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &CounterConfig {
        &self.config
    }

    pub fn router(&self) -> &Arc<ShardRouter> {
        &self.router
    }

    /// Record one visit. Returns the page's buffered (not yet durable) count.
    pub fn increment_visit(&self, page_id: &str) -> i64 {
        let buffered = self.buffer.add(page_id, 1);
        tracing::trace!(page_id, buffered, "Visit buffered");
        buffered
    }

    /// Visits for `page_id`: best known stored value plus buffered delta.
    pub async fn get_visit_count(&self, page_id: &str) -> VisitCount {
        if let Some(stored) = self.cache.get_fresh(page_id, Instant::now()) {
            metrics::counter!("visit_counter_cache_hits_total").increment(1);
            let visits = stored.saturating_add(self.buffer.get(page_id));
            tracing::trace!(page_id, stored, visits, "Served from cache");
            return VisitCount::in_memory(visits);
        }
        metrics::counter!("visit_counter_cache_misses_total").increment(1);

        let issued_at = Instant::now();
        let fetched = tokio::time::timeout(self.config.request_timeout, self.router.get(page_id)).await;
        match fetched {
            Ok(Ok(reply)) => {
                let stored = reply.value.unwrap_or(0);
                self.cache.store(page_id, stored, issued_at);
                let visits = stored.saturating_add(self.buffer.get(page_id));
                tracing::debug!(page_id, shard = %reply.shard, stored, visits, "Served from shard");
                VisitCount::from_shard(visits, reply.shard)
            }
            Ok(Err(e)) => {
                metrics::counter!("visit_counter_degraded_reads_total").increment(1);
                tracing::warn!(page_id, error = %e, "Visit count read failed, serving degraded response");
                VisitCount::degraded()
            }
            Err(_) => {
                metrics::counter!("visit_counter_degraded_reads_total").increment(1);
                tracing::warn!(
                    page_id,
                    timeout_ms = self.config.request_timeout.as_millis() as u64,
                    "Visit count read timed out, serving degraded response"
                );
                VisitCount::degraded()
            }
        }
    }

    /// Write every buffered delta to its shard.
    pub async fn flush(&self) -> FlushReport {
        let _gate = self.flush_gate.lock().await;

        let batch = self.buffer.drain();
        if batch.is_empty() {
            return FlushReport::default();
        }
        tracing::debug!(keys = batch.len(), "Flushing buffered visits");

        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_flushes.max(1)));
        let timeout = self.config.flush_timeout;
        let mut tasks = JoinSet::new();

        for (key, delta) in batch {
            let router = Arc::clone(&self.router);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                // The semaphore is never closed.
                let _permit = permits.acquire_owned().await.ok();
                let issued_at = Instant::now();
                let result = match tokio::time::timeout(timeout, router.increment(&key, delta)).await {
                    Ok(Ok(reply)) => Ok(reply.value),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(_) => Err(format!("timed out after {timeout:?}")),
                };
                KeyFlush {
                    key,
                    delta,
                    issued_at,
                    result,
                }
            });
        }

        let mut report = FlushReport::default();
        let mut requeue = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let flushed = match joined {
                Ok(flushed) => flushed,
                Err(e) => {
                    // Key and delta went down with the task.
                    tracing::error!(error = %e, "Flush task aborted");
                    report.failed_keys += 1;
                    continue;
                }
            };

            match flushed.result {
                Ok(stored) => {
                    self.cache.refresh(&flushed.key, stored, flushed.issued_at);
                    report.flushed_keys += 1;
                    report.flushed_total += flushed.delta;
                }
                Err(reason) => {
                    report.failed_keys += 1;
                    match self.config.on_flush_failure {
                        FlushFailurePolicy::Drop => {
                            report.dropped_total += flushed.delta;
                            tracing::warn!(
                                key = %flushed.key,
                                delta = flushed.delta,
                                %reason,
                                "Flush failed, dropping buffered visits"
                            );
                        }
                        FlushFailurePolicy::Requeue => {
                            report.requeued_total += flushed.delta;
                            tracing::warn!(
                                key = %flushed.key,
                                delta = flushed.delta,
                                %reason,
                                "Flush failed, requeueing buffered visits"
                            );
                            requeue.push((flushed.key, flushed.delta));
                        }
                    }
                }
            }
        }

        if !requeue.is_empty() {
            self.buffer.merge(requeue);
        }

        metrics::counter!("visit_counter_flushed_total").increment(report.flushed_total.max(0) as u64);
        if report.failed_keys > 0 {
            metrics::counter!("visit_counter_flush_failures_total").increment(report.failed_keys as u64);
        }
        tracing::info!(
            flushed_keys = report.flushed_keys,
            flushed_total = report.flushed_total,
            failed_keys = report.failed_keys,
            dropped_total = report.dropped_total,
            requeued_total = report.requeued_total,
            "Flush complete"
        );
        report
    }

    /// Drop cache entries past their TTL. Returns how many were removed.
    pub fn purge_stale_cache(&self) -> usize {
        self.cache.purge_stale(Instant::now())
    }

    /// Buffered (unflushed) delta for `page_id`.
    pub fn buffered(&self, page_id: &str) -> i64 {
        self.buffer.get(page_id)
    }

    /// Total buffered visits across all pages.
    pub fn pending_visits(&self) -> i64 {
        self.buffer.pending_total()
    }

    pub fn cached_pages(&self) -> usize {
        self.cache.len()
    }
}

impl std::fmt::Debug for CounterService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CounterService")
            .field("router", &self.router)
            .field("buffered_keys", &self.buffer.len())
            .field("cached_keys", &self.cache.len())
            .field("config", &self.config)
            .finish()
    }
}
