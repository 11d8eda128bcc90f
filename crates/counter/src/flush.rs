//! Periodic background flush.

use crate::service::{CounterService, FlushReport};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Handle to the task that flushes a [`CounterService`] every
/// `flush_interval`.
///
/// The first flush runs one interval after spawning. If a flush takes longer
/// than the interval, the next one is delayed rather than bunched up.
/// [`FlushTask::shutdown`] stops the loop and runs one final flush; dropping
/// the handle does the same in the background.
pub struct FlushTask {
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<FlushReport>,
}

impl FlushTask {
    pub fn spawn(service: Arc<CounterService>) -> Self {
        let period = service.config().flush_interval.max(Duration::from_millis(1));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::debug!(period_ms = period.as_millis() as u64, "Flush task started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        service.flush().await;
                        let purged = service.purge_stale_cache();
                        if purged > 0 {
                            tracing::trace!(purged, "Purged stale cache entries");
                        }
                    }
                    // Fires on explicit shutdown and when the handle is dropped.
                    _ = &mut shutdown_rx => break,
                }
            }

            let report = service.flush().await;
            tracing::info!(
                flushed_total = report.flushed_total,
                failed_keys = report.failed_keys,
                "Flush task stopped after final flush"
            );
            report
        });

        Self {
            shutdown_tx,
            handle,
        }
    }

    /// Stop the periodic loop and wait for the final flush.
    ///
    /// Returns the final flush's report, or `None` if the task died.
    pub async fn shutdown(self) -> Option<FlushReport> {
        let FlushTask {
            shutdown_tx,
            handle,
        } = self;
        // Err means the task already exited.
        let _ = shutdown_tx.send(());
        match handle.await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::error!(error = %e, "Flush task failed");
                None
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
