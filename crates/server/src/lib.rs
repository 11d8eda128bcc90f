//! Visit counter server.
//!
//! Wires configuration, shard routing, the counter service with its flush
//! task, and the HTTP routes into one process.

pub mod config;
pub mod http;

pub use config::{ConfigError, ServerConfig};

use anyhow::{Context, Result};
use counter::{CounterService, FlushTask};
use sharding::ShardRouter;
use std::sync::Arc;

pub async fn run(config: ServerConfig) -> Result<()> {
    config.validate()?;
    tracing::info!(operation = "startup", message = "visit-counter starting");
    tracing::debug!(config = ?config, "Configuration loaded");

    let router = ShardRouter::connect(&config.shards, config.virtual_nodes)
        .context("Failed to build shard router")?;
    let service = Arc::new(CounterService::new(Arc::new(router), config.counter_config()));
    let flush_task = FlushTask::spawn(Arc::clone(&service));

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;
    tracing::info!(listen = %config.listen, shards = config.shards.len(), "Listening");

    let served = axum::serve(listener, http::routes(Arc::clone(&service)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed");

    // Flush whatever is still buffered, even if serving failed.
    if let Some(report) = flush_task.shutdown().await {
        tracing::info!(
            flushed_total = report.flushed_total,
            dropped_total = report.dropped_total,
            "Shutdown flush finished"
        );
    }
    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
