//! Process configuration, read once at startup from flags or environment.

use clap::Parser;
use counter::{CounterConfig, FlushFailurePolicy};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Parser, Debug, Clone)]
#[command(name = "visit-counter")]
#[command(about = "Sharded page-visit counter with write buffering and a read cache")]
pub struct ServerConfig {
    /// Comma-separated shard addresses (redis://host:port or memory://name).
    #[arg(
        long,
        env = "REDIS_NODES",
        value_delimiter = ',',
        default_value = "redis://127.0.0.1:6379"
    )]
    pub shards: Vec<String>,

    /// Virtual nodes placed on the ring per shard.
    #[arg(long, env = "VIRTUAL_NODES", default_value_t = 100)]
    pub virtual_nodes: usize,

    #[arg(long, env = "CACHE_TTL_SECS", default_value_t = 5)]
    pub cache_ttl_secs: u64,

    #[arg(long, env = "FLUSH_INTERVAL_SECS", default_value_t = 30)]
    pub flush_interval_secs: u64,

    /// Upper bound on a read's shard round-trip.
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value_t = 2000)]
    pub request_timeout_ms: u64,

    /// Upper bound on each key's write during a flush.
    #[arg(long, env = "FLUSH_TIMEOUT_MS", default_value_t = 5000)]
    pub flush_timeout_ms: u64,

    /// Put visits from failed flushes back into the buffer instead of dropping them.
    #[arg(long, env = "REQUEUE_FAILED_FLUSHES")]
    pub requeue_failed_flushes: bool,

    #[arg(long = "listen", env = "LISTEN_ADDR", default_value = "0.0.0.0:8000")]
    pub listen: SocketAddr,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: tracing::Level,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();
        if self.virtual_nodes == 0 {
            problems.push("virtual_nodes must be at least 1");
        }
        if self.cache_ttl_secs == 0 {
            problems.push("cache_ttl_secs must be at least 1");
        }
        if self.flush_interval_secs == 0 {
            problems.push("flush_interval_secs must be at least 1");
        }
        if self.request_timeout_ms == 0 {
            problems.push("request_timeout_ms must be at least 1");
        }
        if self.flush_timeout_ms == 0 {
            problems.push("flush_timeout_ms must be at least 1");
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems.join("; ")))
        }
    }

    pub fn counter_config(&self) -> CounterConfig {
        CounterConfig {
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            flush_interval: Duration::from_secs(self.flush_interval_secs),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            flush_timeout: Duration::from_millis(self.flush_timeout_ms),
            on_flush_failure: if self.requeue_failed_flushes {
                FlushFailurePolicy::Requeue
            } else {
                FlushFailurePolicy::Drop
            },
            ..CounterConfig::default()
        }
    }
}
