//! Redis-backed counter store.

use crate::error::StoreError;
use crate::store::CounterStore;
use async_trait::async_trait;
use parking_lot::Mutex;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

/// One Redis node acting as a shard.
///
/// Holds a single multiplexed connection, opened on first use. A node that is
/// down at startup therefore does not block the service; its calls fail with
/// [`StoreError::Unavailable`] until it comes back. A connection that breaks
/// is dropped and re-opened by the next call.
pub struct RedisStore {
    address: String,
    client: redis::Client,
    conn: Mutex<Option<MultiplexedConnection>>,
}

impl RedisStore {
    /// Parse the address. No network I/O happens here.
    pub fn open(address: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(address)
            .map_err(|e| StoreError::InvalidAddress(format!("{address}: {e}")))?;
        Ok(Self {
            address: address.to_string(),
            client,
            conn: Mutex::new(None),
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, StoreError> {
        let cached = self.conn.lock().clone();
        if let Some(conn) = cached {
            return Ok(conn);
        }

        let conn = self.client.get_multiplexed_async_connection().await?;
        tracing::debug!(shard = %self.address, "Connected to redis shard");
        *self.conn.lock() = Some(conn.clone());
        Ok(conn)
    }

    fn on_error(&self, err: redis::RedisError) -> StoreError {
        if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
            self.conn.lock().take();
        }
        err.into()
    }
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn incr_by(&self, key: &str, amount: i64) -> Result<i64, StoreError> {
        let mut conn = self.connection().await?;
        // INCRBY key amount
        conn.incr(key, amount).await.map_err(|e| self.on_error(e))
    }

    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let mut conn = self.connection().await?;
        // GET key
        conn.get(key).await.map_err(|e| self.on_error(e))
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_does_not_connect() {
        // Nothing listens on port 1; open must still succeed.
        assert!(RedisStore::open("redis://127.0.0.1:1").is_ok());
    }

    #[test]
    fn test_open_rejects_garbage() {
        assert!(matches!(
            RedisStore::open("not a url"),
            Err(StoreError::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_node_is_unavailable() {
        let store = RedisStore::open("redis://127.0.0.1:1").unwrap();
        assert!(matches!(
            store.get("page").await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
