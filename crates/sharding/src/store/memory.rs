//! In-process counter store.
//!
//! Behaves like a single Redis node for `INCRBY` / `GET`, and additionally
//! records every call and can be switched into failure or slow modes. Used by
//! the test suites and by `memory://` shard addresses for local runs.

use crate::error::StoreError;
use crate::store::CounterStore;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// One call received by a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    IncrBy { key: String, amount: i64 },
    Get { key: String },
}

#[derive(Debug)]
pub struct MemoryStore {
    name: String,
    values: DashMap<String, i64>,
    calls: Mutex<Vec<StoreCall>>,
    unavailable: AtomicBool,
    latency: Mutex<Option<Duration>>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: DashMap::new(),
            calls: Mutex::new(Vec::new()),
            unavailable: AtomicBool::new(false),
            latency: Mutex::new(None),
        }
    }

    pub fn label(&self) -> &str {
        &self.name
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every subsequent call by `latency` (uses tokio time).
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    /// Stored value of `key`, bypassing call recording.
    pub fn value(&self, key: &str) -> Option<i64> {
        self.values.get(key).map(|v| *v)
    }

    /// Seed a stored value, bypassing call recording.
    pub fn set_value(&self, key: impl Into<String>, value: i64) {
        self.values.insert(key.into(), value);
    }

    /// Every call received so far, in arrival order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    /// `(key, amount)` of every `INCRBY` received so far.
    pub fn incr_calls(&self) -> Vec<(String, i64)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                StoreCall::IncrBy { key, amount } => Some((key.clone(), *amount)),
                StoreCall::Get { .. } => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    async fn enter(&self, call: StoreCall) -> Result<(), StoreError> {
        self.calls.lock().push(call);

        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{} is unavailable", self.name)));
        }
        Ok(())
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn incr_by(&self, key: &str, amount: i64) -> Result<i64, StoreError> {
        self.enter(StoreCall::IncrBy {
            key: key.to_string(),
            amount,
        })
        .await?;

        let mut entry = self.values.entry(key.to_string()).or_insert(0);
        let next = entry
            .checked_add(amount)
            .ok_or_else(|| StoreError::InvalidValue(format!("increment would overflow {key}")))?;
        *entry = next;
        Ok(next)
    }

    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        self.enter(StoreCall::Get {
            key: key.to_string(),
        })
        .await?;
        Ok(self.value(key))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_incr_creates_and_accumulates() {
        let store = MemoryStore::new("m");
        assert_eq!(store.get("k").await.unwrap(), None);
        assert_eq!(store.incr_by("k", 3).await.unwrap(), 3);
        assert_eq!(store.incr_by("k", 2).await.unwrap(), 5);
        assert_eq!(store.get("k").await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn test_calls_recorded_in_order() {
        let store = MemoryStore::new("m");
        store.incr_by("a", 1).await.unwrap();
        store.get("b").await.unwrap();

        assert_eq!(
            store.calls(),
            vec![
                StoreCall::IncrBy {
                    key: "a".into(),
                    amount: 1
                },
                StoreCall::Get { key: "b".into() },
            ]
        );
        assert_eq!(store.incr_calls(), vec![("a".to_string(), 1)]);
    }

    #[tokio::test]
    async fn test_unavailable_fails_without_mutating() {
        let store = MemoryStore::new("m");
        store.set_unavailable(true);
        assert!(matches!(
            store.incr_by("k", 1).await,
            Err(StoreError::Unavailable(_))
        ));
        assert_eq!(store.value("k"), None);

        store.set_unavailable(false);
        assert_eq!(store.incr_by("k", 1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_overflow_is_invalid_value() {
        let store = MemoryStore::new("m");
        store.set_value("k", i64::MAX);
        assert!(matches!(
            store.incr_by("k", 1).await,
            Err(StoreError::InvalidValue(_))
        ));
        assert_eq!(store.value("k"), Some(i64::MAX));
    }
}
