//! Error types for store access and routing.

use corelib::ShardId;
use thiserror::Error;

/// Failure of a single backing-store call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached or the call failed in transit.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The store answered, but the value is not an integer counter.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// The shard address cannot be used to build a store.
    #[error("Invalid store address: {0}")]
    InvalidAddress(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        match err.kind() {
            redis::ErrorKind::TypeError => StoreError::InvalidValue(err.to_string()),
            redis::ErrorKind::InvalidClientConfig => StoreError::InvalidAddress(err.to_string()),
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

/// Errors returned by [`crate::ShardRouter`].
///
/// Store failures carry the shard they happened on so callers can log and
/// report which node is misbehaving.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// No shards configured; fatal at startup.
    #[error("No shards available in the hash ring")]
    EmptyRing,

    #[error("Invalid shard: {0}")]
    InvalidShard(String),

    #[error("Virtual nodes per shard must be at least 1")]
    NoVirtualNodes,

    #[error("Invalid shard address: {0}")]
    InvalidAddress(String),

    #[error("Shard already registered: {0}")]
    DuplicateShard(ShardId),

    /// The ring resolved a shard that has no store (removed concurrently).
    #[error("No store registered for shard {0}")]
    UnknownShard(ShardId),

    #[error("Store unavailable on shard {shard}: {reason}")]
    StoreUnavailable { shard: ShardId, reason: String },

    #[error("Invalid value on shard {shard}: {reason}")]
    InvalidValue { shard: ShardId, reason: String },
}

impl RouterError {
    pub(crate) fn from_store(shard: ShardId, err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(reason) => RouterError::StoreUnavailable { shard, reason },
            StoreError::InvalidValue(reason) => RouterError::InvalidValue { shard, reason },
            StoreError::InvalidAddress(reason) => RouterError::InvalidAddress(reason),
        }
    }

    /// True if the failure is transient (the shard may answer later).
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            RouterError::StoreUnavailable { .. } | RouterError::UnknownShard(_)
        )
    }

    /// Shard the failure happened on, if it is tied to one.
    pub fn shard(&self) -> Option<&ShardId> {
        match self {
            RouterError::StoreUnavailable { shard, .. } | RouterError::InvalidValue { shard, .. } => {
                Some(shard)
            }
            RouterError::UnknownShard(shard) | RouterError::DuplicateShard(shard) => Some(shard),
            _ => None,
        }
    }
}

impl From<corelib::Error> for RouterError {
    fn from(err: corelib::Error) -> Self {
        match err {
            corelib::Error::EmptyRing => RouterError::EmptyRing,
            corelib::Error::InvalidShard(msg) => RouterError::InvalidShard(msg),
            corelib::Error::NoVirtualNodes => RouterError::NoVirtualNodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_carries_shard() {
        let err = RouterError::from_store(
            ShardId::new("redis://a:6379"),
            StoreError::Unavailable("connection refused".into()),
        );
        assert!(err.is_unavailable());
        assert_eq!(err.shard().map(|s| s.as_str()), Some("redis://a:6379"));
        assert_eq!(
            err.to_string(),
            "Store unavailable on shard redis://a:6379: connection refused"
        );
    }

    #[test]
    fn test_invalid_value_is_not_transient() {
        let err = RouterError::from_store(ShardId::new("s"), StoreError::InvalidValue("x".into()));
        assert!(!err.is_unavailable());
    }

    #[test]
    fn test_ring_errors_convert() {
        assert_eq!(RouterError::from(corelib::Error::EmptyRing), RouterError::EmptyRing);
    }

    #[test]
    fn test_redis_type_error_maps_to_invalid_value() {
        let err: StoreError =
            redis::RedisError::from((redis::ErrorKind::TypeError, "not an integer")).into();
        assert!(matches!(err, StoreError::InvalidValue(_)));

        let err: StoreError =
            redis::RedisError::from((redis::ErrorKind::IoError, "broken pipe")).into();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
