//! Shard-aware routing of counter operations.
//!
//! # Algorithm
//!
//! 1. Resolve the owning shard with [`HashRing::route`]
//! 2. Look up that shard's store
//! 3. Issue exactly one store call; no retry, no fallback
//!
//! Failures are returned as [`RouterError`] with the shard attached. A dead
//! shard only fails the keys it owns; every other key keeps working.

use crate::error::RouterError;
use crate::store::{connect_store, CounterStore};
use corelib::{HashRing, ShardId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// A store answer together with the shard that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardReply<T> {
    pub shard: ShardId,
    pub value: T,
}

/// Routes counter keys to one of several backing-store shards.
///
/// Owns the ring and exactly one store per physical shard for its whole
/// lifetime. Shards can be added or removed at runtime; that changes where
/// future keys go but does not move data already written.
pub struct ShardRouter {
    ring: HashRing,
    stores: DashMap<ShardId, Arc<dyn CounterStore>>,
}

impl ShardRouter {
    /// Build stores for every address and a ring over the same addresses.
    ///
    /// Blank and repeated addresses are skipped. Connections are opened
    /// lazily by the stores themselves, so this does no network I/O.
    ///
    /// # Errors
    /// - [`RouterError::EmptyRing`] if no usable address remains
    /// - [`RouterError::InvalidAddress`] if an address has no supported scheme
    pub fn connect<I, S>(addresses: I, vnodes_per_shard: usize) -> Result<Self, RouterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut stores = Vec::new();
        for address in addresses {
            let address = address.as_ref().trim();
            if address.is_empty() {
                continue;
            }
            let store = connect_store(address)
                .map_err(|e| RouterError::from_store(ShardId::new(address), e))?;
            stores.push((ShardId::new(address), store));
        }
        Self::from_stores(stores, vnodes_per_shard)
    }

    /// Build a router over pre-built stores.
    pub fn from_stores(
        stores: Vec<(ShardId, Arc<dyn CounterStore>)>,
        vnodes_per_shard: usize,
    ) -> Result<Self, RouterError> {
        let router = Self {
            ring: HashRing::with_vnodes(vnodes_per_shard),
            stores: DashMap::new(),
        };

        for (shard, store) in stores {
            match router.add_shard(shard, store) {
                Ok(()) => {}
                Err(RouterError::DuplicateShard(shard)) => {
                    tracing::warn!(%shard, "Ignoring duplicate shard address");
                }
                Err(e) => return Err(e),
            }
        }

        if router.ring.is_empty() {
            return Err(RouterError::EmptyRing);
        }

        tracing::info!(
            shards = router.ring.shard_count(),
            vnodes_per_shard,
            "Shard router ready"
        );
        Ok(router)
    }

    /// Register a new shard. Only keys routed after this call are affected.
    ///
    /// The store map entry stays locked while the ring is updated, so
    /// concurrent adds or removes of the same id are serialized.
    pub fn add_shard(&self, shard: ShardId, store: Arc<dyn CounterStore>) -> Result<(), RouterError> {
        match self.stores.entry(shard.clone()) {
            Entry::Occupied(_) => Err(RouterError::DuplicateShard(shard)),
            Entry::Vacant(vacant) => {
                self.ring.add_shard(shard.clone())?;
                vacant.insert(store);
                tracing::debug!(%shard, "Shard added to ring");
                Ok(())
            }
        }
    }

    /// Unregister a shard. Returns `false` if it was not registered.
    ///
    /// Keys it owned are re-routed to other shards; their stored values are
    /// not migrated.
    pub fn remove_shard(&self, shard: &str) -> bool {
        match self.stores.entry(ShardId::new(shard)) {
            Entry::Occupied(occupied) => {
                self.ring.remove_shard(shard);
                occupied.remove();
                tracing::debug!(%shard, "Shard removed from ring");
                true
            }
            Entry::Vacant(_) => false,
        }
    }

    /// Shard currently responsible for `key`.
    pub fn shard_for(&self, key: &str) -> Result<ShardId, RouterError> {
        Ok(self.ring.route(key)?)
    }

    pub fn shards(&self) -> Vec<ShardId> {
        self.ring.shards()
    }

    pub fn ring(&self) -> &HashRing {
        &self.ring
    }

    fn store_for(&self, key: &str) -> Result<(ShardId, Arc<dyn CounterStore>), RouterError> {
        let shard = self.shard_for(key)?;
        let store = self
            .stores
            .get(&shard)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| RouterError::UnknownShard(shard.clone()))?;
        Ok((shard, store))
    }

    /// `INCRBY key amount` on the owning shard; returns the new stored value.
    pub async fn increment(&self, key: &str, amount: i64) -> Result<ShardReply<i64>, RouterError> {
        let (shard, store) = self.store_for(key)?;
        match store.incr_by(key, amount).await {
            Ok(value) => Ok(ShardReply { shard, value }),
            Err(e) => {
                tracing::warn!(%shard, key, amount, error = %e, "Shard increment failed");
                Err(RouterError::from_store(shard, e))
            }
        }
    }

    /// `GET key` on the owning shard; `None` if the key was never written.
    pub async fn get(&self, key: &str) -> Result<ShardReply<Option<i64>>, RouterError> {
        let (shard, store) = self.store_for(key)?;
        match store.get(key).await {
            Ok(value) => Ok(ShardReply { shard, value }),
            Err(e) => {
                tracing::warn!(%shard, key, error = %e, "Shard get failed");
                Err(RouterError::from_store(shard, e))
            }
        }
    }
}

impl std::fmt::Debug for ShardRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardRouter")
            .field("shards", &self.ring.shards())
            .field("vnodes_per_shard", &self.ring.vnodes_per_shard())
            .finish()
    }
}
