//! Comprehensive tests for the hash ring implementation.
//!
//! # Test Strategy
//!
//! 1. **Basic functionality**: Empty ring, add/route, remove
//! 2. **Multiple shards**: Distribution, determinism
//! 3. **Edge cases**: Single shard, add/remove/add
//! 4. **Properties**: Determinism, coverage, minimal disruption (proptest)

use corelib::{Error, HashRing, RingBuilder, ShardId};
use proptest::prelude::*;
use std::collections::HashMap;

fn shard_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("redis://10.0.0.{}:6379", i + 1)).collect()
}

// ============================================================================
// Basic Functionality Tests
// ============================================================================

#[test]
fn test_empty_ring_route() {
    let ring = HashRing::with_vnodes(100);
    assert_eq!(ring.route("key1"), Err(Error::EmptyRing));
    assert_eq!(ring.shard_count(), 0);
    assert_eq!(ring.entry_count(), 0);
}

#[test]
fn test_add_shard_and_route() {
    let ring = HashRing::with_vnodes(4);
    ring.add_shard("shard-1").unwrap();

    assert_eq!(ring.shard_count(), 1);
    assert_eq!(ring.entry_count(), 4);
    assert!(ring.contains("shard-1"));
    assert_eq!(ring.route("test-key").unwrap(), ShardId::new("shard-1"));
}

#[test]
fn test_remove_shard() {
    let ring = HashRing::new(["shard-1", "shard-2"], 4).unwrap();
    assert_eq!(ring.entry_count(), 8);

    assert!(ring.remove_shard("shard-1"), "Should remove a present shard");
    assert_eq!(ring.shard_count(), 1);
    assert_eq!(ring.entry_count(), 4);
    assert!(!ring.contains("shard-1"));

    // Every key now lands on the survivor
    for i in 0..100 {
        assert_eq!(ring.route(&format!("k{i}")).unwrap(), ShardId::new("shard-2"));
    }

    assert!(!ring.remove_shard("shard-999"), "Absent shard is a no-op");
}

#[test]
fn test_remove_last_shard_empties_ring() {
    let ring = HashRing::new(["only"], 10).unwrap();
    assert!(ring.remove_shard("only"));
    assert_eq!(ring.route("anything"), Err(Error::EmptyRing));
}

// ============================================================================
// Multiple Shards Tests
// ============================================================================

#[test]
fn test_distribution_across_shards() {
    let shards = shard_names(4);
    let ring = HashRing::new(shards.clone(), 100).unwrap();

    let mut counts: HashMap<ShardId, usize> = HashMap::new();
    for i in 0..10_000 {
        *counts.entry(ring.route(&format!("page-{i}")).unwrap()).or_default() += 1;
    }

    assert_eq!(counts.len(), 4, "Every shard should own some keys");
    for (shard, count) in counts {
        // Perfect split is 2500; vnodes keep us well inside +-50%
        assert!(
            (1250..3750).contains(&count),
            "Shard {shard} got {count} keys, distribution too skewed"
        );
    }
}

#[test]
fn test_shards_in_addition_order() {
    let ring = RingBuilder::new()
        .with_vnodes(2)
        .add_shard("c")
        .add_shard("a")
        .add_shard("b")
        .build()
        .unwrap();

    let ids: Vec<String> = ring.shards().iter().map(|s| s.to_string()).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
}

#[test]
fn test_builder_defaults_to_100_vnodes() {
    let ring = RingBuilder::new().add_shard("a").add_shard("b").build().unwrap();
    assert_eq!(ring.vnodes_per_shard(), 100);
    assert_eq!(ring.entry_count(), 200);
}

// ============================================================================
// Edge Cases
// ============================================================================

#[test]
fn test_single_shard() {
    let ring = HashRing::new(["solo"], 4).unwrap();
    for key in ["key1", "key2", "", "very-long-key-name-with-unicode-ümlaut"] {
        assert_eq!(ring.route(key).unwrap(), ShardId::new("solo"));
    }
}

#[test]
fn test_add_remove_add() {
    let ring = HashRing::with_vnodes(4);
    ring.add_shard("shard-1").unwrap();
    assert!(ring.remove_shard("shard-1"));
    assert_eq!(ring.shard_count(), 0);

    ring.add_shard("shard-1").unwrap();
    assert_eq!(ring.shard_count(), 1);
    assert_eq!(ring.entry_count(), 4);
    assert!(ring.route("key").is_ok());
}

#[test]
fn test_readding_duplicates_entries() {
    // Re-adding is not idempotent; callers must not do it.
    let ring = HashRing::new(["shard-1"], 4).unwrap();
    ring.add_shard("shard-1").unwrap();
    assert_eq!(ring.entry_count(), 8);
    assert_eq!(ring.shard_count(), 1);
}

#[test]
fn test_adding_shard_only_moves_keys_to_new_shard() {
    let ring = HashRing::new(shard_names(3), 100).unwrap();
    let keys: Vec<String> = (0..2_000).map(|i| format!("page-{i}")).collect();
    let before: Vec<ShardId> = keys.iter().map(|k| ring.route(k).unwrap()).collect();

    ring.add_shard("redis://10.0.0.99:6379").unwrap();

    for (key, old) in keys.iter().zip(before) {
        let new = ring.route(key).unwrap();
        assert!(
            new == old || new.as_str() == "redis://10.0.0.99:6379",
            "Key {key} moved between two pre-existing shards"
        );
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Property: same inputs build rings that agree on every key
    #[test]
    fn prop_deterministic_across_instances(
        shard_count in 1usize..8,
        vnodes in 1usize..64,
        keys in prop::collection::vec(".{0,32}", 1..50)
    ) {
        let shards = shard_names(shard_count);
        let ring1 = HashRing::new(shards.clone(), vnodes).unwrap();
        let ring2 = HashRing::new(shards, vnodes).unwrap();

        for key in &keys {
            let first = ring1.route(key).unwrap();
            prop_assert_eq!(&first, &ring1.route(key).unwrap());
            prop_assert_eq!(&first, &ring2.route(key).unwrap());
        }
    }

    /// Property: every key resolves to a registered shard
    #[test]
    fn prop_route_returns_registered_shard(
        shard_count in 1usize..8,
        vnodes in 1usize..32,
        key in ".{0,64}"
    ) {
        let ring = HashRing::new(shard_names(shard_count), vnodes).unwrap();
        let shard = ring.route(&key).unwrap();
        prop_assert!(ring.contains(shard.as_str()));
    }

    /// Property: removing a shard only moves keys that shard owned
    #[test]
    fn prop_minimal_disruption_on_remove(
        shard_count in 2usize..8,
        removed in 0usize..8,
        keys in prop::collection::vec("[a-z0-9]{1,16}", 1..100)
    ) {
        let shards = shard_names(shard_count);
        let victim = shards[removed % shard_count].clone();
        let ring = HashRing::new(shards, 32).unwrap();

        let before: Vec<ShardId> = keys.iter().map(|k| ring.route(k).unwrap()).collect();
        prop_assert!(ring.remove_shard(&victim));

        for (key, old) in keys.iter().zip(before) {
            let new = ring.route(key).unwrap();
            if old.as_str() != victim {
                prop_assert_eq!(new, old);
            } else {
                prop_assert_ne!(new.as_str(), victim.as_str());
            }
        }
    }
}
