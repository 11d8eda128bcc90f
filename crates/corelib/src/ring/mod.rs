//! Consistent hash ring implementation.
//!
//! The ring manages virtual node positions and provides efficient lookup
//! operations for finding the shard responsible for a key.

pub mod builder;
pub mod ring;

pub use builder::RingBuilder;
pub use ring::HashRing;
