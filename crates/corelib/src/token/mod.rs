//! Ring token types.
//!
//! A token is a position on the ring. Shard virtual nodes and lookup keys are
//! both hashed into the same token space so they can be compared directly.

pub mod xxh3;

pub use xxh3::RingToken;
