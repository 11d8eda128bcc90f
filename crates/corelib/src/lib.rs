//! Core library for consistent hashing implementation.
//!
//! This crate provides the fundamental abstractions for consistent hashing:
//! - 128-bit ring tokens
//! - Shard identifiers and virtual nodes
//! - The hash ring and its routing rule

pub mod error;
pub mod node;
pub mod ring;
pub mod token;
pub mod vnode;

pub use error::{Error, Result};
pub use node::ShardId;
pub use ring::{HashRing, RingBuilder};
pub use token::RingToken;
pub use vnode::{RingEntry, DEFAULT_VNODES_PER_SHARD};
