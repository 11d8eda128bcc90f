//! XXH3-128 ring tokens.

use std::fmt;
use xxhash_rust::xxh3::xxh3_128;

/// Position on the ring, produced by XXH3-128.
///
/// 128 bits keeps collisions between virtual nodes practically impossible even
/// for large rings. The hash is not cryptographic; it only needs to be uniform
/// and identical across processes for the same input.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct RingToken(pub u128);

impl RingToken {
    /// Minimum token value (start of ring).
    pub const MIN: RingToken = RingToken(0);
    /// Maximum token value (end of ring).
    pub const MAX: RingToken = RingToken(u128::MAX);

    /// Creates a token from a byte slice.
    #[inline]
    pub fn from_bytes(data: &[u8]) -> Self {
        RingToken(xxh3_128(data))
    }

    /// Creates a token from a string key.
    #[inline]
    pub fn from_key(key: &str) -> Self {
        Self::from_bytes(key.as_bytes())
    }
}

impl fmt::Display for RingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}
