//! Shard identifiers.
//!
//! A shard is one physical backing-store node. On the ring it is known only by
//! its identifier, which is the address used to connect to it. Connections and
//! other heavy state live in the `sharding` crate.

use std::borrow::Borrow;
use std::fmt;

/// Identifier of a physical shard (its connection string).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ShardId(String);

impl ShardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key hashed to place virtual node `index` of this shard.
    pub fn vnode_key(&self, index: usize) -> String {
        format!("{}#{}", self.0, index)
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShardId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ShardId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ShardId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ShardId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vnode_key_format() {
        let shard = ShardId::new("redis://10.0.0.1:6379");
        assert_eq!(shard.vnode_key(0), "redis://10.0.0.1:6379#0");
        assert_eq!(shard.vnode_key(42), "redis://10.0.0.1:6379#42");
    }

    #[test]
    fn test_display_is_raw_id() {
        assert_eq!(ShardId::from("shard-a").to_string(), "shard-a");
    }
}
