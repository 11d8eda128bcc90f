//! Read results returned to API consumers.

use corelib::ShardId;
use serde::{Serialize, Serializer};
use std::fmt;

/// Where a visit count came from.
///
/// Serialized as `"in_memory"`, `"shard:<id>"` or `"error"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServedVia {
    /// Fresh cache entry plus buffered delta; no store round-trip.
    InMemory,
    /// Stored value fetched from this shard plus buffered delta.
    Shard(ShardId),
    /// The store could not be read. The count is not meaningful.
    Error,
}

impl fmt::Display for ServedVia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServedVia::InMemory => f.write_str("in_memory"),
            ServedVia::Shard(shard) => write!(f, "shard:{shard}"),
            ServedVia::Error => f.write_str("error"),
        }
    }
}

impl Serialize for ServedVia {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Visit count for one page.
///
/// `visits` is buffered delta + best known stored value, except when
/// `served_via` is [`ServedVia::Error`]: then `visits` is 0 and signals a
/// degraded service, not a real zero count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitCount {
    pub visits: i64,
    pub served_via: ServedVia,
}

impl VisitCount {
    pub fn in_memory(visits: i64) -> Self {
        Self {
            visits,
            served_via: ServedVia::InMemory,
        }
    }

    pub fn from_shard(visits: i64, shard: ShardId) -> Self {
        Self {
            visits,
            served_via: ServedVia::Shard(shard),
        }
    }

    /// The response used when the store could not be read.
    pub fn degraded() -> Self {
        Self {
            visits: 0,
            served_via: ServedVia::Error,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.served_via == ServedVia::Error
    }
}
