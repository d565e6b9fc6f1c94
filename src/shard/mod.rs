//! The shard: identity, time window, replica set, and the write/query/
//! destructive dispatch built on top of them.

pub mod buffer;
pub mod destructive;
pub mod locality;
pub mod ordering;
pub mod query;
pub mod replica_set;
pub mod snapshot;
pub mod write;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::processor::{DefaultEngines, ProcessorFactory};
use crate::wal::Wal;

pub use ordering::{sort_asc, sort_desc, TimeOrdered};
pub use replica_set::ReplicaSet;
pub use snapshot::NewShardData;

/// Two shard types with independently configured duration and split
/// knobs; series are routed to one by the first-letter rule, which is a
/// coordinator policy this layer never inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShardType {
    ShortTerm,
    LongTerm,
}

/// A half-open time interval `[start, end)` of points, replicated on one
/// or more servers.
///
/// Descriptors are created by the coordinator and mutated only by
/// [`Shard::set_servers`]/[`Shard::set_local_store`] during
/// initialization; thereafter every field below is read-only for the
/// shard's lifetime.
pub struct Shard {
    id: u32,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    start_micro: i64,
    end_micro: i64,
    shard_type: ShardType,
    duration_seconds: i64,
    duration_is_split: bool,
    pub(crate) wal: Arc<dyn Wal>,
    pub(crate) replicas: ReplicaSet,
    pub(crate) engines: Arc<dyn ProcessorFactory>,
}

impl Shard {
    /// Construct a new descriptor. `server_ids` is empty and `is_local`
    /// is `false` until `set_servers`/`set_local_store` run.
    pub fn new_shard(
        id: u32,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        shard_type: ShardType,
        duration_is_split: bool,
        wal: Arc<dyn Wal>,
    ) -> Self {
        assert!(start_time < end_time, "shard start must precede end");

        Self {
            id,
            start_time,
            end_time,
            start_micro: start_time.timestamp_micros(),
            end_micro: end_time.timestamp_micros(),
            shard_type,
            duration_seconds: (end_time - start_time).num_seconds(),
            duration_is_split,
            wal,
            replicas: ReplicaSet::default(),
            engines: Arc::new(DefaultEngines),
        }
    }

    /// Override the processor factory used for query dispatch. Exists for
    /// callers (and tests) that supply real aggregation/query-parser
    /// engines instead of the crate's own passthrough fallback.
    pub fn with_engines(mut self, engines: Arc<dyn ProcessorFactory>) -> Self {
        self.engines = engines;
        self
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn start_micro(&self) -> i64 {
        self.start_micro
    }

    pub fn end_micro(&self) -> i64 {
        self.end_micro
    }

    pub fn contains_microsecond(&self, t: i64) -> bool {
        self.start_micro <= t && t < self.end_micro
    }

    pub fn shard_type(&self) -> ShardType {
        self.shard_type
    }

    pub fn duration_seconds(&self) -> i64 {
        self.duration_seconds
    }

    pub fn duration_is_split(&self) -> bool {
        self.duration_is_split
    }

    /// Whether this shard has a local store attached.
    pub fn is_local(&self) -> bool {
        self.replicas.is_local()
    }

    pub fn server_ids(&self) -> &[u32] {
        self.replicas.server_ids()
    }
}

impl std::fmt::Debug for Shard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shard")
            .field("id", &self.id)
            .field("start_time", &self.start_time)
            .field("end_time", &self.end_time)
            .field("shard_type", &self.shard_type)
            .field("duration_is_split", &self.duration_is_split)
            .field("is_local", &self.is_local())
            .field("server_ids", &self.server_ids())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_support::test_wal;
    use chrono::Duration as ChronoDuration;

    fn shard(start: DateTime<Utc>, end: DateTime<Utc>) -> Shard {
        Shard::new_shard(1, start, end, ShardType::ShortTerm, false, test_wal())
    }

    #[test]
    fn test_contains_microsecond() {
        let start = Utc::now();
        let end = start + ChronoDuration::hours(1);
        let s = shard(start, end);

        assert!(s.contains_microsecond(s.start_micro()));
        assert!(s.contains_microsecond(s.start_micro() + 1));
        assert!(!s.contains_microsecond(s.end_micro()));
        assert!(!s.contains_microsecond(s.start_micro() - 1));
    }

    #[test]
    #[should_panic(expected = "shard start must precede end")]
    fn test_rejects_inverted_window() {
        let start = Utc::now();
        let end = start - ChronoDuration::hours(1);
        shard(start, end);
    }

    #[test]
    fn test_duration_seconds_matches_window() {
        let start = Utc::now();
        let end = start + ChronoDuration::seconds(3_600);
        let s = shard(start, end);
        assert_eq!(s.duration_seconds(), 3_600);
    }

    #[test]
    fn test_not_local_until_attached() {
        let start = Utc::now();
        let end = start + ChronoDuration::hours(1);
        let s = shard(start, end);
        assert!(!s.is_local());
        assert!(s.server_ids().is_empty());
    }
}
