//! Snapshot round-trip (§3, §4.9): the serializable projection of a shard
//! descriptor used by Raft snapshots, independent of live runtime handles.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::wal::Wal;

use super::{ReplicaSet, Shard, ShardType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewShardData {
    pub id: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub shard_type: ShardType,
    pub server_ids: Vec<u32>,
    pub duration_is_split: bool,
}

impl Shard {
    /// Project this descriptor into its snapshot form. Runtime handles
    /// (WAL, local store, cluster-server handles) are dropped; only their
    /// ids survive.
    pub fn to_new_shard_data(&self) -> NewShardData {
        NewShardData {
            id: self.id(),
            start_time: self.start_time(),
            end_time: self.end_time(),
            shard_type: self.shard_type(),
            server_ids: self.server_ids().to_vec(),
            duration_is_split: self.duration_is_split(),
        }
    }

    /// Reconstruct a descriptor from a snapshot. The result has
    /// `is_local() == false` until `set_servers`/`set_local_store` reattach
    /// live handles; `server_ids` is already populated from the snapshot.
    pub fn from_new_shard_data(data: NewShardData, wal: Arc<dyn Wal>) -> Self {
        Shard {
            id: data.id,
            start_time: data.start_time,
            end_time: data.end_time,
            start_micro: data.start_time.timestamp_micros(),
            end_micro: data.end_time.timestamp_micros(),
            shard_type: data.shard_type,
            duration_seconds: (data.end_time - data.start_time).num_seconds(),
            duration_is_split: data.duration_is_split,
            wal,
            replicas: ReplicaSet::from_ids(data.server_ids),
            engines: self_engines(),
        }
    }
}

fn self_engines() -> Arc<dyn crate::processor::ProcessorFactory> {
    Arc::new(crate::processor::DefaultEngines)
}

#[cfg(test)]
mod test {
    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::test_support::test_wal;

    #[test]
    fn test_round_trip_preserves_identity_window_type_and_servers() {
        let start = Utc::now();
        let end = start + ChronoDuration::hours(1);
        let mut shard = Shard::new_shard(9, start, end, ShardType::LongTerm, true, test_wal());
        shard.replicas = ReplicaSet::from_ids(vec![1, 2, 3]);

        let data = shard.to_new_shard_data();
        assert_eq!(data.id, 9);
        assert_eq!(data.server_ids, vec![1, 2, 3]);
        assert_eq!(data.shard_type, ShardType::LongTerm);
        assert!(data.duration_is_split);

        let restored = Shard::from_new_shard_data(data, test_wal());
        assert_eq!(restored.id(), shard.id());
        assert_eq!(restored.start_time(), shard.start_time());
        assert_eq!(restored.end_time(), shard.end_time());
        assert_eq!(restored.shard_type(), shard.shard_type());
        assert_eq!(restored.server_ids(), shard.server_ids());
        assert_eq!(restored.duration_is_split(), shard.duration_is_split());
        assert!(!restored.is_local(), "snapshot restore carries no live handles");
    }
}
