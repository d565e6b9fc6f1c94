//! Configuration surface this layer recognizes (§6). Parses the
//! `[sharding]` and `[cluster]` tables out of the cluster's TOML file;
//! everything else in that file belongs to other front-ends.

use std::fs::read_to_string;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ShardError;

/// `[sharding.short-term]` / `[sharding.long-term]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
pub struct ShardDurationConfig {
    /// Width of a shard's time window, in seconds.
    pub duration: u64,
    /// Number of shards covering the same interval. `split > 1` implies
    /// `duration_is_split`.
    pub split: u32,
    /// Series matching this pattern are placed randomly among split
    /// shards; consumed by the coordinator, not this layer.
    pub split_random: Option<String>,
}

impl ShardDurationConfig {
    pub fn duration_is_split(&self) -> bool {
        self.split > 1
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration)
    }
}

impl Default for ShardDurationConfig {
    fn default() -> Self {
        Self {
            duration: 7 * 24 * 3600,
            split: 1,
            split_random: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
pub struct ShardingSection {
    pub replication_factor: u32,
    pub short_term: ShardDurationConfig,
    pub long_term: ShardDurationConfig,
}

impl Default for ShardingSection {
    fn default() -> Self {
        Self {
            replication_factor: 1,
            short_term: ShardDurationConfig {
                duration: 2 * 3600,
                ..ShardDurationConfig::default()
            },
            long_term: ShardDurationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClusterSection {
    /// Write timeout on replica connections, in milliseconds.
    pub protobuf_timeout: u64,
    /// Replica liveness interval feeding `ClusterServer::is_up`, in
    /// milliseconds.
    pub protobuf_heartbeat: u64,
    /// Per-server replica write buffer depth.
    pub write_buffer_size: usize,
    /// Minimum response-channel depth per shard.
    pub query_shard_buffer_size: usize,
}

impl Default for ClusterSection {
    fn default() -> Self {
        Self {
            protobuf_timeout: 5_000,
            protobuf_heartbeat: 1_000,
            write_buffer_size: 1_000,
            query_shard_buffer_size: 1_000,
        }
    }
}

impl ClusterSection {
    pub fn protobuf_timeout(&self) -> Duration {
        Duration::from_millis(self.protobuf_timeout)
    }

    pub fn protobuf_heartbeat(&self) -> Duration {
        Duration::from_millis(self.protobuf_heartbeat)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ShardingConfig {
    pub sharding: ShardingSection,
    pub cluster: ClusterSection,
}

impl ShardingConfig {
    /// Load from a TOML file on disk, falling back to documented defaults
    /// when the file doesn't exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ShardError> {
        let path = path.as_ref();
        match read_to_string(path) {
            Ok(contents) => {
                let config = toml::from_str(&contents)
                    .map_err(|err| ShardError::Config(err.to_string()))?;
                info!("loaded sharding config from \"{}\"", path.display());
                Ok(config)
            }
            Err(_) => {
                warn!(
                    "\"{}\" doesn't exist, using default sharding config",
                    path.display()
                );
                Ok(Self::default())
            }
        }
    }
}
