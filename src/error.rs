//! Error taxonomy for the shard layer.
//!
//! Each external collaborator (WAL, local store, cluster transport) gets its
//! own small error enum; [`ShardError`] composes them at the seams where the
//! shard talks to more than one collaborator in a single operation.

use thiserror::Error;

/// Errors surfaced by the write-ahead log.
#[derive(Debug, Error, Clone)]
pub enum WalError {
    #[error("wal is closed")]
    Closed,
    #[error("wal io error: {0}")]
    Io(String),
}

/// Errors surfaced by the local storage engine.
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    #[error("shard {0} is closed")]
    Closed(u32),
    #[error("failed to open shard {0}: {1}")]
    Open(u32, String),
    #[error("shard {0} has no local store attached")]
    NoLocalStore(u32),
}

/// Errors surfaced by the cluster transport / remote replicas.
#[derive(Debug, Error, Clone)]
pub enum ClusterError {
    #[error("no servers up to query shard {0}")]
    NoHealthyReplicas(u32),
    #[error("request to server {0} failed: {1}")]
    Request(u32, String),
}

/// Top-level error type for shard operations.
#[derive(Debug, Error, Clone)]
pub enum ShardError {
    #[error(transparent)]
    Wal(#[from] WalError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error("config error: {0}")]
    Config(String),
}
