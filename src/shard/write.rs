//! The write path (§4.3): stamp, log, and disseminate.

use tracing::{debug, instrument};

use crate::error::ShardError;
use crate::request::Request;

use super::Shard;

impl Shard {
    /// Durably log and disseminate a write confined to this shard.
    ///
    /// WAL failure is fatal: on error, nothing is disseminated. Buffer
    /// enqueues to the local store and remote replicas are
    /// fire-and-forget; backpressure and retry belong to the buffers.
    #[instrument(skip_all, fields(shard_id = self.id()))]
    pub async fn write(&self, mut request: Request) -> Result<(), ShardError> {
        request.shard_id = self.id();

        let request_number = self
            .wal
            .assign_sequence_numbers_and_log(&request, self.id())
            .await?;
        request.request_number = request_number;

        if let Some(store) = self.replicas.local_store() {
            store.buffer_write(request.for_forward());
        }

        for server in self.replicas.servers() {
            server.buffer_write(request.for_forward());
        }

        debug!(request_number, "write dispatched to replica set");
        Ok(())
    }

    /// Write directly into the local store, bypassing WAL and
    /// replication. Used only for WAL replay into the local store: the
    /// replay path must disable WAL itself, or this would log the
    /// replayed request right back into the log it was read from.
    pub async fn write_local_only(&self, request: Request) -> Result<(), ShardError> {
        if let Some(store) = self.replicas.local_store() {
            store.write(&request).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use chrono::{Duration as ChronoDuration, Utc};
    use std::sync::Arc;

    use super::*;
    use crate::request::RequestType;
    use crate::shard::ShardType;
    use crate::test_support::{init_test_tracing, FakeClusterServer, FakeLocalStore, FakeWal};

    fn new_shard(wal: Arc<FakeWal>) -> Shard {
        let start = Utc::now();
        let end = start + ChronoDuration::hours(1);
        Shard::new_shard(42, start, end, ShardType::ShortTerm, false, wal)
    }

    #[tokio::test]
    async fn test_local_write_stamps_and_fans_out() {
        init_test_tracing();
        let wal = Arc::new(FakeWal::default());
        let mut shard = new_shard(wal.clone());

        let store = Arc::new(FakeLocalStore::default());
        shard
            .replicas
            .set_local_store(store.clone(), 1, shard.id())
            .await
            .unwrap();

        let remote_a = Arc::new(FakeClusterServer::new(2));
        let remote_b = Arc::new(FakeClusterServer::new(3));
        shard
            .replicas
            .set_servers(vec![remote_a.clone(), remote_b.clone()]);

        let request = Request {
            request_type: RequestType::Write,
            database: "db".into(),
            series: vec!["cpu".into()],
            id: Some(999),
            ..Default::default()
        };

        shard.write(request).await.unwrap();

        assert_eq!(wal.logged.lock().len(), 1);
        assert_eq!(wal.logged.lock()[0].shard_id, 42);

        let buffered = store.buffered.lock();
        assert_eq!(buffered.len(), 1);
        assert_eq!(buffered[0].shard_id, 42);
        assert_eq!(buffered[0].request_number, 1);

        for remote in [&remote_a, &remote_b] {
            let received = remote.buffered.lock();
            assert_eq!(received.len(), 1);
            assert_eq!(received[0].id, None, "per-hop id must be cleared");
            assert_eq!(received[0].request_number, 1);
            assert_eq!(received[0].shard_id, 42);
        }
    }

    #[tokio::test]
    async fn test_wal_failure_prevents_dissemination() {
        let wal = Arc::new(FakeWal::default());
        wal.fail.store(true, std::sync::atomic::Ordering::SeqCst);
        let mut shard = new_shard(wal.clone());

        let store = Arc::new(FakeLocalStore::default());
        shard
            .replicas
            .set_local_store(store.clone(), 1, shard.id())
            .await
            .unwrap();

        let err = shard.write(Request::default()).await;
        assert!(err.is_err());
        assert!(store.buffered.lock().is_empty());
    }

    #[tokio::test]
    async fn test_write_local_only_skips_wal_and_replicas() {
        let wal = Arc::new(FakeWal::default());
        let mut shard = new_shard(wal.clone());

        let store = Arc::new(FakeLocalStore::default());
        shard
            .replicas
            .set_local_store(store.clone(), 1, shard.id())
            .await
            .unwrap();

        let remote = Arc::new(FakeClusterServer::new(2));
        shard.replicas.set_servers(vec![remote.clone()]);

        shard.write_local_only(Request::default()).await.unwrap();

        assert!(wal.logged.lock().is_empty());
        assert!(remote.buffered.lock().is_empty());
        assert_eq!(store.direct_writes.lock().len(), 1);
    }
}
