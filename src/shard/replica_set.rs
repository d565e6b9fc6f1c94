//! The replica set: which servers hold this shard, and whether one of
//! them is this process.
//!
//! Shard and cluster-server are a many-to-many relation, not ownership:
//! the shard holds ids and looks servers up through the registry handles
//! it was given, rather than holding owning back-references into a
//! registry it doesn't own.

use std::sync::Arc;

use crate::cluster_server::ClusterServer;
use crate::error::StoreError;
use crate::request::ServerId;
use crate::store::LocalStore;

#[derive(Default)]
pub struct ReplicaSet {
    servers: Vec<Arc<dyn ClusterServer>>,
    server_ids: Vec<ServerId>,
    local_store: Option<Arc<dyn LocalStore>>,
    local_server_id: Option<ServerId>,
}

impl ReplicaSet {
    /// Record cluster-server handles and re-sort both `server_ids` and the
    /// backing `servers` ascending by id, so iterating `servers()` visits
    /// replicas in the same order `server_ids()` reports them.
    pub fn set_servers(&mut self, servers: Vec<Arc<dyn ClusterServer>>) {
        for server in &servers {
            self.server_ids.push(server.id());
        }
        self.servers.extend(servers);
        self.server_ids.sort_unstable();
        self.servers.sort_by_key(|server| server.id());
    }

    /// Record the local store, append the local id, re-sort, and probe
    /// the store can actually open this shard. The probe's failure fails
    /// the whole call: we don't want to discover the store is broken the
    /// first time a write or query arrives.
    pub async fn set_local_store(
        &mut self,
        store: Arc<dyn LocalStore>,
        local_server_id: ServerId,
        shard_id: u32,
    ) -> Result<(), StoreError> {
        store.get_or_create(shard_id).await?;
        store.return_shard(shard_id);

        self.server_ids.push(local_server_id);
        self.server_ids.sort_unstable();
        self.local_store = Some(store);
        self.local_server_id = Some(local_server_id);

        Ok(())
    }

    /// Reconstruct from a snapshot's server ids, with no live handles.
    /// Used by [`super::NewShardData`] round-tripping; callers must still
    /// run `set_servers`/`set_local_store` before the shard is usable.
    pub(crate) fn from_ids(server_ids: Vec<ServerId>) -> Self {
        Self {
            server_ids,
            ..Self::default()
        }
    }

    pub fn is_local(&self) -> bool {
        self.local_store.is_some()
    }

    pub fn server_ids(&self) -> &[ServerId] {
        &self.server_ids
    }

    pub fn servers(&self) -> &[Arc<dyn ClusterServer>] {
        &self.servers
    }

    pub fn local_store(&self) -> Option<&Arc<dyn LocalStore>> {
        self.local_store.as_ref()
    }

    pub fn local_server_id(&self) -> Option<ServerId> {
        self.local_server_id
    }

    pub fn healthy_servers(&self) -> Vec<&Arc<dyn ClusterServer>> {
        self.servers.iter().filter(|s| s.is_up()).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_support::{FakeClusterServer, FakeLocalStore};

    #[tokio::test]
    async fn test_set_servers_sorts_ascending() {
        let mut replicas = ReplicaSet::default();
        replicas.set_servers(vec![
            Arc::new(FakeClusterServer::new(3)),
            Arc::new(FakeClusterServer::new(1)),
            Arc::new(FakeClusterServer::new(2)),
        ]);

        assert_eq!(replicas.server_ids(), &[1, 2, 3]);
        assert!(!replicas.is_local());
    }

    #[tokio::test]
    async fn test_set_servers_orders_backing_servers_to_match_ids() {
        let mut replicas = ReplicaSet::default();
        replicas.set_servers(vec![
            Arc::new(FakeClusterServer::new(5)),
            Arc::new(FakeClusterServer::new(1)),
            Arc::new(FakeClusterServer::new(3)),
        ]);

        let ordered_ids: Vec<_> = replicas.servers().iter().map(|s| s.id()).collect();
        assert_eq!(ordered_ids, vec![1, 3, 5]);
        assert_eq!(ordered_ids, replicas.server_ids());
    }

    #[tokio::test]
    async fn test_set_local_store_marks_local_and_sorts() {
        let mut replicas = ReplicaSet::default();
        replicas.set_servers(vec![Arc::new(FakeClusterServer::new(5))]);
        replicas
            .set_local_store(Arc::new(FakeLocalStore::default()), 2, 7)
            .await
            .unwrap();

        assert!(replicas.is_local());
        assert_eq!(replicas.server_ids(), &[2, 5]);
        assert_eq!(replicas.local_server_id(), Some(2));
    }

    #[tokio::test]
    async fn test_set_local_store_propagates_open_failure() {
        let mut replicas = ReplicaSet::default();
        let store = FakeLocalStore {
            fail_open: true,
            ..Default::default()
        };
        let err = replicas.set_local_store(Arc::new(store), 1, 7).await;
        assert!(err.is_err());
        assert!(!replicas.is_local());
    }

    #[test]
    fn test_healthy_servers_filters_down() {
        let mut replicas = ReplicaSet::default();
        let up = FakeClusterServer::new(1);
        let down = FakeClusterServer::new(2).down();
        replicas.set_servers(vec![Arc::new(up), Arc::new(down)]);

        assert_eq!(replicas.healthy_servers().len(), 1);
    }
}
