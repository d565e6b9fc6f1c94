//! The destructive dispatcher (§4.5): drops and deletes that must run on
//! every replica, merged back onto the caller's channel with a
//! sequential-drain, terminal-marker discipline.

use tokio::sync::mpsc::{self, Sender};
use tracing::{error, instrument};

use crate::processor::QueryProcessor;
use crate::query_spec::QuerySpec;
use crate::request::{Request, RequestType};
use crate::response::Response;
use crate::store::acquire_shard;

use super::Shard;

const DESTRUCTIVE_LOCAL_CAP: usize = 1_000;
const DESTRUCTIVE_CHANNEL_DEPTH: usize = 256;

impl Shard {
    /// Run a destructive query locally (if a replica) and forward it to
    /// every remote replica, merging response streams in replica order and
    /// emitting at most one `access_denied` before the final `end_stream`.
    ///
    /// `run_local_only = true` on a non-local shard is a caller bug.
    #[instrument(skip_all, fields(shard_id = self.id()))]
    pub async fn handle_destructive_query(
        &self,
        spec: &QuerySpec,
        request: Request,
        response_tx: Sender<Response>,
        run_local_only: bool,
    ) {
        assert!(
            !run_local_only || self.is_local(),
            "handle_destructive_query called with run_local_only on a non-local shard"
        );

        let mut channels: Vec<mpsc::Receiver<Response>> = Vec::new();

        if self.is_local() {
            let (local_tx, local_rx) = mpsc::channel(DESTRUCTIVE_CHANNEL_DEPTH);
            self.run_destructive_local(spec, local_tx).await;
            channels.push(local_rx);
        }

        if !run_local_only {
            for server in self.replicas.servers() {
                let (remote_tx, remote_rx) = mpsc::channel(DESTRUCTIVE_CHANNEL_DEPTH);
                let forwarded = request.for_forward();
                if let Err(err) = server.make_request(forwarded, remote_tx).await {
                    error!(%err, server_id = server.id(), "destructive dispatch to replica failed");
                }
                channels.push(remote_rx);
            }
        }

        let mut access_denied = false;
        for mut channel in channels {
            while let Some(response) = channel.recv().await {
                if response.is_end_stream() {
                    break;
                }
                if response.is_access_denied() {
                    access_denied = true;
                    continue;
                }
                let _ = response_tx.send(response).await;
            }
        }

        if access_denied {
            let _ = response_tx.send(Response::access_denied()).await;
        }
        let _ = response_tx.send(Response::end_stream()).await;
    }

    async fn run_destructive_local(&self, spec: &QuerySpec, local_tx: Sender<Response>) {
        let Some(store) = self.replicas.local_store() else {
            let _ = local_tx
                .send(Response::error("shard has no local store attached"))
                .await;
            let _ = local_tx.send(Response::end_stream()).await;
            return;
        };

        let handle = match acquire_shard(store.as_ref(), self.id()).await {
            Ok(handle) => handle,
            Err(err) => {
                let _ = local_tx.send(Response::error(err.to_string())).await;
                let _ = local_tx.send(Response::end_stream()).await;
                return;
            }
        };

        let mut processor = self.engines.passthrough(DESTRUCTIVE_LOCAL_CAP, None);
        processor.set_shard_info(self.id(), true);

        let result = handle.db().query(spec, processor.as_mut()).await;
        processor.close().await;

        if let Err(err) = result {
            let _ = local_tx.send(Response::error(err.to_string())).await;
        }
        let _ = local_tx.send(Response::end_stream()).await;
    }

    /// Drop a database: locally (if a replica), and optionally on every
    /// remote replica, draining each reply so senders never block on a
    /// full channel. Remote failures are logged, not propagated — the
    /// shard's own completion never depends on replica acknowledgement.
    #[instrument(skip_all, fields(shard_id = self.id()))]
    pub async fn drop_database(&self, database: &str, send_to_servers: bool) {
        if let Some(store) = self.replicas.local_store() {
            let handle = acquire_shard(store.as_ref(), self.id()).await;
            match handle {
                Ok(handle) => {
                    if let Err(err) = handle.db().drop_database(database).await {
                        error!(%err, shard_id = self.id(), "local drop_database failed");
                    }
                }
                Err(err) => {
                    error!(%err, shard_id = self.id(), "drop_database could not acquire local store");
                }
            }
        }

        if !send_to_servers {
            return;
        }

        for server in self.replicas.servers() {
            let (tx, mut rx) = mpsc::channel(1);
            let request = Request {
                request_type: RequestType::DropDatabase,
                shard_id: self.id(),
                database: database.to_string(),
                ..Default::default()
            };
            if let Err(err) = server.make_request(request, tx).await {
                error!(%err, server_id = server.id(), "remote drop_database failed");
                continue;
            }
            while rx.recv().await.is_some() {}
        }
    }
}
