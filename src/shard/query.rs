//! The query path (§4.4): pick a local processor or forward to a healthy
//! replica, always terminating the caller's channel with exactly one
//! `end_stream` frame on the local path.

use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc::Sender;
use tracing::{error, instrument};

use crate::processor::QueryProcessor;
use crate::query_spec::QuerySpec;
use crate::request::{Request, RequestType};
use crate::response::Response;
use crate::store::acquire_shard;

use super::Shard;

impl Shard {
    /// Stream zero or more response frames followed by exactly one
    /// `end_stream` frame (destructive queries: handled by the dispatcher
    /// in §4.5, which owns its own terminal-marker discipline).
    #[instrument(skip_all, fields(shard_id = self.id()))]
    pub async fn query(&self, spec: QuerySpec, response_tx: Sender<Response>) {
        if spec.run_against_all_servers_in_shard && spec.is_destructive() {
            let request = self.destructive_request(&spec);
            self.handle_destructive_query(&spec, request, response_tx, false)
                .await;
            return;
        }

        if self.is_local() {
            self.query_local(spec, response_tx).await;
        } else {
            self.query_remote(spec, response_tx).await;
        }
    }

    fn destructive_request(&self, spec: &QuerySpec) -> Request {
        Request {
            request_type: RequestType::Query,
            shard_id: self.id(),
            query: Some(spec.select_query().to_string()),
            database: spec.database.clone(),
            user: Some(spec.user.name.clone()),
            is_db_user: !spec.user.is_cluster_admin,
            ..Default::default()
        }
    }

    pub(super) fn pick_processor(&self, spec: &QuerySpec) -> Box<dyn QueryProcessor> {
        if spec.is_list_series {
            return self.engines.list_series();
        }

        let inner = if spec.is_delete_from_series || spec.is_drop_series || spec.is_single_point {
            self.engines.passthrough(10_000, None)
        } else if self.should_aggregate_locally(spec) {
            self.engines.aggregate(self.id(), self.is_local())
        } else if spec.has_aggregates {
            self.engines.passthrough(1_000, None)
        } else {
            self.engines.passthrough(1_000, spec.limit)
        };

        self.engines.filter(inner, spec.predicate.clone())
    }

    async fn query_local(&self, spec: QuerySpec, response_tx: Sender<Response>) {
        let mut processor = self.pick_processor(&spec);
        processor.set_shard_info(self.id(), true);

        let store = match self.replicas.local_store() {
            Some(store) => store,
            None => {
                let _ = response_tx
                    .send(Response::error("shard has no local store attached"))
                    .await;
                let _ = response_tx.send(Response::end_stream()).await;
                return;
            }
        };

        let handle = match acquire_shard(store.as_ref(), self.id()).await {
            Ok(handle) => handle,
            Err(err) => {
                let _ = response_tx.send(Response::error(err.to_string())).await;
                let _ = response_tx.send(Response::end_stream()).await;
                return;
            }
        };

        let result = handle.db().query(&spec, processor.as_mut()).await;
        processor.close().await;

        if let Err(err) = result {
            let _ = response_tx.send(Response::error(err.to_string())).await;
        }
        let _ = response_tx.send(Response::end_stream()).await;
    }

    async fn query_remote(&self, spec: QuerySpec, response_tx: Sender<Response>) {
        let healthy = self.replicas.healthy_servers();
        if healthy.is_empty() {
            let _ = response_tx
                .send(Response::end_stream_with_message(format!(
                    "No servers up to query shard {}",
                    self.id()
                )))
                .await;
            return;
        }

        let now_nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as usize;
        let chosen = healthy[now_nanos % healthy.len()];

        let request = Request {
            request_type: RequestType::Query,
            shard_id: self.id(),
            query: Some(spec.select_query().to_string()),
            database: spec.database.clone(),
            user: Some(spec.user.name.clone()),
            is_db_user: !spec.user.is_cluster_admin,
            ..Default::default()
        };

        if let Err(err) = chosen.make_request(request, response_tx).await {
            error!(%err, shard_id = self.id(), "remote query dispatch failed");
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use chrono::{Duration as ChronoDuration, Utc};
    use tokio::sync::mpsc;

    use super::*;
    use crate::response::ResponseKind;
    use crate::shard::ShardType;
    use crate::test_support::{test_wal, FakeClusterServer, FakeLocalStore};

    fn new_shard() -> Shard {
        let start = Utc::now();
        let end = start + ChronoDuration::hours(1);
        Shard::new_shard(7, start, end, ShardType::ShortTerm, false, test_wal())
    }

    #[tokio::test]
    async fn test_local_query_ends_with_single_end_stream() {
        let mut shard = new_shard();
        let store = Arc::new(FakeLocalStore::default());
        shard
            .replicas
            .set_local_store(store.clone(), 1, shard.id())
            .await
            .unwrap();

        let (tx, mut rx) = mpsc::channel(16);
        shard.query(QuerySpec::new("select * from cpu", "select * from cpu"), tx).await;

        let mut frames = Vec::new();
        while let Some(frame) = rx.recv().await {
            frames.push(frame);
        }

        let end_streams = frames
            .iter()
            .filter(|r| r.kind == ResponseKind::EndStream)
            .count();
        assert_eq!(end_streams, 1);
        assert!(matches!(frames.last().unwrap().kind, ResponseKind::EndStream));
        assert_eq!(store.shard(shard.id()).query_calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_local_query_with_no_store_reports_and_ends() {
        // No local store attached at all: query() must still report an
        // error frame before ending the stream, rather than hanging.
        let shard = new_shard();

        let (tx, mut rx) = mpsc::channel(16);
        shard.query(QuerySpec::new("select 1", "select 1"), tx).await;

        let frames: Vec<_> = {
            let mut v = Vec::new();
            while let Some(frame) = rx.recv().await {
                v.push(frame);
            }
            v
        };
        // No local store attached at all now: one error frame, one end_stream.
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].kind, ResponseKind::Error);
        assert_eq!(frames[1].kind, ResponseKind::EndStream);
    }

    #[tokio::test]
    async fn test_remote_query_no_healthy_replicas() {
        let mut shard = new_shard();
        shard
            .replicas
            .set_servers(vec![Arc::new(FakeClusterServer::new(1).down())]);

        let (tx, mut rx) = mpsc::channel(16);
        shard.query(QuerySpec::new("select 1", "select 1"), tx).await;

        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.kind, ResponseKind::EndStream);
        assert_eq!(
            frame.message.as_deref(),
            Some(format!("No servers up to query shard {}", shard.id()).as_str())
        );
        assert!(rx.recv().await.is_none(), "exactly one frame is sent");
    }

    #[tokio::test]
    async fn test_remote_query_selects_a_healthy_server() {
        let mut shard = new_shard();
        let server = Arc::new(
            FakeClusterServer::new(1).with_responses(vec![Response::end_stream()]),
        );
        shard.replicas.set_servers(vec![server.clone()]);

        let (tx, mut rx) = mpsc::channel(16);
        shard.query(QuerySpec::new("select 1", "select 1"), tx).await;

        assert_eq!(server.received.lock().len(), 1);
        assert_eq!(server.received.lock()[0].shard_id, shard.id());
        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.kind, ResponseKind::EndStream);
    }
}
