//! Test doubles for the external collaborators named in §6. Shared across
//! this crate's unit tests so each module only wires up the handful of
//! fakes it actually exercises.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc::Sender;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::cluster_server::ClusterServer;
use crate::error::{ClusterError, StoreError, WalError};
use crate::processor::QueryProcessor;
use crate::query_spec::QuerySpec;
use crate::request::{Request, ServerId};
use crate::response::Response;
use crate::store::{LocalStore, ShardDb, WriteBuffer};
use crate::wal::Wal;

/// Install a process-wide `fmt` subscriber for the test binary, same
/// `EnvFilter`/registry composition as `plugins/pgdog-routing`'s init site.
/// Safe to call from every test: `try_init` no-ops once a subscriber is set.
pub fn init_test_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(filter)
        .try_init();
}

#[derive(Default)]
pub struct FakeWal {
    pub fail: AtomicBool,
    next: Mutex<HashMap<u32, i64>>,
    pub logged: Mutex<Vec<Request>>,
}

#[async_trait]
impl Wal for FakeWal {
    async fn assign_sequence_numbers_and_log(
        &self,
        request: &Request,
        shard_id: u32,
    ) -> Result<i64, WalError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(WalError::Io("fake wal failure".into()));
        }
        let mut next = self.next.lock();
        let entry = next.entry(shard_id).or_insert(0);
        *entry += 1;
        self.logged.lock().push(request.clone());
        Ok(*entry)
    }
}

pub fn test_wal() -> Arc<dyn Wal> {
    Arc::new(FakeWal::default())
}

#[derive(Default)]
pub struct FakeShardDb {
    pub writes: Mutex<Vec<(String, Vec<String>)>>,
    pub dropped_databases: Mutex<Vec<String>>,
    pub query_calls: Mutex<Vec<String>>,
    pub fail_query: bool,
}

#[async_trait]
impl ShardDb for FakeShardDb {
    async fn write(&self, database: &str, series: &[String]) -> Result<(), StoreError> {
        self.writes
            .lock()
            .push((database.to_string(), series.to_vec()));
        Ok(())
    }

    async fn query(
        &self,
        spec: &QuerySpec,
        processor: &mut dyn QueryProcessor,
    ) -> Result<(), StoreError> {
        self.query_calls
            .lock()
            .push(spec.select_query().to_string());
        if self.fail_query {
            return Err(StoreError::Closed(0));
        }
        processor.yield_series("fake_series").await;
        Ok(())
    }

    async fn drop_database(&self, database: &str) -> Result<(), StoreError> {
        self.dropped_databases.lock().push(database.to_string());
        Ok(())
    }

    fn is_closed(&self) -> bool {
        false
    }
}

#[derive(Default)]
pub struct FakeLocalStore {
    pub fail_open: bool,
    pub shards: Mutex<HashMap<u32, Arc<FakeShardDb>>>,
    pub buffered: Mutex<Vec<Request>>,
    pub direct_writes: Mutex<Vec<Request>>,
    pub returned: Mutex<Vec<u32>>,
}

impl FakeLocalStore {
    pub fn shard(&self, shard_id: u32) -> Arc<FakeShardDb> {
        self.shards
            .lock()
            .entry(shard_id)
            .or_insert_with(|| Arc::new(FakeShardDb::default()))
            .clone()
    }
}

#[async_trait]
impl LocalStore for FakeLocalStore {
    async fn get_or_create(&self, shard_id: u32) -> Result<Arc<dyn ShardDb>, StoreError> {
        if self.fail_open {
            return Err(StoreError::Open(shard_id, "fake store failure".into()));
        }
        Ok(self.shard(shard_id) as Arc<dyn ShardDb>)
    }

    fn return_shard(&self, shard_id: u32) {
        self.returned.lock().push(shard_id);
    }

    async fn write(&self, request: &Request) -> Result<(), StoreError> {
        self.direct_writes.lock().push(request.clone());
        Ok(())
    }

    fn buffer_write(&self, request: Request) {
        self.buffered.lock().push(request);
    }

    async fn delete_shard(&self, _shard_id: u32) -> Result<(), StoreError> {
        Ok(())
    }

    fn set_write_buffer(&self, _buf: Arc<dyn WriteBuffer>) {}
}

/// Canned behavior for a fake remote replica: the list of responses it
/// streams back when `make_request` is invoked.
pub struct FakeClusterServer {
    id: ServerId,
    up: AtomicBool,
    pub buffered: Mutex<Vec<Request>>,
    pub received: Mutex<Vec<Request>>,
    pub scripted_responses: Mutex<Vec<Response>>,
    pub fail_request: bool,
}

impl FakeClusterServer {
    pub fn new(id: ServerId) -> Self {
        Self {
            id,
            up: AtomicBool::new(true),
            buffered: Mutex::new(Vec::new()),
            received: Mutex::new(Vec::new()),
            scripted_responses: Mutex::new(Vec::new()),
            fail_request: false,
        }
    }

    pub fn down(self) -> Self {
        self.up.store(false, Ordering::SeqCst);
        self
    }

    pub fn with_responses(self, responses: Vec<Response>) -> Self {
        *self.scripted_responses.lock() = responses;
        self
    }
}

#[async_trait]
impl ClusterServer for FakeClusterServer {
    fn id(&self) -> ServerId {
        self.id
    }

    fn is_up(&self) -> bool {
        self.up.load(Ordering::SeqCst)
    }

    fn buffer_write(&self, request: Request) {
        self.buffered.lock().push(request);
    }

    async fn make_request(
        &self,
        request: Request,
        response_tx: Sender<Response>,
    ) -> Result<(), ClusterError> {
        self.received.lock().push(request);
        if self.fail_request {
            return Err(ClusterError::Request(self.id, "fake request failure".into()));
        }
        let responses = self.scripted_responses.lock().clone();
        for response in responses {
            let _ = response_tx.send(response).await;
        }
        Ok(())
    }
}
