//! Local storage engine: consumed interface (§6), plus the scoped handle
//! that guarantees `get_or_create`/`return` are paired on every exit path,
//! the same way connection-pool checkout and check-in are paired by a
//! guard type elsewhere in this family of crates.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::processor::QueryProcessor;
use crate::query_spec::QuerySpec;
use crate::request::Request;

/// A single shard's backing store, as exposed by the storage engine.
#[async_trait]
pub trait ShardDb: Send + Sync {
    async fn write(&self, database: &str, series: &[String]) -> Result<(), StoreError>;
    async fn query(
        &self,
        spec: &QuerySpec,
        processor: &mut dyn QueryProcessor,
    ) -> Result<(), StoreError>;
    async fn drop_database(&self, database: &str) -> Result<(), StoreError>;
    fn is_closed(&self) -> bool;
}

/// The non-blocking write buffer a store writes through; its batching and
/// flush policy (sized by `cluster.write-buffer-size`) live with the
/// storage engine, not this layer.
pub trait WriteBuffer: Send + Sync {}

/// The storage engine as a whole: opens/closes per-shard handles and
/// accepts buffered/synchronous writes.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn get_or_create(&self, shard_id: u32) -> Result<Arc<dyn ShardDb>, StoreError>;
    fn return_shard(&self, shard_id: u32);
    async fn write(&self, request: &Request) -> Result<(), StoreError>;
    fn buffer_write(&self, request: Request);
    async fn delete_shard(&self, shard_id: u32) -> Result<(), StoreError>;
    /// Install the write buffer the store should enqueue onto for
    /// `buffer_write`. Not invoked by the shard's own write/query/
    /// destructive protocols in §4; modeled here so the trait mirrors the
    /// full consumed surface named in §6.
    fn set_write_buffer(&self, buf: Arc<dyn WriteBuffer>);
}

/// Scoped acquisition of a shard's backing store. `return_shard` is called
/// exactly once, on every exit path (success, early return, or panic
/// unwind), mirroring the teacher's `Guard` pattern for pool checkout.
pub struct StoreHandle<'a> {
    store: &'a dyn LocalStore,
    shard_id: u32,
    db: Arc<dyn ShardDb>,
}

impl<'a> StoreHandle<'a> {
    pub fn db(&self) -> &Arc<dyn ShardDb> {
        &self.db
    }
}

impl Drop for StoreHandle<'_> {
    fn drop(&mut self) {
        self.store.return_shard(self.shard_id);
    }
}

/// Acquire a shard's backing store under the scoped guard described above.
pub async fn acquire_shard(
    store: &dyn LocalStore,
    shard_id: u32,
) -> Result<StoreHandle<'_>, StoreError> {
    let db = store.get_or_create(shard_id).await?;
    Ok(StoreHandle {
        store,
        shard_id,
        db,
    })
}
