//! Write-ahead log: consumed interface (§6). The implementation — sequence
//! numbers, on-disk layout, replay — lives outside this layer.

use async_trait::async_trait;

use crate::error::WalError;
use crate::request::Request;

#[async_trait]
pub trait Wal: Send + Sync {
    /// Assign the next monotonically increasing request number for
    /// `shard_id` and durably log `request`. Returns the assigned number.
    async fn assign_sequence_numbers_and_log(
        &self,
        request: &Request,
        shard_id: u32,
    ) -> Result<i64, WalError>;
}
