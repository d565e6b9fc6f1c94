//! Cluster server: consumed interface (§6). The TCP transport, heartbeat
//! tracking, and connection management live outside this layer.

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use crate::error::ClusterError;
use crate::request::{Request, ServerId};
use crate::response::Response;

#[async_trait]
pub trait ClusterServer: Send + Sync {
    fn id(&self) -> ServerId;

    /// Liveness as tracked by the cluster's heartbeat interval
    /// (`cluster.protobuf_heartbeat`).
    fn is_up(&self) -> bool;

    /// Enqueue a write on this server's non-blocking write buffer.
    /// Fire-and-forget: backpressure and retry are the buffer's job.
    fn buffer_write(&self, request: Request);

    /// Send `request` to this server and stream its responses onto
    /// `response_tx`. The transport owns terminating the stream.
    async fn make_request(
        &self,
        request: Request,
        response_tx: Sender<Response>,
    ) -> Result<(), ClusterError>;
}
