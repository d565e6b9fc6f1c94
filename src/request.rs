//! Request wire record: the unit of work the shard stamps and disseminates.

/// Per-hop request identifier. Cleared before each remote forward so the
/// remote assigns its own.
pub type RequestId = u64;

/// Cluster server identifier.
pub type ServerId = u32;

/// Closed set of request tags this layer recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestType {
    #[default]
    Write,
    Query,
    DropDatabase,
}

/// A request in transit between a caller, a shard, and its replicas.
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// Per-hop identifier. `None` once cleared for a forward.
    pub id: Option<RequestId>,
    pub request_type: RequestType,
    pub database: String,
    pub series: Vec<String>,
    /// Always the owning shard once stamped by `Shard::write`/`Shard::query`.
    pub shard_id: u32,
    /// Assigned by the WAL; monotonically increasing per shard.
    pub request_number: i64,
    /// Query text, populated for `RequestType::Query`.
    pub query: Option<String>,
    pub user: Option<String>,
    pub is_db_user: bool,
}

impl Request {
    /// Build a fresh envelope for a remote hop: only the fields the wire
    /// format declares significant, with the per-hop id cleared so the
    /// remote assigns its own.
    pub fn for_forward(&self) -> Self {
        Self {
            id: None,
            request_type: self.request_type,
            database: self.database.clone(),
            series: self.series.clone(),
            shard_id: self.shard_id,
            request_number: self.request_number,
            query: self.query.clone(),
            user: self.user.clone(),
            is_db_user: self.is_db_user,
        }
    }
}
