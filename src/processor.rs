//! Query processors: the sinks a shard streams points/series through.
//!
//! The heavy engines (real aggregation, real query parsing) are external
//! collaborators per the system overview; this module only defines the
//! trait they implement and the light wrapping engines (passthrough,
//! filtering, list-series) that belong to the shard layer itself.

use async_trait::async_trait;

/// A single data point, opaque beyond its timestamp: aggregation and
/// encoding live outside this layer.
#[derive(Debug, Clone, Default)]
pub struct Point {
    pub timestamp_micro: i64,
    pub fields: Vec<(String, String)>,
}

#[async_trait]
pub trait QueryProcessor: Send {
    async fn yield_point(&mut self, series_name: &str, columns: &[String], point: &Point) -> bool;
    async fn yield_series(&mut self, series: &str) -> bool;
    async fn close(&mut self);
    fn set_shard_info(&mut self, shard_id: u32, is_local: bool);
    fn get_name(&self) -> &str;
}

/// Caps the number of points/series forwarded before refusing further
/// yields. Used for list-series, passthrough-with-cap, and single-point
/// reads per §4.4.
pub struct PassthroughProcessor {
    name: &'static str,
    cap: usize,
    limit: Option<u64>,
    seen: usize,
    shard_id: u32,
    is_local: bool,
}

impl PassthroughProcessor {
    pub fn new(cap: usize, limit: Option<u64>) -> Self {
        Self {
            name: "passthrough",
            cap,
            limit,
            seen: 0,
            shard_id: 0,
            is_local: false,
        }
    }
}

#[async_trait]
impl QueryProcessor for PassthroughProcessor {
    async fn yield_point(&mut self, _series_name: &str, _columns: &[String], _point: &Point) -> bool {
        self.seen += 1;
        if let Some(limit) = self.limit {
            if self.seen as u64 > limit {
                return false;
            }
        }
        self.seen < self.cap
    }

    async fn yield_series(&mut self, _series: &str) -> bool {
        self.seen += 1;
        self.seen < self.cap
    }

    async fn close(&mut self) {}

    fn set_shard_info(&mut self, shard_id: u32, is_local: bool) {
        self.shard_id = shard_id;
        self.is_local = is_local;
    }

    fn get_name(&self) -> &str {
        self.name
    }
}

/// List-series is its own engine: it yields series names, never points,
/// and has no cap beyond whatever the caller's channel applies.
pub struct ListSeriesProcessor {
    shard_id: u32,
    is_local: bool,
}

impl Default for ListSeriesProcessor {
    fn default() -> Self {
        Self {
            shard_id: 0,
            is_local: false,
        }
    }
}

#[async_trait]
impl QueryProcessor for ListSeriesProcessor {
    async fn yield_point(&mut self, _series_name: &str, _columns: &[String], _point: &Point) -> bool {
        false
    }

    async fn yield_series(&mut self, _series: &str) -> bool {
        true
    }

    async fn close(&mut self) {}

    fn set_shard_info(&mut self, shard_id: u32, is_local: bool) {
        self.shard_id = shard_id;
        self.is_local = is_local;
    }

    fn get_name(&self) -> &str {
        "list_series"
    }
}

/// Wraps an inner processor with a predicate; every yield is delegated
/// unchanged (the filtering logic belongs to the query parser, which is
/// out of scope here — the shard only parameterizes and wires it up).
pub struct FilteringProcessor {
    inner: Box<dyn QueryProcessor>,
    #[allow(dead_code)]
    predicate: Option<String>,
}

impl FilteringProcessor {
    pub fn new(inner: Box<dyn QueryProcessor>, predicate: Option<String>) -> Self {
        Self { inner, predicate }
    }
}

#[async_trait]
impl QueryProcessor for FilteringProcessor {
    async fn yield_point(&mut self, series_name: &str, columns: &[String], point: &Point) -> bool {
        self.inner.yield_point(series_name, columns, point).await
    }

    async fn yield_series(&mut self, series: &str) -> bool {
        self.inner.yield_series(series).await
    }

    async fn close(&mut self) {
        self.inner.close().await
    }

    fn set_shard_info(&mut self, shard_id: u32, is_local: bool) {
        self.inner.set_shard_info(shard_id, is_local)
    }

    fn get_name(&self) -> &str {
        "filter"
    }
}

/// Factory for the processors a shard attaches to a query. Implementations
/// that do real aggregation (the "query engine" in §4.4) are supplied by
/// the coordinator; [`DefaultEngines`] covers the engines owned by this
/// layer and falls back to passthrough for aggregation so the crate is
/// usable standalone in tests.
pub trait ProcessorFactory: Send + Sync {
    fn list_series(&self) -> Box<dyn QueryProcessor>;
    fn passthrough(&self, cap: usize, limit: Option<u64>) -> Box<dyn QueryProcessor>;
    fn aggregate(&self, shard_id: u32, is_local: bool) -> Box<dyn QueryProcessor>;
    fn filter(&self, inner: Box<dyn QueryProcessor>, predicate: Option<String>) -> Box<dyn QueryProcessor> {
        Box::new(FilteringProcessor::new(inner, predicate))
    }
}

#[derive(Default)]
pub struct DefaultEngines;

impl ProcessorFactory for DefaultEngines {
    fn list_series(&self) -> Box<dyn QueryProcessor> {
        Box::new(ListSeriesProcessor::default())
    }

    fn passthrough(&self, cap: usize, limit: Option<u64>) -> Box<dyn QueryProcessor> {
        Box::new(PassthroughProcessor::new(cap, limit))
    }

    fn aggregate(&self, shard_id: u32, is_local: bool) -> Box<dyn QueryProcessor> {
        let mut p = PassthroughProcessor::new(1_000, None);
        p.set_shard_info(shard_id, is_local);
        Box::new(p)
    }
}
