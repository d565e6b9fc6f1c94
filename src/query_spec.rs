//! `QuerySpec`: opaque to the shard layer except for the predicates and
//! derived strings it reads to make dispatch decisions.

use std::time::Duration;

/// The user issuing a query, as far as the shard layer cares.
#[derive(Debug, Clone, Default)]
pub struct QueryUser {
    pub name: String,
    pub is_cluster_admin: bool,
}

#[derive(Debug, Clone, Default)]
pub struct QuerySpec {
    pub is_list_series: bool,
    pub is_delete_from_series: bool,
    pub is_drop_series: bool,
    pub is_single_point: bool,
    pub has_aggregates: bool,
    pub reads_from_multiple_series: bool,
    pub run_against_all_servers_in_shard: bool,
    pub group_by_interval: Option<Duration>,
    pub group_by_column_count: usize,
    pub limit: Option<u64>,
    pub database: String,
    pub user: QueryUser,
    query: String,
    query_without_time_conditions: String,
    /// Predicate text, opaque to this layer, handed to the filtering engine.
    pub predicate: Option<String>,
}

impl QuerySpec {
    pub fn new(query: impl Into<String>, query_without_time_conditions: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            query_without_time_conditions: query_without_time_conditions.into(),
            ..Default::default()
        }
    }

    /// The query string to run against this shard, with time conditions
    /// still attached (the shard owns exactly one time range, so the
    /// predicate can be left in place).
    pub fn select_query(&self) -> &str {
        &self.query
    }

    pub fn query_without_time_conditions(&self) -> &str {
        &self.query_without_time_conditions
    }

    pub fn is_destructive(&self) -> bool {
        self.is_delete_from_series || self.is_drop_series
    }
}
