//! The aggregation-locality oracle (§4.6): decides whether a query's
//! aggregation step runs on this shard or at the coordinator.

use crate::query_spec::QuerySpec;

use super::Shard;

impl Shard {
    /// `true` if aggregating locally produces a correct final answer for
    /// `spec` against this shard alone.
    pub fn should_aggregate_locally(&self, spec: &QuerySpec) -> bool {
        if self.duration_is_split() && spec.reads_from_multiple_series {
            return false;
        }

        match spec.group_by_interval {
            None => !spec.has_aggregates,
            Some(interval) => {
                let interval_secs = interval.as_secs() as i64;
                interval_secs > 0 && self.duration_seconds() % interval_secs == 0
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use chrono::{DateTime, Duration as ChronoDuration, Utc};

    use super::*;
    use crate::shard::ShardType;
    use crate::test_support::test_wal;

    fn shard_with_duration(seconds: i64, duration_is_split: bool) -> Shard {
        let start = Utc::now();
        let end: DateTime<Utc> = start + ChronoDuration::seconds(seconds);
        Shard::new_shard(1, start, end, ShardType::ShortTerm, duration_is_split, test_wal())
    }

    fn spec() -> QuerySpec {
        QuerySpec::new("q", "q")
    }

    #[test]
    fn test_split_shard_with_multi_series_read_never_aggregates_locally() {
        let shard = shard_with_duration(3_600, true);
        let mut spec = spec();
        spec.reads_from_multiple_series = true;
        assert!(!shard.should_aggregate_locally(&spec));
    }

    #[test]
    fn test_no_group_by_defers_to_has_aggregates() {
        let shard = shard_with_duration(3_600, false);

        let mut spec = spec();
        spec.has_aggregates = true;
        assert!(!shard.should_aggregate_locally(&spec));

        spec.has_aggregates = false;
        assert!(shard.should_aggregate_locally(&spec));
    }

    #[test]
    fn test_group_by_interval_evenly_dividing_shard_duration() {
        let shard = shard_with_duration(3_600, false);
        let mut spec = spec();
        spec.has_aggregates = true;
        spec.group_by_interval = Some(Duration::from_secs(600));
        assert!(shard.should_aggregate_locally(&spec));
    }

    #[test]
    fn test_group_by_interval_not_dividing_shard_duration() {
        let shard = shard_with_duration(3_600, false);
        let mut spec = spec();
        spec.has_aggregates = true;
        spec.group_by_interval = Some(Duration::from_secs(700));
        assert!(!shard.should_aggregate_locally(&spec));
    }
}
