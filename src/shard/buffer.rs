//! The response-buffer-size oracle (§4.7): a pure sizing heuristic for the
//! channel a query streams its responses through.

use crate::query_spec::QuerySpec;

use super::Shard;

const SAFETY_DEFAULT: usize = 1_000;
const LOW_TICKS_SIZE: usize = 100;
const MAX_TICKS_FOR_DIRECT_SIZE: u64 = 1_000;
const UNKNOWN_CARDINALITY_MULTIPLIER: usize = 100;

impl Shard {
    /// Estimate a response-channel depth for `spec` run against this shard.
    /// `batch_point_size` is the number of points the storage engine packs
    /// per response frame.
    pub fn response_buffer_size(&self, spec: &QuerySpec, batch_point_size: u64) -> usize {
        let Some(interval) = spec.group_by_interval else {
            return SAFETY_DEFAULT;
        };

        let interval_secs = interval.as_secs();
        if interval_secs == 0 {
            return SAFETY_DEFAULT;
        }

        let ticks = (self.duration_seconds() as u64) / interval_secs;

        let base = if ticks < 10 {
            LOW_TICKS_SIZE
        } else if ticks <= MAX_TICKS_FOR_DIRECT_SIZE {
            ticks as usize
        } else {
            let batch = batch_point_size.max(1);
            (SAFETY_DEFAULT).max((ticks / batch) as usize)
        };

        if spec.group_by_column_count > 1 {
            base * UNKNOWN_CARDINALITY_MULTIPLIER
        } else {
            base
        }
    }
}
