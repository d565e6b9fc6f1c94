//! Shard collection ordering (§4.8): a total order over anything with a
//! start time and an id, used to sort collections of shards canonically.

use chrono::{DateTime, Utc};

/// Implemented by anything sortable the way shards are: primarily by start
/// time, with id as a stable tie-break.
pub trait TimeOrdered {
    fn ordering_start_time(&self) -> DateTime<Utc>;
    fn ordering_id(&self) -> u32;
}

impl TimeOrdered for super::Shard {
    fn ordering_start_time(&self) -> DateTime<Utc> {
        self.start_time()
    }

    fn ordering_id(&self) -> u32 {
        self.id()
    }
}

/// Ascending by start time, id ascending as tie-break.
pub fn sort_asc<T: TimeOrdered>(items: &mut [T]) {
    items.sort_by(|a, b| {
        a.ordering_start_time()
            .cmp(&b.ordering_start_time())
            .then(a.ordering_id().cmp(&b.ordering_id()))
    });
}

/// Descending by start time only; the id tie-break stays ascending so the
/// canonical order for same-instant shards never reverses.
pub fn sort_desc<T: TimeOrdered>(items: &mut [T]) {
    items.sort_by(|a, b| {
        b.ordering_start_time()
            .cmp(&a.ordering_start_time())
            .then(a.ordering_id().cmp(&b.ordering_id()))
    });
}
