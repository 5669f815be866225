//! Sharded score accumulator for parallel ranking.
//!
//! Keys are routed to one of a fixed number of partitions, each behind its own
//! mutex. Workers touching keys in different partitions never contend, and a
//! worker only ever holds one partition lock at a time.

use crate::DocId;
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use std::collections::BTreeMap;

pub struct ConcurrentAccumulator<V> {
    shards: Vec<Mutex<BTreeMap<DocId, V>>>,
}

impl<V: Default> ConcurrentAccumulator<V> {
    /// `shard_count` is clamped to at least one partition.
    pub fn new(shard_count: usize) -> Self {
        let shards = (0..shard_count.max(1)).map(|_| Mutex::new(BTreeMap::new())).collect();
        Self { shards }
    }

    pub fn shard_count(&self) -> usize { self.shards.len() }

    fn shard(&self, key: DocId) -> &Mutex<BTreeMap<DocId, V>> {
        &self.shards[key as u32 as usize % self.shards.len()]
    }

    /// Exclusive access to the slot for `key`, created with `V::default()` if
    /// missing. The owning partition stays locked until the guard is dropped.
    pub fn access(&self, key: DocId) -> MappedMutexGuard<'_, V> {
        MutexGuard::map(self.shard(key).lock(), |map| map.entry(key).or_default())
    }

    pub fn erase(&self, key: DocId) {
        self.shard(key).lock().remove(&key);
    }

    /// Move every partition's contents into one ordered map, locking the
    /// partitions one after another. Call once all writers are done.
    pub fn drain(&self) -> BTreeMap<DocId, V> {
        let mut merged = BTreeMap::new();
        for shard in &self.shards {
            merged.append(&mut shard.lock());
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn routes_negative_keys_without_panicking() {
        let acc = ConcurrentAccumulator::<i32>::new(7);
        *acc.access(-3) += 1;
        *acc.access(4) += 2;
        assert_eq!(acc.drain(), BTreeMap::from([(-3, 1), (4, 2)]));
    }

    #[test]
    fn zero_shards_is_clamped() {
        let acc = ConcurrentAccumulator::<f64>::new(0);
        assert_eq!(acc.shard_count(), 1);
        *acc.access(10) += 0.5;
        assert_eq!(acc.drain().get(&10), Some(&0.5));
    }

    #[test]
    fn erase_removes_only_that_key() {
        let acc = ConcurrentAccumulator::<u32>::new(2);
        for key in 0..6 {
            *acc.access(key) += 1;
        }
        acc.erase(2);
        acc.erase(100);
        assert_eq!(acc.drain().keys().copied().collect::<Vec<_>>(), vec![0, 1, 3, 4, 5]);
    }

    #[test]
    fn drain_empties_the_partitions() {
        let acc = ConcurrentAccumulator::<u32>::new(3);
        *acc.access(1) += 1;
        assert_eq!(acc.drain().len(), 1);
        assert!(acc.drain().is_empty());
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let acc = ConcurrentAccumulator::<u64>::new(4);
        (0..10_000).into_par_iter().for_each(|i| {
            *acc.access(i % 50) += 1;
        });
        let totals = acc.drain();
        assert_eq!(totals.len(), 50);
        assert!(totals.values().all(|&n| n == 200));
    }
}
