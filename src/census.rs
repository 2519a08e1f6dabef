//! Ground census: how many grains are at or below the ground plane.
//!
//! Always a full rescan; the count is never tracked incrementally.

use crate::config::{Execution, PARALLEL_CHUNK_LEN};
use crate::particles::ParticleStore;
use rayon::prelude::*;

pub fn ground_count(store: &ParticleStore, execution: Execution) -> usize {
    match execution {
        Execution::Parallel => ground_count_parallel(store),
        Execution::Serial => ground_count_serial(store),
    }
}

pub fn ground_count_serial(store: &ParticleStore) -> usize {
    count_landed(&store.z)
}

/// Per-chunk partial counts, summed once every chunk is done.
pub fn ground_count_parallel(store: &ParticleStore) -> usize {
    store
        .z
        .par_chunks(PARALLEL_CHUNK_LEN)
        .map(count_landed)
        .sum()
}

#[inline]
fn count_landed(z: &[f64]) -> usize {
    z.iter().filter(|&&h| h <= 0.0).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_zero_and_negative_heights() {
        let mut store = ParticleStore::with_capacity(6);
        store.z = vec![1.0, 0.0, -3.0, 1e-12, -1e-12, 240.0];
        assert_eq!(ground_count_serial(&store), 3);
        assert_eq!(ground_count_parallel(&store), 3);
    }

    #[test]
    fn parallel_sum_spans_many_chunks() {
        let n = PARALLEL_CHUNK_LEN * 7 + 13;
        let mut store = ParticleStore::with_capacity(n);
        for (i, z) in store.z.iter_mut().enumerate() {
            *z = if i % 3 == 0 { -1.0 } else { 5.0 };
        }
        let expected = (0..n).filter(|i| i % 3 == 0).count();
        assert_eq!(ground_count(&store, Execution::Parallel), expected);
        assert_eq!(ground_count(&store, Execution::Serial), expected);
    }

    #[test]
    fn census_leaves_state_untouched() {
        let mut store = ParticleStore::with_capacity(4);
        store.z = vec![-1.0, 2.0, 0.0, 3.0];
        let before = store.clone();
        let _ = ground_count_parallel(&store);
        assert_eq!(store, before);
    }

    #[test]
    fn empty_store_has_nobody_on_ground() {
        let store = ParticleStore::default();
        assert_eq!(ground_count_parallel(&store), 0);
    }
}
