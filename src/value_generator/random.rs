use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use std::iter::{ExactSizeIterator, FusedIterator};

/// An iterator that will generate `num` random `(group_id, value)` rows,
/// with group ids uniformly drawn from `0..groups` and values from `[0, 1)`
pub struct RandomGenerator {
    groups: i64,
    remaining: usize,
    rng: Pcg64,
}

impl RandomGenerator {
    pub fn new(groups: i64, num: usize, seed: u64) -> RandomGenerator {
        assert!(groups > 0);
        RandomGenerator {
            groups,
            remaining: num,
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    /// Collect all rows into separate group id and value columns
    pub fn into_columns(self) -> (Vec<i64>, Vec<f64>) {
        self.unzip()
    }
}

impl Iterator for RandomGenerator {
    type Item = (i64, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let group_id = self.rng.gen_range(0, self.groups);
        let value = self.rng.gen();
        Some((group_id, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl FusedIterator for RandomGenerator {}

impl ExactSizeIterator for RandomGenerator {}
