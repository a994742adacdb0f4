use crate::kahan::KahanSum;
use crate::Operation;

/// Ungrouped average, the single-bucket counterpart of
/// [`GroupingAvgAggregator`](crate::avg::GroupingAvgAggregator)
pub struct MeanOperation {
    count: u64,
    sum: KahanSum,
}

impl Operation for MeanOperation {
    type Item = f64;
    type Output = f64;

    fn create() -> Self {
        MeanOperation {
            count: 0,
            sum: KahanSum::new(),
        }
    }

    fn update(&mut self, value: Self::Item) {
        self.count += 1;
        self.sum.add(value);
    }

    fn merge_with(&mut self, other: Self) {
        self.count += other.count;
        self.sum.merge(other.sum);
    }

    fn finish(self) -> Self::Output {
        self.sum.value() / (self.count as f64)
    }
}
