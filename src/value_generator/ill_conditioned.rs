use std::iter::{ExactSizeIterator, FusedIterator};

/// An iterator over one `large` value followed by `num - 1` copies of `small`
///
/// When `small` is below half an ulp of `large`, naive left-to-right summation
/// drops every small term, while a compensated sum recovers them.
pub struct IllConditionedGenerator {
    large: f64,
    small: f64,
    position: usize,
    num: usize,
}

impl IllConditionedGenerator {
    pub fn new(large: f64, small: f64, num: usize) -> IllConditionedGenerator {
        IllConditionedGenerator {
            large,
            small,
            position: 0,
            num,
        }
    }

    /// The mathematically exact sum of the whole sequence, rounded once
    pub fn exact_sum(&self) -> f64 {
        if self.num == 0 {
            0.
        } else {
            self.large + self.small * (self.num - 1) as f64
        }
    }
}

impl Iterator for IllConditionedGenerator {
    type Item = f64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position == self.num {
            return None;
        }
        let r = if self.position == 0 {
            self.large
        } else {
            self.small
        };
        self.position += 1;
        Some(r)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.num - self.position;
        (size, Some(size))
    }
}

impl FusedIterator for IllConditionedGenerator {}

impl ExactSizeIterator for IllConditionedGenerator {}
