/// Add `(value_to_add, delta_to_add)` to the running sum `value` whose
/// Kahan correction term is `delta`
///
/// A non-finite `value_to_add` goes straight into the running sum, turning it
/// into +/-Infinity or NaN without touching the correction. Once the running
/// sum is non-finite, finite contributions are ignored. Both rules keep the
/// results identical to plain summation whenever Inf or NaN is involved.
#[inline]
pub fn compensated_add(value: &mut f64, delta: &mut f64, value_to_add: f64, delta_to_add: f64) {
    if !value_to_add.is_finite() {
        *value += value_to_add;
    }

    if value.is_finite() {
        let corrected_sum = value_to_add + (*delta + delta_to_add);
        let updated_value = *value + corrected_sum;
        *delta = corrected_sum - (updated_value - *value);
        *value = updated_value;
    }
}

/// A single compensated running sum
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct KahanSum {
    value: f64,
    delta: f64,
}

impl KahanSum {
    pub fn new() -> Self {
        KahanSum {
            value: 0.,
            delta: 0.,
        }
    }

    pub fn add(&mut self, value: f64) {
        compensated_add(&mut self.value, &mut self.delta, value, 0.);
    }

    /// Fold another partial sum, including its pending correction, into this one
    pub fn merge(&mut self, other: KahanSum) {
        compensated_add(&mut self.value, &mut self.delta, other.value, other.delta);
    }

    /// The running sum, without the pending correction
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }
}
