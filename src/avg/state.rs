use crate::error::{AggregationError, Result};
use crate::kahan::compensated_add;
use std::convert::TryFrom;
use tracing::trace;

/// Largest group id accepted at the boundary
pub const MAX_GROUP_ID: i64 = i32::MAX as i64;

/// Running sums, Kahan corrections and counts, indexed by group id
///
/// The three columns always have the same length (the capacity), and every
/// group id up to `largest_group_id` is a valid index. The capacity only grows.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupingAvgState {
    values: Vec<f64>,
    deltas: Vec<f64>,
    counts: Vec<i64>,
    largest_group_id: usize,
}

impl GroupingAvgState {
    /// Create an empty state, with a single zeroed slot
    pub fn new() -> Self {
        GroupingAvgState::from_parts(vec![0.], vec![0.], vec![0])
    }

    /// Build a state that tracks exactly the given positions
    /// Panics if the columns differ in length or are empty
    pub(crate) fn from_parts(values: Vec<f64>, deltas: Vec<f64>, counts: Vec<i64>) -> Self {
        assert!(!values.is_empty(), "A state holds at least one position");
        assert!(
            values.len() == deltas.len() && values.len() == counts.len(),
            "All state columns must have the same length"
        );
        let largest_group_id = values.len() - 1;
        GroupingAvgState {
            values,
            deltas,
            counts,
            largest_group_id,
        }
    }

    /// Add a raw value to a group
    pub fn add_single(&mut self, value: f64, group_id: usize) {
        self.add_weighted(value, 0., group_id, 1);
    }

    /// Add a partial result to a group: a sum with its pending correction and
    /// the number of values it stands for
    pub fn add_weighted(&mut self, value: f64, delta: f64, group_id: usize, increment: i64) {
        self.ensure_capacity(group_id);
        if group_id > self.largest_group_id {
            self.largest_group_id = group_id;
        }
        compensated_add(
            &mut self.values[group_id],
            &mut self.deltas[group_id],
            value,
            delta,
        );
        self.counts[group_id] += increment;
    }

    /// Fold another state in, position by position
    /// `group_ids[i]` is the destination group for position `i` of `partial`
    pub fn add_intermediate(&mut self, group_ids: &[i64], partial: &GroupingAvgState) -> Result<()> {
        if group_ids.len() != partial.positions() {
            return Err(AggregationError::LengthMismatch {
                group_ids: group_ids.len(),
                values: partial.positions(),
            });
        }
        let group_ids = narrow_group_ids(group_ids)?;
        for (i, group_id) in group_ids.into_iter().enumerate() {
            self.add_weighted(
                partial.values[i],
                partial.deltas[i],
                group_id,
                partial.counts[i],
            );
        }
        Ok(())
    }

    /// Grow all columns so that `group_id` is a valid index
    /// Capacity doubles until it fits; existing slots are never moved or
    /// changed and new slots start at zero
    pub fn ensure_capacity(&mut self, group_id: usize) {
        let capacity = self.capacity();
        if group_id < capacity {
            return;
        }
        let mut new_capacity = capacity.max(1);
        while new_capacity <= group_id {
            new_capacity <<= 1;
        }
        trace!(from = capacity, to = new_capacity, "growing grouping avg state");
        self.values.resize(new_capacity, 0.);
        self.deltas.resize(new_capacity, 0.);
        self.counts.resize(new_capacity, 0);
    }

    /// Per-group averages for groups `0..=largest_group_id`
    /// A group that never received a value yields NaN
    pub fn means(&self) -> Vec<f64> {
        let positions = self.positions();
        self.values[..positions]
            .iter()
            .zip(&self.counts[..positions])
            .map(|(&value, &count)| value / count as f64)
            .collect()
    }

    /// Running sums of the tracked groups
    pub fn values(&self) -> &[f64] {
        &self.values[..self.positions()]
    }

    /// Kahan corrections of the tracked groups
    pub fn deltas(&self) -> &[f64] {
        &self.deltas[..self.positions()]
    }

    /// Number of contributions of the tracked groups
    pub fn counts(&self) -> &[i64] {
        &self.counts[..self.positions()]
    }

    pub fn largest_group_id(&self) -> usize {
        self.largest_group_id
    }

    /// Number of tracked groups, that is `largest_group_id + 1`
    pub fn positions(&self) -> usize {
        self.largest_group_id + 1
    }

    /// Number of allocated slots, always greater than `largest_group_id`
    pub fn capacity(&self) -> usize {
        self.values.len()
    }
}

impl Default for GroupingAvgState {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert wide group ids into indexes
/// The whole slice is checked before anything is returned, so callers can
/// reject a batch without applying part of it
pub(crate) fn narrow_group_ids(group_ids: &[i64]) -> Result<Vec<usize>> {
    group_ids
        .iter()
        .map(|&group_id| narrow_group_id(group_id))
        .collect()
}

fn narrow_group_id(group_id: i64) -> Result<usize> {
    if group_id < 0 || group_id > MAX_GROUP_ID {
        return Err(AggregationError::GroupIdOutOfRange(group_id));
    }
    usize::try_from(group_id).map_err(|_| AggregationError::GroupIdOutOfRange(group_id))
}
