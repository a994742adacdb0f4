use super::state::GroupingAvgState;
use crate::error::{AggregationError, Result};
use crate::StateSerializer;
use bytes::{Buf, BufMut};
use std::convert::TryFrom;

/// Size of the leading position count
pub const HEADER_BYTES: usize = 8;

/// Size of one `(value: f64, delta: f64, count: i64)` record
pub const RECORD_BYTES: usize = 8 + 8 + 8;

/// Encode a [`GroupingAvgState`] as:
///
/// ```text
/// positions: u64
/// positions * (value: f64, delta: f64, count: i64)
/// ```
///
/// All fields are big-endian and records are written in group id order, from
/// 0 to `largest_group_id`. The layout has no version field: any change to it
/// breaks merging between nodes running different versions.
#[derive(Debug, Copy, Clone, Default)]
pub struct AvgStateSerializer;

impl AvgStateSerializer {
    /// Number of bytes needed to serialize the given state
    pub fn serialized_len(&self, state: &GroupingAvgState) -> usize {
        HEADER_BYTES + RECORD_BYTES * state.positions()
    }
}

impl StateSerializer<GroupingAvgState> for AvgStateSerializer {
    fn size(&self) -> usize {
        RECORD_BYTES
    }

    fn serialize<B: BufMut>(&self, state: &GroupingAvgState, buf: &mut B) -> Result<usize> {
        let needed = self.serialized_len(state);
        if buf.remaining_mut() < needed {
            return Err(AggregationError::BufferOverflow {
                needed,
                available: buf.remaining_mut(),
            });
        }

        buf.put_u64(state.positions() as u64);
        let records = state
            .values()
            .iter()
            .zip(state.deltas())
            .zip(state.counts());
        for ((&value, &delta), &count) in records {
            buf.put_f64(value);
            buf.put_f64(delta);
            buf.put_i64(count);
        }
        Ok(needed)
    }

    fn deserialize(&self, bytes: &[u8], offset: usize) -> Result<GroupingAvgState> {
        let mut buf = bytes.get(offset..).ok_or(AggregationError::BufferUnderflow {
            needed: offset,
            available: bytes.len(),
        })?;
        if buf.remaining() < HEADER_BYTES {
            return Err(AggregationError::BufferUnderflow {
                needed: HEADER_BYTES,
                available: buf.remaining(),
            });
        }

        let positions = buf.get_u64();
        if positions == 0 {
            return Err(AggregationError::InvalidState(
                "serialized state has no positions".to_string(),
            ));
        }
        let positions = usize::try_from(positions)
            .ok()
            .filter(|&p| p.checked_mul(RECORD_BYTES).is_some())
            .ok_or_else(|| {
                AggregationError::InvalidState(format!("position count {} is too large", positions))
            })?;
        let needed = positions * RECORD_BYTES;
        if buf.remaining() < needed {
            return Err(AggregationError::BufferUnderflow {
                needed,
                available: buf.remaining(),
            });
        }

        let mut values = Vec::with_capacity(positions);
        let mut deltas = Vec::with_capacity(positions);
        let mut counts = Vec::with_capacity(positions);
        for _ in 0..positions {
            values.push(buf.get_f64());
            deltas.push(buf.get_f64());
            counts.push(buf.get_i64());
        }
        Ok(GroupingAvgState::from_parts(values, deltas, counts))
    }
}
