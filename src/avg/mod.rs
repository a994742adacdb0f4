//! Grouped average
//!
//! A [`GroupingAvgAggregator`] either consumes raw values from one channel of
//! each page (`Raw` mode), or merges partial states produced by other raw
//! aggregators (`Intermediate` mode). Both can emit their state for a further
//! merge, or the final per-group averages.
//!
//! Parallel aggregation runs one raw aggregator per worker and merges their
//! intermediate blocks into a single intermediate aggregator:
//!
//! ```
//! use grouped_avg::avg::GroupingAvgAggregator;
//! use grouped_avg::{Block, GroupingOperation};
//!
//! let mut left = GroupingAvgAggregator::create(0).unwrap();
//! left.add_raw(&[0, 1], &[2., 3.]).unwrap();
//! let mut right = GroupingAvgAggregator::create(0).unwrap();
//! right.add_raw(&[0, 1], &[4., 5.]).unwrap();
//!
//! let mut merged = GroupingAvgAggregator::create_intermediate();
//! for worker in &[left, right] {
//!     let block = worker.evaluate_intermediate().unwrap();
//!     merged.add_intermediate_input(&vec![0i64, 1].into(), &block).unwrap();
//! }
//! assert_eq!(merged.evaluate_final().unwrap(), Block::Double(vec![3., 4.]));
//! ```

mod serializer;
mod state;

pub use serializer::{AvgStateSerializer, HEADER_BYTES, RECORD_BYTES};
pub use state::{GroupingAvgState, MAX_GROUP_ID};

use crate::block::{AggregatorStateBlock, Block, Page};
use crate::error::{AggregationError, Result};
use crate::{GroupingOperation, StateSerializer};
use state::narrow_group_ids;
use std::borrow::Cow;
use std::convert::TryFrom;
use std::fmt;
use tracing::{debug, warn};

/// Where an aggregator reads its input from, fixed at construction
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AggregatorMode {
    /// Raw values, read from the given channel of each page
    Raw { channel: usize },
    /// Partial states emitted by other aggregators
    Intermediate,
}

impl AggregatorMode {
    fn name(self) -> &'static str {
        match self {
            AggregatorMode::Raw { .. } => "Raw",
            AggregatorMode::Intermediate => "Intermediate",
        }
    }
}

impl fmt::Display for AggregatorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregatorMode::Raw { channel } => write!(f, "Raw(channel = {})", channel),
            AggregatorMode::Intermediate => write!(f, "Intermediate"),
        }
    }
}

/// Average of the values in each group, with compensated summation
#[derive(Debug, Clone)]
pub struct GroupingAvgAggregator {
    mode: AggregatorMode,
    state: GroupingAvgState,
    serializer: AvgStateSerializer,
}

impl GroupingAvgAggregator {
    /// Create an aggregator of raw values read from `input_channel`
    pub fn create(input_channel: i32) -> Result<Self> {
        let channel = usize::try_from(input_channel)
            .map_err(|_| AggregationError::InvalidChannel(input_channel))?;
        Ok(Self::with_mode(AggregatorMode::Raw { channel }))
    }

    /// Create an aggregator that merges partial states
    pub fn create_intermediate() -> Self {
        Self::with_mode(AggregatorMode::Intermediate)
    }

    fn with_mode(mode: AggregatorMode) -> Self {
        debug!(%mode, "creating grouping avg aggregator");
        GroupingAvgAggregator {
            mode,
            state: GroupingAvgState::new(),
            serializer: AvgStateSerializer,
        }
    }

    pub fn mode(&self) -> AggregatorMode {
        self.mode
    }

    pub fn state(&self) -> &GroupingAvgState {
        &self.state
    }

    /// Add one value per row to the group of that row
    /// Nothing is added if any group id is invalid
    pub fn add_raw(&mut self, group_ids: &[i64], values: &[f64]) -> Result<()> {
        self.require_raw("add_raw")?;
        if group_ids.len() != values.len() {
            return Err(AggregationError::LengthMismatch {
                group_ids: group_ids.len(),
                values: values.len(),
            });
        }
        let group_ids = narrow_group_ids(group_ids)?;
        for (group_id, &value) in group_ids.into_iter().zip(values) {
            self.state.add_single(value, group_id);
        }
        Ok(())
    }

    /// Merge a decoded partial state, where position `i` of `partial` belongs
    /// to group `group_ids[i]`
    pub fn add_intermediate(&mut self, group_ids: &[i64], partial: &GroupingAvgState) -> Result<()> {
        self.require_intermediate("add_intermediate")?;
        debug!(
            positions = partial.positions(),
            "merging grouping avg intermediate state"
        );
        self.state.add_intermediate(group_ids, partial)
    }

    fn require_raw(&self, operation: &'static str) -> Result<usize> {
        match self.mode {
            AggregatorMode::Raw { channel } => Ok(channel),
            mode => Err(AggregationError::WrongMode {
                operation,
                mode: mode.name(),
            }),
        }
    }

    fn require_intermediate(&self, operation: &'static str) -> Result<()> {
        match self.mode {
            AggregatorMode::Intermediate => Ok(()),
            mode => Err(AggregationError::WrongMode {
                operation,
                mode: mode.name(),
            }),
        }
    }
}

impl GroupingOperation for GroupingAvgAggregator {
    fn add_raw_input(&mut self, group_ids: &Block, page: &Page) -> Result<()> {
        let channel = self.require_raw("add_raw_input")?;
        let block = page
            .block(channel)
            .ok_or(AggregationError::MissingChannel(channel))?;
        let group_ids = long_values(group_ids)?;
        let values = match block {
            Block::Double(values) => Cow::Borrowed(values.as_slice()),
            Block::Long(values) => Cow::Owned(values.iter().map(|&v| v as f64).collect()),
            other => {
                warn!(kind = other.kind(), channel, "unexpected raw input block");
                return Err(AggregationError::UnexpectedBlock {
                    expected: "Double",
                    actual: other.kind(),
                });
            }
        };
        self.add_raw(group_ids, &values)
    }

    fn add_intermediate_input(&mut self, group_ids: &Block, block: &Block) -> Result<()> {
        self.require_intermediate("add_intermediate_input")?;
        let state_block = match block {
            Block::AggregatorState(state_block) => state_block,
            other => {
                warn!(kind = other.kind(), "unexpected intermediate input block");
                return Err(AggregationError::UnexpectedBlock {
                    expected: "AggregatorState",
                    actual: other.kind(),
                });
            }
        };
        let partial = self.serializer.deserialize(state_block.data(), 0)?;
        self.add_intermediate(long_values(group_ids)?, &partial)
    }

    fn evaluate_intermediate(&self) -> Result<Block> {
        let mut data = Vec::with_capacity(self.serializer.serialized_len(&self.state));
        self.serializer.serialize(&self.state, &mut data)?;
        Ok(AggregatorStateBlock::new(data).into())
    }

    fn evaluate_final(&self) -> Result<Block> {
        Ok(Block::Double(self.state.means()))
    }
}

fn long_values(block: &Block) -> Result<&[i64]> {
    match block {
        Block::Long(values) => Ok(values.as_slice()),
        other => Err(AggregationError::UnexpectedBlock {
            expected: "Long",
            actual: other.kind(),
        }),
    }
}
