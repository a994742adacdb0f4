//! Columnar blocks exchanged with the surrounding execution engine
//!
//! Only what the aggregators read and produce is modelled here: numeric
//! columns, pages of columns addressed by channel, and opaque blocks carrying
//! one serialized partial state.

use bytes::Bytes;

/// A single column of values
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Long(Vec<i64>),
    Double(Vec<f64>),
    AggregatorState(AggregatorStateBlock),
}

impl Block {
    /// Number of rows in this block
    /// An aggregator state block always holds a single position
    pub fn position_count(&self) -> usize {
        match self {
            Block::Long(values) => values.len(),
            Block::Double(values) => values.len(),
            Block::AggregatorState(_) => 1,
        }
    }

    /// Read a row as a long
    /// Return None for an out-of-bounds position or a non-long block
    pub fn get_long(&self, position: usize) -> Option<i64> {
        match self {
            Block::Long(values) => values.get(position).copied(),
            _ => None,
        }
    }

    /// Read a row as a double, widening long values
    /// Return None for an out-of-bounds position or a non-numeric block
    pub fn get_double(&self, position: usize) -> Option<f64> {
        match self {
            Block::Long(values) => values.get(position).map(|&v| v as f64),
            Block::Double(values) => values.get(position).copied(),
            Block::AggregatorState(_) => None,
        }
    }

    /// Short name of the block kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Long(_) => "Long",
            Block::Double(_) => "Double",
            Block::AggregatorState(_) => "AggregatorState",
        }
    }
}

impl From<Vec<i64>> for Block {
    fn from(values: Vec<i64>) -> Block {
        Block::Long(values)
    }
}

impl From<Vec<f64>> for Block {
    fn from(values: Vec<f64>) -> Block {
        Block::Double(values)
    }
}

impl From<AggregatorStateBlock> for Block {
    fn from(block: AggregatorStateBlock) -> Block {
        Block::AggregatorState(block)
    }
}

/// The serialized form of one partial aggregation state
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorStateBlock {
    data: Bytes,
}

impl AggregatorStateBlock {
    pub fn new(data: impl Into<Bytes>) -> Self {
        AggregatorStateBlock { data: data.into() }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

/// A batch of rows, stored as one block per channel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    blocks: Vec<Block>,
}

impl Page {
    pub fn new(blocks: Vec<Block>) -> Self {
        Page { blocks }
    }

    pub fn block(&self, channel: usize) -> Option<&Block> {
        self.blocks.get(channel)
    }

    pub fn channel_count(&self) -> usize {
        self.blocks.len()
    }

    /// Number of rows, taken from the first block
    pub fn position_count(&self) -> usize {
        self.blocks.first().map_or(0, Block::position_count)
    }
}
