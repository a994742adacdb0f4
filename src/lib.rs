#[cfg(test)]
mod tests;

pub mod avg;

pub mod block;

pub mod error;

pub mod kahan;

pub mod mean;

#[cfg(any(test, feature = "value-generator"))]
pub mod value_generator;

pub use block::{AggregatorStateBlock, Block, Page};
pub use error::{AggregationError, Result};

use bytes::BufMut;

/// A streaming aggregation over a single bucket
pub trait Operation {
    type Item;
    type Output;

    fn create() -> Self;

    fn update(&mut self, value: Self::Item);

    fn merge_with(&mut self, other: Self);

    fn finish(self) -> Self::Output;
}

/// An aggregation computed independently for each group id
///
/// Group ids come in a `Long` block with one row per input row (raw input)
/// or one row per position of the partial state (intermediate input).
pub trait GroupingOperation {
    /// Accumulate raw values from a page
    fn add_raw_input(&mut self, group_ids: &Block, page: &Page) -> Result<()>;

    /// Merge a partial state produced by [`evaluate_intermediate`](Self::evaluate_intermediate)
    fn add_intermediate_input(&mut self, group_ids: &Block, block: &Block) -> Result<()>;

    /// Snapshot the current state for a downstream merge
    /// The aggregator keeps its state and can continue accumulating
    fn evaluate_intermediate(&self) -> Result<Block>;

    /// Compute the result of every group, indexed by group id
    fn evaluate_final(&self) -> Result<Block>;
}

/// Encode and decode an aggregation state as a sequence of fixed-size records
pub trait StateSerializer<S> {
    /// Size in bytes of one record
    fn size(&self) -> usize;

    /// Write the state at the end of `buf` and return the number of bytes written
    fn serialize<B: BufMut>(&self, state: &S, buf: &mut B) -> Result<usize>;

    /// Read a state starting at `offset`
    fn deserialize(&self, bytes: &[u8], offset: usize) -> Result<S>;
}
