//! Aggregation error types

use thiserror::Error;

/// Aggregation errors
///
/// Every variant signals a wiring or input bug in the caller. Numeric
/// overflow and NaN are never reported here: they propagate as IEEE-754
/// values through the accumulated state.
#[derive(Debug, Error, PartialEq)]
pub enum AggregationError {
    #[error("Invalid input channel: {0}")]
    InvalidChannel(i32),

    #[error("Page has no block at channel {0}")]
    MissingChannel(usize),

    #[error("{operation} is not allowed in {mode} mode")]
    WrongMode {
        operation: &'static str,
        mode: &'static str,
    },

    #[error("Expected {expected} block, got: {actual}")]
    UnexpectedBlock {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Group ids and values differ in length: {group_ids} group ids, {values} values")]
    LengthMismatch { group_ids: usize, values: usize },

    #[error("Group id {0} cannot be used as an index")]
    GroupIdOutOfRange(i64),

    #[error("Buffer overflow: needed {needed} bytes, had {available}")]
    BufferOverflow { needed: usize, available: usize },

    #[error("Buffer underflow: needed {needed} bytes, had {available}")]
    BufferUnderflow { needed: usize, available: usize },

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type for aggregation operations
pub type Result<T> = std::result::Result<T, AggregationError>;
