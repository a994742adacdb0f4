//! Deterministic inputs for tests and benchmarks

mod ill_conditioned;
mod random;

pub use ill_conditioned::*;
pub use random::*;
