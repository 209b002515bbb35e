//! Compares three ways of awaiting two independent delayed computations:
//! one after the other, fanned out onto a worker pool and joined, and zipped
//! together as single-item streams. Every style yields the same product of
//! the two values; only the elapsed wall-clock time differs.

pub mod error;
pub mod harness;
pub mod producer;
pub mod timer;

pub use error::CombineError;
pub use harness::{combine, ExecutionResult, Strategy};
pub use producer::DelayedProducer;
