//! Candidate evaluation: the staged routing pipeline and the worker pool
//! that runs it over whole batches.

pub mod parallel;
pub mod pipeline;

pub use parallel::ParallelEvaluator;
pub use pipeline::{evaluate, EvalContext};
