//! Candidate genomes and the placement strategies that seed them.

pub mod individual;
pub mod placer;

pub use individual::{crossover, mutate, Individual};
pub use placer::{Placer, PlacementMethod};
