//! Multi-objective mapping optimization for CGRA-style processing arrays.
//!
//! An application dataflow graph is placed onto a rectangular array of
//! functional units, routed over the interconnect and scored against a
//! configurable set of objectives. An NSGA-II loop evolves the placements
//! and returns the final non-dominated archive.

pub mod config;
pub mod engines;
pub mod error;
pub mod mapping;
pub mod model;
pub mod objectives;
pub mod routing;
pub mod types;

pub use error::{CgramapError, Result};
