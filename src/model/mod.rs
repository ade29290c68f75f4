//! Hardware-side models: the array the mappings target and the timing
//! parameters objectives score against.

pub mod application;
pub mod array;

pub use application::{AppNode, Application, OpKind, SubGraph};
pub use array::{ArrayModel, RouteNode};

use serde::{Deserialize, Serialize};

/// Timing parameters consumed by delay-sensitive objectives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimParams {
    /// Delay of one functional-unit stage.
    pub alu_delay: f64,
    /// Delay of one switching-element hop.
    pub se_delay: f64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            alu_delay: 1.0,
            se_delay: 1.0,
        }
    }
}
