//! Optimization objectives.
//!
//! Objectives are capability collaborators scoring one candidate at a time.
//! They run after routing, on valid and invalid candidates alike, and read
//! only what the evaluation pipeline left on the candidate.

pub mod latency;
pub mod map_width;
pub mod registry;
pub mod resource_usage;
pub mod routing_cost;

pub use latency::Latency;
pub use map_width::MappingWidth;
pub use registry::{ObjectiveRegistry, RouterRegistry};
pub use resource_usage::ResourceUsage;
pub use routing_cost::RoutingCost;

use crate::error::{CgramapError, Result};
use crate::mapping::Individual;
use crate::model::{ArrayModel, Application, SimParams};
use std::collections::BTreeMap;

/// Scoring capability. `minimize()` fixes the optimization direction for
/// the run; `eval` must be total (no candidate may fail to score).
pub trait Objective: Send + Sync {
    fn name(&self) -> &str;
    fn minimize(&self) -> bool;
    fn eval(
        &self,
        model: &ArrayModel,
        app: &Application,
        sim: &SimParams,
        individual: &Individual,
    ) -> f64;
}

/// Structured per-objective arguments from the run configuration.
///
/// Getters are strict: a present key with the wrong type is a configuration
/// error, and constructors reject keys they do not understand.
#[derive(Debug, Clone, Default)]
pub struct ObjectiveArgs {
    values: BTreeMap<String, toml::Value>,
}

impl ObjectiveArgs {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_table(table: toml::value::Table) -> Self {
        Self {
            values: table.into_iter().collect(),
        }
    }

    /// Reject any key outside `allowed`.
    pub fn expect_keys(&self, allowed: &[&str]) -> Result<()> {
        for key in self.values.keys() {
            if !allowed.contains(&key.as_str()) {
                return Err(CgramapError::Configuration(format!(
                    "unknown objective argument '{key}'"
                )));
            }
        }
        Ok(())
    }

    pub fn get_f64(&self, key: &str) -> Result<Option<f64>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(toml::Value::Float(v)) => Ok(Some(*v)),
            Some(toml::Value::Integer(v)) => Ok(Some(*v as f64)),
            Some(other) => Err(type_error(key, "number", other)),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(toml::Value::Boolean(v)) => Ok(Some(*v)),
            Some(other) => Err(type_error(key, "boolean", other)),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<Option<&str>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(toml::Value::String(v)) => Ok(Some(v)),
            Some(other) => Err(type_error(key, "string", other)),
        }
    }
}

fn type_error(key: &str, wanted: &str, got: &toml::Value) -> CgramapError {
    CgramapError::Configuration(format!(
        "objective argument '{key}' must be a {wanted}, got {}",
        got.type_str()
    ))
}
