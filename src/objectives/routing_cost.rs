use super::{Objective, ObjectiveArgs};
use crate::error::Result;
use crate::mapping::Individual;
use crate::model::{ArrayModel, Application, SimParams};

/// The routing cost the evaluation pipeline left on the candidate.
/// Infeasible candidates carry a penalty-inflated value here, which is what
/// steers selection away from them without ever raising an error.
#[derive(Debug, Default)]
pub struct RoutingCost;

impl RoutingCost {
    pub fn from_args(args: &ObjectiveArgs) -> Result<Self> {
        args.expect_keys(&[])?;
        Ok(Self)
    }
}

impl Objective for RoutingCost {
    fn name(&self) -> &str {
        "routing_cost"
    }

    fn minimize(&self) -> bool {
        true
    }

    fn eval(
        &self,
        _model: &ArrayModel,
        _app: &Application,
        _sim: &SimParams,
        individual: &Individual,
    ) -> f64 {
        individual.routing_cost()
    }
}
