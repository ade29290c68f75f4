use super::{Objective, ObjectiveArgs};
use crate::error::Result;
use crate::mapping::Individual;
use crate::model::{ArrayModel, Application, SimParams};

/// Mapping width: rightmost column any routed resource occupies, plus one.
/// Falls back to the bare mapping when the candidate has no routed graph
/// yet. Minimized, so the optimizer squeezes mappings toward the west edge.
#[derive(Debug, Default)]
pub struct MappingWidth;

impl MappingWidth {
    pub fn from_args(args: &ObjectiveArgs) -> Result<Self> {
        args.expect_keys(&[])?;
        Ok(Self)
    }
}

impl Objective for MappingWidth {
    fn name(&self) -> &str {
        "mapping_width"
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
        let routed_max = individual
            .routing_graph()
            .node_weights()
            .filter_map(|n| n.x())
            .max();
        let max_x = routed_max
            .or_else(|| individual.mapping().values().map(|c| c.x).max())
            .unwrap_or(0);
        (max_x + 1) as f64
    }
}
