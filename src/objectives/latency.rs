use super::{Objective, ObjectiveArgs};
use crate::error::Result;
use crate::mapping::Individual;
use crate::model::{ArrayModel, Application, SimParams};
use petgraph::graph::NodeIndex;
use petgraph::Direction;
use std::collections::HashMap;

/// Critical-path latency estimate: longest root-to-sink path through the
/// computation DAG, charging `alu_delay` per operation stage and `se_delay`
/// per switch hop between the cells the endpoints are mapped to.
#[derive(Debug, Default)]
pub struct Latency;

impl Latency {
    pub fn from_args(args: &ObjectiveArgs) -> Result<Self> {
        args.expect_keys(&[])?;
        Ok(Self)
    }
}

impl Objective for Latency {
    fn name(&self) -> &str {
        "latency"
    }

    fn minimize(&self) -> bool {
        true
    }

    fn eval(
        &self,
        _model: &ArrayModel,
        app: &Application,
        sim: &SimParams,
        individual: &Individual,
    ) -> f64 {
        let mapping = individual.mapping();
        let hop = |a: NodeIndex, b: NodeIndex| -> f64 {
            match (mapping.get(&a), mapping.get(&b)) {
                (Some(pa), Some(pb)) => pa.distance(pb) as f64 * sim.se_delay,
                _ => 0.0,
            }
        };

        // op_levels is topologically ordered, so one forward pass suffices
        let mut arrival: HashMap<NodeIndex, f64> = HashMap::new();
        let mut worst: f64 = 0.0;
        for level in app.op_levels() {
            for &op in level {
                let at = app
                    .graph()
                    .neighbors_directed(op, Direction::Incoming)
                    .filter(|p| arrival.contains_key(p))
                    .map(|p| arrival[&p] + hop(p, op))
                    .fold(0.0, f64::max)
                    + sim.alu_delay;
                worst = worst.max(at);
                arrival.insert(op, at);
            }
        }
        worst
    }
}
