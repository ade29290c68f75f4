use crate::mapping::Individual;
use crate::model::{ArrayModel, Application, SimParams};
use crate::objectives::Objective;
use crate::routing::{Router, RoutingGraph};
use crate::types::Mapping;
use std::sync::Arc;

/// Everything a worker needs to score one candidate. Immutable and cheap to
/// clone; workers never see the engine itself.
#[derive(Clone)]
pub struct EvalContext {
    pub model: Arc<ArrayModel>,
    pub app: Arc<Application>,
    pub sim: SimParams,
    pub router: Arc<dyn Router>,
    pub objectives: Arc<Vec<Arc<dyn Objective>>>,
}

impl EvalContext {
    pub fn new(
        model: Arc<ArrayModel>,
        app: Arc<Application>,
        sim: SimParams,
        router: Arc<dyn Router>,
        objectives: Arc<Vec<Arc<dyn Objective>>>,
    ) -> Self {
        Self {
            model,
            app,
            sim,
            router,
            objectives,
        }
    }
}

/// Route the candidate if needed, then score every objective in registered
/// order. Runs for valid and invalid candidates alike; an infeasible route
/// leaves a penalty-inflated routing cost behind as the discouraging signal.
pub fn evaluate(ctx: &EvalContext, individual: &mut Individual) {
    route(ctx, individual);
    let fitness: Vec<f64> = ctx
        .objectives
        .iter()
        .map(|objective| objective.eval(&ctx.model, &ctx.app, &ctx.sim, individual))
        .collect();
    individual.set_fitness(fitness);
}

enum StageOutcome {
    /// A stage boundary pushed the running total past the penalty.
    Overrun(f64),
    /// All four stages stayed within budget.
    Routed(f64),
}

/// Staged routing with early exit. Already-valid candidates are untouched,
/// which makes re-evaluation of carried-over candidates a pure re-score.
fn route(ctx: &EvalContext, individual: &mut Individual) {
    if individual.is_valid() {
        return;
    }

    let penalty = ctx.router.penalty_cost();
    let preg_enabled = ctx.model.preg_count() > 0;

    let outcome = {
        let (mapping, preg, graph) = individual.routing_parts_mut();
        let pregs = if preg_enabled { preg } else { None };
        run_stages(ctx, mapping, pregs, graph, penalty)
    };

    match outcome {
        StageOutcome::Overrun(cost) => {
            individual.set_routing_cost(cost + penalty);
        }
        StageOutcome::Routed(cost) => {
            individual.set_routing_cost(cost);
            ctx.router.clean_graph(individual.routing_graph_mut());
            individual.validate();
        }
    }
}

fn run_stages(
    ctx: &EvalContext,
    mapping: &Mapping,
    pregs: Option<&[bool]>,
    graph: &mut RoutingGraph,
    penalty: f64,
) -> StageOutcome {
    let router = &ctx.router;
    let model = &ctx.model;
    let app = &ctx.app;

    let mut cost = router.route_computation(model, app.computation(), mapping, graph);
    if cost > penalty {
        return StageOutcome::Overrun(cost);
    }

    cost += router.route_constants(model, app.constants(), mapping, graph);
    if cost > penalty {
        return StageOutcome::Overrun(cost);
    }

    cost += router.route_inputs(model, app.inputs(), mapping, graph);
    if cost > penalty {
        return StageOutcome::Overrun(cost);
    }

    cost += router.route_outputs(model, app.outputs(), mapping, graph, pregs);
    if cost > penalty {
        return StageOutcome::Overrun(cost);
    }

    StageOutcome::Routed(cost)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::Result;
    use crate::model::SubGraph;
    use crate::objectives::ObjectiveArgs;
    use crate::objectives::RoutingCost;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Router stub returning a fixed cost per stage and counting how many
    /// stages actually ran.
    pub(crate) struct StageCostRouter {
        pub comp: f64,
        pub consts: f64,
        pub inputs: f64,
        pub outputs: f64,
        pub penalty: f64,
        pub stages_run: AtomicUsize,
    }

    impl StageCostRouter {
        pub fn flat(stage: f64, penalty: f64) -> Self {
            Self {
                comp: stage,
                consts: stage,
                inputs: stage,
                outputs: stage,
                penalty,
                stages_run: AtomicUsize::new(0),
            }
        }
    }

    impl Router for StageCostRouter {
        fn set_default_weights(&self, _model: &mut ArrayModel) {}

        fn penalty_cost(&self) -> f64 {
            self.penalty
        }

        fn route_computation(
            &self,
            _m: &ArrayModel,
            _s: &SubGraph,
            _map: &Mapping,
            _g: &mut RoutingGraph,
        ) -> f64 {
            self.stages_run.fetch_add(1, Ordering::Relaxed);
            self.comp
        }

        fn route_constants(
            &self,
            _m: &ArrayModel,
            _s: &SubGraph,
            _map: &Mapping,
            _g: &mut RoutingGraph,
        ) -> f64 {
            self.stages_run.fetch_add(1, Ordering::Relaxed);
            self.consts
        }

        fn route_inputs(
            &self,
            _m: &ArrayModel,
            _s: &SubGraph,
            _map: &Mapping,
            _g: &mut RoutingGraph,
        ) -> f64 {
            self.stages_run.fetch_add(1, Ordering::Relaxed);
            self.inputs
        }

        fn route_outputs(
            &self,
            _m: &ArrayModel,
            _s: &SubGraph,
            _map: &Mapping,
            _g: &mut RoutingGraph,
            _pregs: Option<&[bool]>,
        ) -> f64 {
            self.stages_run.fetch_add(1, Ordering::Relaxed);
            self.outputs
        }

        fn clean_graph(&self, _g: &mut RoutingGraph) {}
    }

    pub(crate) fn tiny_context(router: Arc<dyn Router>) -> Result<EvalContext> {
        let model = ArrayModel::new(2, 2, 0)?;
        let app = Application::from_json_str(
            r#"{"nodes": [{"name": "a", "kind": "op"}], "edges": []}"#,
        )?;
        let objectives: Vec<Arc<dyn Objective>> =
            vec![Arc::new(RoutingCost::from_args(&ObjectiveArgs::empty())?)];
        Ok(EvalContext::new(
            Arc::new(model),
            Arc::new(app),
            SimParams::default(),
            router,
            Arc::new(objectives),
        ))
    }

    #[test]
    fn test_comp_overrun_skips_remaining_stages() {
        let router = Arc::new(StageCostRouter {
            comp: 11.0,
            consts: 1.0,
            inputs: 1.0,
            outputs: 1.0,
            penalty: 10.0,
            stages_run: AtomicUsize::new(0),
        });
        let ctx = tiny_context(router.clone()).expect("ctx");
        let mut ind = Individual::new(Mapping::new(), None);

        evaluate(&ctx, &mut ind);
        assert_eq!(router.stages_run.load(Ordering::Relaxed), 1);
        assert_eq!(ind.routing_cost(), 11.0 + 10.0);
        assert!(!ind.is_valid());
        // objectives still ran
        assert_eq!(ind.fitness(), &[21.0]);
    }

    #[test]
    fn test_exact_budget_stays_valid() {
        // four stages of 2.5 sum to exactly the penalty; the gate is strict
        let router = Arc::new(StageCostRouter::flat(2.5, 10.0));
        let ctx = tiny_context(router.clone()).expect("ctx");
        let mut ind = Individual::new(Mapping::new(), None);

        evaluate(&ctx, &mut ind);
        assert_eq!(router.stages_run.load(Ordering::Relaxed), 4);
        assert_eq!(ind.routing_cost(), 10.0);
        assert!(ind.is_valid());
    }

    #[test]
    fn test_late_stage_overrun_inflates_total() {
        let router = Arc::new(StageCostRouter {
            comp: 3.0,
            consts: 3.0,
            inputs: 3.0,
            outputs: 3.0,
            penalty: 10.0,
            stages_run: AtomicUsize::new(0),
        });
        let ctx = tiny_context(router.clone()).expect("ctx");
        let mut ind = Individual::new(Mapping::new(), None);

        evaluate(&ctx, &mut ind);
        assert_eq!(router.stages_run.load(Ordering::Relaxed), 4);
        assert_eq!(ind.routing_cost(), 12.0 + 10.0);
        assert!(!ind.is_valid());
    }

    #[test]
    fn test_valid_candidates_skip_routing() {
        let router = Arc::new(StageCostRouter::flat(1.0, 10.0));
        let ctx = tiny_context(router.clone()).expect("ctx");
        let mut ind = Individual::new(Mapping::new(), None);
        ind.set_routing_cost(4.0);
        ind.validate();

        evaluate(&ctx, &mut ind);
        assert_eq!(router.stages_run.load(Ordering::Relaxed), 0);
        assert_eq!(ind.routing_cost(), 4.0);
        assert_eq!(ind.fitness(), &[4.0]);
    }
}
