use cgramap::config::OptimizerParams;
use cgramap::engines::optimization::nsga::{dominates, Direction};
use cgramap::engines::optimization::{
    GenerationReport, MappingOptimizer, ProgressCallback, SilentProgress,
};
use cgramap::mapping::PlacementMethod;
use cgramap::model::{Application, ArrayModel, SimParams};
use cgramap::objectives::{
    MappingWidth, Objective, ObjectiveArgs, RoutingCost,
};
use cgramap::routing::AstarRouter;
use std::sync::Arc;

/// Counts callback invocations and remembers the last report.
struct RecordingCallback {
    starts: u32,
    reports: Vec<GenerationReport>,
}

impl RecordingCallback {
    fn new() -> Self {
        Self {
            starts: 0,
            reports: Vec::new(),
        }
    }
}

impl ProgressCallback for RecordingCallback {
    fn on_generation_start(&mut self, _generation: u32) {
        self.starts += 1;
    }

    fn on_generation_complete(&mut self, report: &GenerationReport) {
        self.reports.push(report.clone());
    }
}

/// mul/add pipeline with a stream input, a constant and a stream output.
fn pipeline_app() -> Application {
    Application::from_json_str(
        r#"{
            "name": "mac",
            "nodes": [
                {"name": "in0", "kind": "input"},
                {"name": "c0", "kind": "const"},
                {"name": "mul0", "kind": "op"},
                {"name": "add0", "kind": "op"},
                {"name": "out0", "kind": "output"}
            ],
            "edges": [
                ["in0", "mul0"],
                ["c0", "mul0"],
                ["mul0", "add0"],
                ["add0", "out0"]
            ]
        }"#,
    )
    .unwrap()
}

fn small_params(seed: u64) -> OptimizerParams {
    OptimizerParams {
        initial_population_size: 8,
        initial_place_iteration: 20,
        initial_place_count: 8,
        random_place_count: 4,
        topological_sort_probability: 0.5,
        offspring_size: 8,
        crossover_probability: 0.5,
        mutation_probability: 0.3,
        select_size: 8,
        random_population_size: 2,
        maximum_generation: 10,
        maximum_stall: 5,
        mutation_indpb: 0.5,
        seed: Some(seed),
    }
}

fn width_and_cost_objectives() -> Vec<Arc<dyn Objective>> {
    vec![
        Arc::new(MappingWidth::from_args(&ObjectiveArgs::empty()).unwrap()),
        Arc::new(RoutingCost::from_args(&ObjectiveArgs::empty()).unwrap()),
    ]
}

#[test]
fn test_two_objective_run_yields_non_dominated_front() {
    let mut optimizer = MappingOptimizer::new(
        small_params(11),
        Arc::new(AstarRouter::new()),
        width_and_cost_objectives(),
    )
    .unwrap();

    let model = ArrayModel::new(3, 3, 0).unwrap();
    let bound = optimizer
        .setup(
            model,
            pipeline_app(),
            SimParams::default(),
            PlacementMethod::Tsort,
            Some(2),
        )
        .unwrap();
    assert!(bound);

    let mut callback = RecordingCallback::new();
    let result = optimizer.run(&mut callback).unwrap();

    assert!(result.generations > 0);
    assert_eq!(callback.starts, result.generations);
    assert_eq!(callback.reports.len(), result.generations as usize);

    assert!(!result.pareto_front.is_empty());
    let directions = [Direction::Minimize, Direction::Minimize];
    for member in &result.pareto_front {
        assert!(member.is_valid());
        assert_eq!(member.fitness().len(), 2);
    }
    for a in &result.pareto_front {
        for b in &result.pareto_front {
            assert!(!dominates(a.fitness(), b.fitness(), &directions));
        }
    }

    // two objectives and a non-empty valid front, so quality was tracked
    let log = result.hypervolume_log.unwrap();
    assert_eq!(log.len(), result.generations as usize);
    assert!(log.iter().all(|hv| hv.is_finite() && *hv >= 0.0));

    // the last report reflects the final archive
    let last = callback.reports.last().unwrap();
    assert_eq!(last.generation, result.generations);
    assert_eq!(last.stall, result.stall);
    assert_eq!(last.objective_ranges.len(), 2);
    assert_eq!(last.objective_ranges[0].name, "mapping_width");
    assert!(last.objective_ranges[0].min <= last.objective_ranges[0].max);
}

#[test]
fn test_single_objective_disables_quality_tracking() {
    let mut optimizer = MappingOptimizer::new(
        small_params(23),
        Arc::new(AstarRouter::new()),
        vec![Arc::new(RoutingCost::from_args(&ObjectiveArgs::empty()).unwrap())],
    )
    .unwrap();

    // reported as ignored, not rejected
    assert!(optimizer.set_reference_point(&[5.0]));

    let model = ArrayModel::new(3, 3, 0).unwrap();
    assert!(optimizer
        .setup(
            model,
            pipeline_app(),
            SimParams::default(),
            PlacementMethod::Tsort,
            Some(2),
        )
        .unwrap());

    let result = optimizer.run(&mut SilentProgress).unwrap();
    assert!(!result.pareto_front.is_empty());
    assert!(result.hypervolume_log.is_none());
}

#[test]
fn test_stall_ends_the_run_before_the_generation_limit() {
    // A 1x1 array with a single lone op admits exactly one mapping, so the
    // archive freezes immediately and the stall limit fires.
    let params = OptimizerParams {
        maximum_generation: 100,
        maximum_stall: 3,
        ..small_params(31)
    };
    let mut optimizer = MappingOptimizer::new(
        params,
        Arc::new(AstarRouter::new()),
        width_and_cost_objectives(),
    )
    .unwrap();

    let app = Application::from_json_str(
        r#"{"nodes": [{"name": "only", "kind": "op"}], "edges": []}"#,
    )
    .unwrap();
    let model = ArrayModel::new(1, 1, 0).unwrap();
    assert!(optimizer
        .setup(model, app, SimParams::default(), PlacementMethod::Tsort, Some(1))
        .unwrap());

    let result = optimizer.run(&mut SilentProgress).unwrap();
    assert_eq!(result.stall, 3);
    assert!(result.generations < 100);
    assert_eq!(result.pareto_front.len(), 1);
    assert_eq!(result.pareto_front[0].fitness(), &[1.0, 0.0]);
}

#[test]
fn test_reference_point_arity_is_enforced() {
    let params = OptimizerParams {
        maximum_generation: 100,
        maximum_stall: 3,
        ..small_params(43)
    };
    let mut optimizer = MappingOptimizer::new(
        params,
        Arc::new(AstarRouter::new()),
        width_and_cost_objectives(),
    )
    .unwrap();

    assert!(optimizer.set_reference_point(&[10.0, 10.0]));
    // wrong arity is rejected and the accepted point stays in force
    assert!(!optimizer.set_reference_point(&[1.0, 2.0, 3.0]));
    assert!(!optimizer.set_reference_point(&[1.0]));

    let app = Application::from_json_str(
        r#"{"nodes": [{"name": "only", "kind": "op"}], "edges": []}"#,
    )
    .unwrap();
    let model = ArrayModel::new(1, 1, 0).unwrap();
    assert!(optimizer
        .setup(model, app, SimParams::default(), PlacementMethod::Tsort, Some(1))
        .unwrap());

    let result = optimizer.run(&mut SilentProgress).unwrap();

    // every generation's archive is the single point (1, 0); against the
    // manual reference point (10, 10) that is (10-1) * (10-0) = 90
    let log = result.hypervolume_log.unwrap();
    assert_eq!(log.len(), result.generations as usize);
    for hv in log {
        assert!((hv - 90.0).abs() < 1e-9);
    }
}

#[test]
fn test_random_placement_method_also_runs() {
    let mut optimizer = MappingOptimizer::new(
        small_params(57),
        Arc::new(AstarRouter::new()),
        width_and_cost_objectives(),
    )
    .unwrap();

    let model = ArrayModel::new(3, 3, 0).unwrap();
    assert!(optimizer
        .setup(
            model,
            pipeline_app(),
            SimParams::default(),
            PlacementMethod::Random,
            Some(1),
        )
        .unwrap());

    let result = optimizer.run(&mut SilentProgress).unwrap();
    assert!(!result.pareto_front.is_empty());
    for member in &result.pareto_front {
        assert!(member.is_valid());
    }
}

#[test]
fn test_pipeline_registers_join_the_genome() {
    // preg_count > 0 threads a register assignment through every candidate
    let mut optimizer = MappingOptimizer::new(
        small_params(71),
        Arc::new(AstarRouter::new()),
        width_and_cost_objectives(),
    )
    .unwrap();

    let model = ArrayModel::new(3, 3, 2).unwrap();
    assert!(optimizer
        .setup(
            model,
            pipeline_app(),
            SimParams::default(),
            PlacementMethod::Tsort,
            Some(1),
        )
        .unwrap());

    let result = optimizer.run(&mut SilentProgress).unwrap();
    assert!(!result.pareto_front.is_empty());
    for member in &result.pareto_front {
        let preg = member.preg().expect("registers assigned");
        assert_eq!(preg.len(), 2);
    }
}
