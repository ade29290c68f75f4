use super::archive::ParetoArchive;
use super::nsga::{select, Direction};
use super::progress::{GenerationReport, ObjectiveRange};
use super::quality::QualityTracker;
use crate::config::{ConfigSection, OptimizerParams, RunConfig};
use crate::engines::evaluation::{EvalContext, ParallelEvaluator};
use crate::error::{CgramapError, Result};
use crate::mapping::{crossover, mutate, Individual, Placer, PlacementMethod};
use crate::model::{Application, ArrayModel, SimParams};
use crate::objectives::{Objective, ObjectiveArgs, ObjectiveRegistry, RouterRegistry};
use crate::routing::Router;
use crate::types::Mapping;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use std::sync::Arc;

pub trait ProgressCallback: Send {
    fn on_generation_start(&mut self, _generation: u32) {}
    fn on_generation_complete(&mut self, _report: &GenerationReport) {}
}

/// Arguments for the throwaway mapping pools drawn during the run.
#[derive(Debug, Clone, Copy)]
struct RandomPoolArgs {
    width: u32,
    height: u32,
    count: u32,
    sort_probability: f64,
}

/// Outcome of a finished optimization run.
#[derive(Debug)]
pub struct RunResult {
    /// Valid members of the final non-dominated archive.
    pub pareto_front: Vec<Individual>,
    /// Per-generation hypervolume of the valid archive, when tracked.
    pub hypervolume_log: Option<Vec<f64>>,
    pub generations: u32,
    pub stall: u32,
    pub finished_at: String,
}

/// NSGA-II search over operation placements.
///
/// Construction wires parameters, a router and the objective set; `setup`
/// binds the optimizer to one array and application and builds the initial
/// mapping pool; `run` executes the generational loop and returns the final
/// archive.
pub struct MappingOptimizer {
    params: OptimizerParams,
    router: Arc<dyn Router>,
    objectives: Arc<Vec<Arc<dyn Objective>>>,
    directions: Vec<Direction>,
    quality: QualityTracker,
    rng: StdRng,
    context: Option<EvalContext>,
    placer: Option<Placer>,
    init_pool: Vec<Mapping>,
    random_pool_args: Option<RandomPoolArgs>,
    preg_count: u32,
    evaluator: Option<ParallelEvaluator>,
}

impl MappingOptimizer {
    pub fn new(
        params: OptimizerParams,
        router: Arc<dyn Router>,
        objectives: Vec<Arc<dyn Objective>>,
    ) -> Result<Self> {
        if objectives.is_empty() {
            return Err(CgramapError::Configuration(
                "at least one objective is needed".to_string(),
            ));
        }
        params.validate()?;

        let directions: Vec<Direction> = objectives
            .iter()
            .map(|objective| Direction::from_minimize(objective.minimize()))
            .collect();
        let quality = QualityTracker::new(&directions);
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            params,
            router,
            objectives: Arc::new(objectives),
            directions,
            quality,
            rng,
            context: None,
            placer: None,
            init_pool: Vec::new(),
            random_pool_args: None,
            preg_count: 0,
            evaluator: None,
        })
    }

    /// Build an optimizer from a loaded run configuration, resolving the
    /// router and objective names through the registries.
    pub fn from_config(config: &RunConfig) -> Result<Self> {
        config.validate()?;

        let router = RouterRegistry::default().build(&config.router)?;

        let registry = ObjectiveRegistry::default();
        let mut objectives = Vec::with_capacity(config.objectives.len());
        for spec in &config.objectives {
            let args = match &spec.args {
                Some(table) => ObjectiveArgs::from_table(table.clone()),
                None => ObjectiveArgs::empty(),
            };
            objectives.push(registry.build(&spec.name, &args)?);
        }

        Self::new(config.parameters.clone(), router, objectives)
    }

    pub fn objectives(&self) -> &[Arc<dyn Objective>] {
        &self.objectives
    }

    /// Install a manual hypervolume reference point, one value per
    /// objective. Returns whether the point was accepted.
    pub fn set_reference_point(&mut self, point: &[f64]) -> bool {
        self.quality.set_reference_point(point)
    }

    /// Bind the optimizer to an array and application.
    ///
    /// Seeds the initial mapping pool and spins up the evaluation workers.
    /// Returns `Ok(false)` when placement finds no feasible initial mapping,
    /// in which case the optimizer stays unbound and `run` fails.
    pub fn setup(
        &mut self,
        mut model: ArrayModel,
        app: Application,
        sim: SimParams,
        method: PlacementMethod,
        worker_count: Option<usize>,
    ) -> Result<bool> {
        self.params.validate()?;
        self.router.set_default_weights(&mut model);

        let (width, height) = model.size();
        let workers = match worker_count {
            Some(n) if n > 0 => n,
            _ => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        };

        let placer = Placer::new(method, self.params.initial_place_iteration);
        let init_pool = placer.generate_init_mappings(
            &app,
            width,
            height,
            self.params.initial_place_count,
            workers,
            &mut self.rng,
        );
        if init_pool.is_empty() {
            return Ok(false);
        }
        info!(
            "setup complete: {}x{} array, {} initial mappings, {} workers",
            width,
            height,
            init_pool.len(),
            workers
        );

        self.preg_count = model.preg_count();
        self.random_pool_args = Some(RandomPoolArgs {
            width,
            height,
            count: self.params.random_place_count,
            sort_probability: self.params.topological_sort_probability,
        });
        self.placer = Some(placer);
        self.init_pool = init_pool;
        self.context = Some(EvalContext::new(
            Arc::new(model),
            Arc::new(app),
            sim,
            Arc::clone(&self.router),
            Arc::clone(&self.objectives),
        ));
        self.evaluator = Some(ParallelEvaluator::new(Some(workers))?);
        Ok(true)
    }

    /// Execute the generational loop until the generation or stall limit
    /// is hit.
    pub fn run<C: ProgressCallback>(&mut self, callback: &mut C) -> Result<RunResult> {
        let context = self
            .context
            .clone()
            .ok_or_else(|| CgramapError::Engine("run requires a successful setup".to_string()))?;
        // Taking the evaluator releases its worker pool on every exit path.
        let evaluator = self
            .evaluator
            .take()
            .ok_or_else(|| CgramapError::Engine("run requires a successful setup".to_string()))?;

        info!(
            "starting optimization: {} objectives, population {}, offspring {} per generation",
            self.objectives.len(),
            self.params.initial_population_size,
            self.params.offspring_size
        );

        let mut population = self.initial_population();
        evaluator.evaluate(&context, &mut population);

        let mut archive = ParetoArchive::new(self.directions.clone());
        let mut generation = 0u32;
        let mut stall = 0u32;
        let mut prev_len = 0usize;
        let mut prev_keys = BTreeSet::new();

        while generation < self.params.maximum_generation && stall < self.params.maximum_stall {
            generation += 1;
            callback.on_generation_start(generation);

            let mut offspring = self.vary_offspring(&population, &context.model);
            evaluator.evaluate(&context, &mut offspring);

            population.extend(offspring);
            population = select(population, self.params.select_size as usize, &self.directions);

            archive.update(&population);

            // The archive stalled when neither its size nor its set of
            // fitness values moved.
            let keys = archive.fitness_keys();
            if archive.len() == prev_len && keys == prev_keys {
                stall += 1;
            } else {
                stall = 0;
            }
            prev_len = archive.len();
            prev_keys = keys;

            self.quality.record(archive.valid_fitnesses());

            // Inject fresh random candidates to pull the search out of
            // local optima. They face selection next generation.
            let mut injected = self.random_population(self.params.random_population_size);
            if !injected.is_empty() {
                evaluator.evaluate(&context, &mut injected);
                population.extend(injected);
            }

            let report = self.report(generation, &archive, stall);
            debug!(
                "generation {generation}: archive {}, stall {stall}",
                archive.len()
            );
            callback.on_generation_complete(&report);
        }

        drop(evaluator);

        info!("optimization finished after {generation} generations");

        let pareto_front = archive.into_valid();
        let hypervolume_log = if pareto_front.is_empty() {
            None
        } else {
            self.quality.finish()
        };

        Ok(RunResult {
            pareto_front,
            hypervolume_log,
            generations: generation,
            stall,
            finished_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    fn initial_population(&mut self) -> Vec<Individual> {
        (0..self.params.initial_population_size)
            .map(|_| {
                let pick = self.rng.gen_range(0..self.init_pool.len());
                let mapping = self.init_pool[pick].clone();
                Individual::from_mapping(mapping, self.preg_count, &mut self.rng)
            })
            .collect()
    }

    /// Produce one offspring batch. Each slot rolls once: crossover of two
    /// distinct parents (keeping the first child), mutation of one parent,
    /// or plain reproduction keeping the parent's fitness.
    fn vary_offspring(&mut self, population: &[Individual], model: &ArrayModel) -> Vec<Individual> {
        let cxpb = self.params.crossover_probability;
        let mutpb = self.params.mutation_probability;

        let mut offspring = Vec::with_capacity(self.params.offspring_size as usize);
        for _ in 0..self.params.offspring_size {
            let roll = self.rng.gen::<f64>();
            if roll < cxpb {
                let (first, second) = sample_two_distinct(population.len(), &mut self.rng);
                let (child, _) = crossover(
                    &population[first],
                    &population[second],
                    model,
                    &mut self.rng,
                );
                offspring.push(child);
            } else if roll < cxpb + mutpb {
                let pick = self.rng.gen_range(0..population.len());
                offspring.push(mutate(
                    &population[pick],
                    model,
                    self.params.mutation_indpb,
                    &mut self.rng,
                ));
            } else {
                let pick = self.rng.gen_range(0..population.len());
                offspring.push(population[pick].clone());
            }
        }
        offspring
    }

    /// Draw `n` individuals from a fresh throwaway mapping pool.
    fn random_population(&mut self, n: u32) -> Vec<Individual> {
        if n == 0 {
            return Vec::new();
        }
        let (placer, args) = match (&self.placer, self.random_pool_args) {
            (Some(placer), Some(args)) => (placer.clone(), args),
            _ => return Vec::new(),
        };
        let app = match &self.context {
            Some(context) => Arc::clone(&context.app),
            None => return Vec::new(),
        };

        let pool = placer.make_random_mappings(
            &app,
            args.width,
            args.height,
            args.count,
            args.sort_probability,
            &mut self.rng,
        );
        if pool.is_empty() {
            return Vec::new();
        }

        (0..n)
            .map(|_| {
                let pick = self.rng.gen_range(0..pool.len());
                Individual::from_mapping(pool[pick].clone(), self.preg_count, &mut self.rng)
            })
            .collect()
    }

    fn report(&self, generation: u32, archive: &ParetoArchive, stall: u32) -> GenerationReport {
        let mut objective_ranges = Vec::new();
        if !archive.is_empty() {
            for (i, objective) in self.objectives.iter().enumerate() {
                let mut min = f64::INFINITY;
                let mut max = f64::NEG_INFINITY;
                for member in archive.members() {
                    let value = member.fitness()[i];
                    min = min.min(value);
                    max = max.max(value);
                }
                objective_ranges.push(ObjectiveRange {
                    name: objective.name().to_string(),
                    min,
                    max,
                });
            }
        }
        GenerationReport {
            generation,
            archive_size: archive.len(),
            stall,
            objective_ranges,
        }
    }
}

/// Pick two distinct population indices; a lone member pairs with itself.
fn sample_two_distinct<R: Rng>(len: usize, rng: &mut R) -> (usize, usize) {
    let first = rng.gen_range(0..len);
    if len < 2 {
        return (first, first);
    }
    let mut second = rng.gen_range(0..len - 1);
    if second >= first {
        second += 1;
    }
    (first, second)
}
