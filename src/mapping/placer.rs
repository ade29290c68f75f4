use crate::model::Application;
use crate::types::{Coord, Mapping};
use log::warn;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Strategy for laying operations onto the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementMethod {
    /// Dataflow levels map to columns, west to east; ops shuffle within a
    /// level and spill to the nearest free column on overflow.
    #[default]
    Tsort,
    /// Every operation takes a uniformly random free cell.
    Random,
}

/// Produces operation-to-cell mappings: a deduplicated pool of initial
/// placements at setup and throwaway random pools for injection during the
/// run.
#[derive(Debug, Clone)]
pub struct Placer {
    method: PlacementMethod,
    iterations: u32,
}

impl Placer {
    pub fn new(method: PlacementMethod, iterations: u32) -> Self {
        Self { method, iterations }
    }

    /// Run up to `iterations` placement attempts and keep at most `count`
    /// distinct feasible mappings. Attempts run on a scratch worker pool
    /// when `worker_count > 1`. An application larger than the grid yields
    /// an empty pool, which the caller treats as a failed setup.
    pub fn generate_init_mappings<R: Rng>(
        &self,
        app: &Application,
        width: u32,
        height: u32,
        count: u32,
        worker_count: usize,
        rng: &mut R,
    ) -> Vec<Mapping> {
        if app.op_count() > (width * height) as usize {
            return Vec::new();
        }

        let seeds: Vec<u64> = (0..self.iterations).map(|_| rng.gen()).collect();
        let method = self.method;
        let attempt = |seed: u64| {
            let mut local = StdRng::seed_from_u64(seed);
            place_once(app, width, height, method, &mut local)
        };

        let attempts: Vec<Option<Mapping>> = if worker_count > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(worker_count)
                .thread_name(|i| format!("placer-{i}"))
                .build()
            {
                Ok(pool) => pool.install(|| seeds.par_iter().map(|&s| attempt(s)).collect()),
                Err(e) => {
                    warn!("placer pool unavailable ({e}), placing sequentially");
                    seeds.iter().map(|&s| attempt(s)).collect()
                }
            }
        } else {
            seeds.iter().map(|&s| attempt(s)).collect()
        };

        let mut seen = BTreeSet::new();
        let mut pool = Vec::new();
        for mapping in attempts.into_iter().flatten() {
            if pool.len() >= count as usize {
                break;
            }
            if seen.insert(mapping.clone()) {
                pool.push(mapping);
            }
        }
        pool
    }

    /// Build `count` fresh mappings for random injection. Each one places
    /// in dataflow order with probability `sort_probability`, otherwise
    /// fully at random. Duplicates are allowed here.
    pub fn make_random_mappings<R: Rng>(
        &self,
        app: &Application,
        width: u32,
        height: u32,
        count: u32,
        sort_probability: f64,
        rng: &mut R,
    ) -> Vec<Mapping> {
        if app.op_count() > (width * height) as usize {
            return Vec::new();
        }

        (0..count)
            .filter_map(|_| {
                let method = if rng.gen::<f64>() < sort_probability {
                    PlacementMethod::Tsort
                } else {
                    PlacementMethod::Random
                };
                place_once(app, width, height, method, rng)
            })
            .collect()
    }
}

fn place_once<R: Rng>(
    app: &Application,
    width: u32,
    height: u32,
    method: PlacementMethod,
    rng: &mut R,
) -> Option<Mapping> {
    match method {
        PlacementMethod::Tsort => place_by_levels(app, width, height, rng),
        PlacementMethod::Random => place_randomly(app, width, height, rng),
    }
}

/// Column-per-level placement. Deep graphs fold their tail levels into the
/// last column; crowded levels spill into the nearest column with room.
fn place_by_levels<R: Rng>(
    app: &Application,
    width: u32,
    height: u32,
    rng: &mut R,
) -> Option<Mapping> {
    let mut free = all_cells(width, height);
    let mut mapping = Mapping::new();

    for (level, ops) in app.op_levels().iter().enumerate() {
        let column = (level as u32).min(width - 1);
        let mut ops = ops.clone();
        ops.shuffle(rng);
        for op in ops {
            let cell = take_cell_near_column(&mut free, column, rng)?;
            mapping.insert(op, cell);
        }
    }
    Some(mapping)
}

fn place_randomly<R: Rng>(
    app: &Application,
    width: u32,
    height: u32,
    rng: &mut R,
) -> Option<Mapping> {
    let mut cells = all_cells(width, height);
    cells.shuffle(rng);
    if cells.len() < app.op_count() {
        return None;
    }
    Some(
        app.op_nodes()
            .iter()
            .zip(cells)
            .map(|(&op, cell)| (op, cell))
            .collect(),
    )
}

fn all_cells(width: u32, height: u32) -> Vec<Coord> {
    (0..height)
        .flat_map(|y| (0..width).map(move |x| Coord::new(x, y)))
        .collect()
}

fn take_cell_near_column<R: Rng>(free: &mut Vec<Coord>, column: u32, rng: &mut R) -> Option<Coord> {
    let best_dx = free.iter().map(|c| c.x.abs_diff(column)).min()?;
    let candidates: Vec<usize> = free
        .iter()
        .enumerate()
        .filter(|(_, c)| c.x.abs_diff(column) == best_dx)
        .map(|(i, _)| i)
        .collect();
    let pick = candidates[rng.gen_range(0..candidates.len())];
    Some(free.swap_remove(pick))
}
