use crate::model::ArrayModel;
use crate::routing::RoutingGraph;
use crate::types::{Coord, Mapping};
use rand::Rng;
use std::collections::HashSet;

/// One candidate solution: an operation-to-cell mapping plus everything the
/// evaluation pipeline derives from it.
///
/// The mapping itself is immutable after construction. Routing fills the
/// graph and cost, `validate()` marks the candidate routable, and the
/// optimizer attaches the fitness vector. Variation operators never touch an
/// existing candidate; they build fresh ones with cleared derived state.
#[derive(Debug, Clone)]
pub struct Individual {
    mapping: Mapping,
    routing_graph: RoutingGraph,
    routing_cost: f64,
    valid: bool,
    fitness: Vec<f64>,
    preg: Option<Vec<bool>>,
}

impl Individual {
    pub fn new(mapping: Mapping, preg: Option<Vec<bool>>) -> Self {
        Self {
            mapping,
            routing_graph: RoutingGraph::default(),
            routing_cost: 0.0,
            valid: false,
            fitness: Vec::new(),
            preg,
        }
    }

    /// Build a candidate from a bare mapping, drawing a random
    /// pipeline-register assignment when the array has register stages.
    pub fn from_mapping<R: Rng>(mapping: Mapping, preg_count: u32, rng: &mut R) -> Self {
        let preg = if preg_count > 0 {
            Some((0..preg_count).map(|_| rng.gen::<bool>()).collect())
        } else {
            None
        };
        Self::new(mapping, preg)
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn preg(&self) -> Option<&[bool]> {
        self.preg.as_deref()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Mark the candidate routable. Only the evaluation pipeline calls this,
    /// after every routing stage has come in under the penalty.
    pub fn validate(&mut self) {
        self.valid = true;
    }

    pub fn fitness(&self) -> &[f64] {
        &self.fitness
    }

    pub fn has_fitness(&self) -> bool {
        !self.fitness.is_empty()
    }

    pub fn set_fitness(&mut self, fitness: Vec<f64>) {
        self.fitness = fitness;
    }

    pub fn routing_cost(&self) -> f64 {
        self.routing_cost
    }

    pub fn set_routing_cost(&mut self, cost: f64) {
        self.routing_cost = cost;
    }

    pub fn routing_graph(&self) -> &RoutingGraph {
        &self.routing_graph
    }

    pub fn routing_graph_mut(&mut self) -> &mut RoutingGraph {
        &mut self.routing_graph
    }

    /// Split borrow for the routing stages: the mapping and register
    /// assignment stay shared while the graph is written.
    pub fn routing_parts_mut(&mut self) -> (&Mapping, Option<&[bool]>, &mut RoutingGraph) {
        (&self.mapping, self.preg.as_deref(), &mut self.routing_graph)
    }
}

/// Uniform mapping crossover: each operation's position comes from either
/// parent with equal probability; collisions are pushed to the nearest free
/// cell. Produces two children with cleared derived state.
pub fn crossover<R: Rng>(
    a: &Individual,
    b: &Individual,
    model: &ArrayModel,
    rng: &mut R,
) -> (Individual, Individual) {
    (cross_one(a, b, model, rng), cross_one(b, a, model, rng))
}

fn cross_one<R: Rng>(
    primary: &Individual,
    donor: &Individual,
    model: &ArrayModel,
    rng: &mut R,
) -> Individual {
    let mut mapping = Mapping::new();
    let mut used: HashSet<Coord> = HashSet::new();

    for (&node, &own) in primary.mapping() {
        let pick = match donor.mapping().get(&node) {
            Some(&other) if rng.gen::<bool>() => other,
            _ => own,
        };
        let cell = if used.contains(&pick) {
            nearest_free_cell(model, pick, &used).unwrap_or(pick)
        } else {
            pick
        };
        used.insert(cell);
        mapping.insert(node, cell);
    }

    let preg = match (primary.preg(), donor.preg()) {
        (Some(p), Some(q)) => Some(
            p.iter()
                .zip(q)
                .map(|(&x, &y)| if rng.gen::<bool>() { y } else { x })
                .collect(),
        ),
        (Some(p), None) | (None, Some(p)) => Some(p.to_vec()),
        (None, None) => None,
    };

    // derived state starts cleared for a fresh candidate
    Individual::new(mapping, preg)
}

/// Relocation mutation: each operation moves to a uniformly chosen free cell
/// with probability `indpb`; each pipeline-register flag flips with the same
/// probability. Returns a child with cleared derived state.
pub fn mutate<R: Rng>(
    parent: &Individual,
    model: &ArrayModel,
    indpb: f64,
    rng: &mut R,
) -> Individual {
    let mut mapping = parent.mapping().clone();
    let nodes: Vec<_> = mapping.keys().copied().collect();

    for node in nodes {
        if rng.gen::<f64>() >= indpb {
            continue;
        }
        let used: HashSet<Coord> = mapping.values().copied().collect();
        if let Some(cell) = random_free_cell(model, &used, rng) {
            mapping.insert(node, cell);
        }
    }

    let preg = parent.preg().map(|bits| {
        bits.iter()
            .map(|&b| if rng.gen::<f64>() < indpb { !b } else { b })
            .collect()
    });

    Individual::new(mapping, preg)
}

fn nearest_free_cell(model: &ArrayModel, want: Coord, used: &HashSet<Coord>) -> Option<Coord> {
    let (w, h) = model.size();
    let mut best: Option<(u32, Coord)> = None;
    for y in 0..h {
        for x in 0..w {
            let cell = Coord::new(x, y);
            if used.contains(&cell) {
                continue;
            }
            let d = want.distance(&cell);
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, cell));
            }
        }
    }
    best.map(|(_, cell)| cell)
}

fn random_free_cell<R: Rng>(
    model: &ArrayModel,
    used: &HashSet<Coord>,
    rng: &mut R,
) -> Option<Coord> {
    let (w, h) = model.size();
    let free: Vec<Coord> = (0..h)
        .flat_map(|y| (0..w).map(move |x| Coord::new(x, y)))
        .filter(|c| !used.contains(c))
        .collect();
    if free.is_empty() {
        None
    } else {
        Some(free[rng.gen_range(0..free.len())])
    }
}
