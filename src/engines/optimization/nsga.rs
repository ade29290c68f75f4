//! NSGA-II primitives: dominance testing, fast non-dominated sorting and
//! crowding distance, plus the front-filling environmental selection built
//! on top of them.

use crate::mapping::Individual;

/// Whether an objective should be maximized or minimized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Maximize,
    Minimize,
}

impl Direction {
    pub fn from_minimize(minimize: bool) -> Self {
        if minimize {
            Direction::Minimize
        } else {
            Direction::Maximize
        }
    }
}

/// Check if fitness A dominates fitness B: no worse in all objectives and
/// strictly better in at least one.
pub fn dominates(a: &[f64], b: &[f64], directions: &[Direction]) -> bool {
    if a.len() != b.len() || a.len() != directions.len() {
        return false;
    }

    let mut at_least_one_better = false;

    for i in 0..a.len() {
        let (a_better, b_better) = match directions[i] {
            Direction::Maximize => (a[i] > b[i], b[i] > a[i]),
            Direction::Minimize => (a[i] < b[i], b[i] < a[i]),
        };

        if b_better {
            return false;
        }
        if a_better {
            at_least_one_better = true;
        }
    }

    at_least_one_better
}

/// Fast non-dominated sorting. Returns index groups by Pareto front
/// (0 = best, 1 = second best, and so on).
pub fn fast_non_dominated_sort(fitnesses: &[&[f64]], directions: &[Direction]) -> Vec<Vec<usize>> {
    let n = fitnesses.len();
    if n == 0 {
        return Vec::new();
    }

    let mut domination_count = vec![0usize; n];
    let mut dominated: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut fronts: Vec<Vec<usize>> = Vec::new();
    let mut first_front = Vec::new();

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            if dominates(fitnesses[i], fitnesses[j], directions) {
                dominated[i].push(j);
            } else if dominates(fitnesses[j], fitnesses[i], directions) {
                domination_count[i] += 1;
            }
        }
        if domination_count[i] == 0 {
            first_front.push(i);
        }
    }

    fronts.push(first_front);

    let mut front_index = 0;
    while front_index < fronts.len() && !fronts[front_index].is_empty() {
        let mut next_front = Vec::new();
        for &i in &fronts[front_index] {
            for &j in &dominated[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    next_front.push(j);
                }
            }
        }
        if !next_front.is_empty() {
            fronts.push(next_front);
        }
        front_index += 1;
    }

    fronts
}

/// Crowding distance of every member of one front, in front order.
/// Boundary points along any objective get infinite distance.
pub fn crowding_distance(fitnesses: &[&[f64]], front: &[usize]) -> Vec<f64> {
    let front_size = front.len();
    if front_size <= 2 {
        return vec![f64::INFINITY; front_size];
    }

    let num_objectives = fitnesses[front[0]].len();
    let mut distance = vec![0.0f64; front_size];

    for obj in 0..num_objectives {
        // positions within the front, sorted by this objective
        let mut order: Vec<usize> = (0..front_size).collect();
        order.sort_by(|&a, &b| {
            fitnesses[front[a]][obj]
                .partial_cmp(&fitnesses[front[b]][obj])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        distance[order[0]] = f64::INFINITY;
        distance[order[front_size - 1]] = f64::INFINITY;

        let min_val = fitnesses[front[order[0]]][obj];
        let max_val = fitnesses[front[order[front_size - 1]]][obj];
        let range = max_val - min_val;
        if range.abs() < 1e-10 {
            continue;
        }

        for i in 1..(front_size - 1) {
            let prev_val = fitnesses[front[order[i - 1]]][obj];
            let next_val = fitnesses[front[order[i + 1]]][obj];
            distance[order[i]] += (next_val - prev_val) / range;
        }
    }

    distance
}

/// Environmental selection: append whole fronts until the quota, then
/// truncate the straddling front by descending crowding distance.
pub fn select(
    population: Vec<Individual>,
    quota: usize,
    directions: &[Direction],
) -> Vec<Individual> {
    if population.len() <= quota {
        return population;
    }

    let fits: Vec<Vec<f64>> = population.iter().map(|i| i.fitness().to_vec()).collect();
    let fit_refs: Vec<&[f64]> = fits.iter().map(|f| f.as_slice()).collect();
    let fronts = fast_non_dominated_sort(&fit_refs, directions);

    let mut chosen: Vec<usize> = Vec::with_capacity(quota);
    for front in &fronts {
        if chosen.len() + front.len() <= quota {
            chosen.extend(front.iter().copied());
            if chosen.len() == quota {
                break;
            }
        } else {
            let dist = crowding_distance(&fit_refs, front);
            let mut ranked: Vec<(usize, f64)> = front.iter().copied().zip(dist).collect();
            ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            ranked.truncate(quota - chosen.len());
            chosen.extend(ranked.into_iter().map(|(idx, _)| idx));
            break;
        }
    }

    let mut slots: Vec<Option<Individual>> = population.into_iter().map(Some).collect();
    chosen.into_iter().filter_map(|i| slots[i].take()).collect()
}
