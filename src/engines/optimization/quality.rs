use super::nsga::Direction;
use log::{info, warn};
use std::cmp::Ordering;

/// Default distance past the worst observed value when no reference point
/// was supplied.
const REF_POINT_OFFSET: f64 = 0.1;

/// Tracks archive quality over a run and reduces it to one hypervolume
/// scalar per generation.
///
/// Hypervolume is computed in minimization space: maximized objectives are
/// negated on the way in, and a user-supplied reference point is normalized
/// the same way. Tracking switches itself off for single-objective runs,
/// where the notion adds nothing over the raw best value.
pub struct QualityTracker {
    enabled: bool,
    directions: Vec<Direction>,
    ref_point: Option<Vec<f64>>,
    history: Vec<Vec<Vec<f64>>>,
}

impl QualityTracker {
    pub fn new(directions: &[Direction]) -> Self {
        let enabled = directions.len() > 1;
        if !enabled {
            info!("quality tracking disabled: single objective configured");
        }
        Self {
            enabled,
            directions: directions.to_vec(),
            ref_point: None,
            history: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Install a reference point for the hypervolume computation.
    ///
    /// While tracking is disabled the point is reported and ignored; a
    /// length mismatch is a reported rejection that leaves any previously
    /// accepted point untouched.
    pub fn set_reference_point(&mut self, point: &[f64]) -> bool {
        if !self.enabled {
            info!("quality tracking is disabled, reference point ignored");
            return true;
        }
        match point.len().cmp(&self.directions.len()) {
            Ordering::Less => {
                warn!(
                    "too few reference point values: expected {}, got {}",
                    self.directions.len(),
                    point.len()
                );
                false
            }
            Ordering::Greater => {
                warn!(
                    "too many reference point values: expected {}, got {}",
                    self.directions.len(),
                    point.len()
                );
                false
            }
            Ordering::Equal => {
                self.ref_point = Some(point.to_vec());
                true
            }
        }
    }

    /// Append one generation's snapshot of valid archive fitness vectors.
    pub fn record(&mut self, snapshot: Vec<Vec<f64>>) {
        if self.enabled {
            self.history.push(snapshot);
        }
    }

    /// Reduce the recorded history to one hypervolume value per generation.
    /// Empty snapshots score 0.0. Returns `None` when tracking is disabled
    /// or nothing was ever recorded.
    pub fn finish(&self) -> Option<Vec<f64>> {
        if !self.enabled {
            return None;
        }

        let all: Vec<Vec<f64>> = self
            .history
            .iter()
            .flatten()
            .map(|f| self.normalize(f))
            .collect();
        if all.is_empty() {
            return None;
        }

        let ref_point = match &self.ref_point {
            Some(p) => self.normalize(p),
            None => derive_reference_point(&all, REF_POINT_OFFSET),
        };

        Some(
            self.history
                .iter()
                .map(|snapshot| {
                    if snapshot.is_empty() {
                        0.0
                    } else {
                        let points: Vec<Vec<f64>> =
                            snapshot.iter().map(|f| self.normalize(f)).collect();
                        hypervolume(&points, &ref_point)
                    }
                })
                .collect(),
        )
    }

    fn normalize(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .zip(&self.directions)
            .map(|(&v, d)| match d {
                Direction::Minimize => v,
                Direction::Maximize => -v,
            })
            .collect()
    }
}

/// Worst observed value per objective, pushed out by `offset`.
fn derive_reference_point(points: &[Vec<f64>], offset: f64) -> Vec<f64> {
    let dim = points.first().map(|p| p.len()).unwrap_or(0);
    (0..dim)
        .map(|i| {
            points
                .iter()
                .map(|p| p[i])
                .fold(f64::NEG_INFINITY, f64::max)
                + offset
        })
        .collect()
}

/// Exact hypervolume of `points` against `ref_point`, all objectives
/// minimized. Points not strictly better than the reference point in every
/// dimension contribute nothing.
pub fn hypervolume(points: &[Vec<f64>], ref_point: &[f64]) -> f64 {
    let dim = ref_point.len();
    let inside: Vec<Vec<f64>> = points
        .iter()
        .filter(|p| p.len() == dim && p.iter().zip(ref_point).all(|(v, r)| v < r))
        .cloned()
        .collect();
    compute(inside, ref_point)
}

fn compute(points: Vec<Vec<f64>>, ref_point: &[f64]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    match ref_point.len() {
        0 => 0.0,
        1 => {
            let best = points.iter().map(|p| p[0]).fold(f64::INFINITY, f64::min);
            ref_point[0] - best
        }
        2 => sweep_2d(points, ref_point),
        _ => slice_last_dim(points, ref_point),
    }
}

/// 2-D sweep: walk the non-dominated front left to right, adding the strip
/// each point rules until the next one takes over.
fn sweep_2d(mut points: Vec<Vec<f64>>, ref_point: &[f64]) -> f64 {
    points.sort_by(|a, b| {
        a[0].partial_cmp(&b[0])
            .unwrap_or(Ordering::Equal)
            .then(a[1].partial_cmp(&b[1]).unwrap_or(Ordering::Equal))
    });

    let mut front: Vec<&Vec<f64>> = Vec::new();
    for p in &points {
        if front.last().map_or(true, |last| p[1] < last[1]) {
            front.push(p);
        }
    }

    let mut area = 0.0;
    for (i, p) in front.iter().enumerate() {
        let next_x = front.get(i + 1).map(|n| n[0]).unwrap_or(ref_point[0]);
        area += (next_x - p[0]) * (ref_point[1] - p[1]);
    }
    area
}

/// Recursive slicing on the last objective: each distinct value opens a slab
/// whose cross-section is the hypervolume of the points present so far,
/// projected one dimension down.
fn slice_last_dim(mut points: Vec<Vec<f64>>, ref_point: &[f64]) -> f64 {
    let d = ref_point.len() - 1;
    points.sort_by(|a, b| a[d].partial_cmp(&b[d]).unwrap_or(Ordering::Equal));

    let mut total = 0.0;
    for i in 0..points.len() {
        let z0 = points[i][d];
        if i > 0 && z0 == points[i - 1][d] {
            continue;
        }
        let z1 = points[i + 1..]
            .iter()
            .map(|p| p[d])
            .find(|&z| z > z0)
            .unwrap_or(ref_point[d]);
        if z1 <= z0 {
            continue;
        }
        let projected: Vec<Vec<f64>> = points
            .iter()
            .filter(|p| p[d] <= z0)
            .map(|p| p[..d].to_vec())
            .collect();
        total += (z1 - z0) * compute(projected, &ref_point[..d]);
    }
    total
}
