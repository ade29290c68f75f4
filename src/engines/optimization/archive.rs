use super::nsga::{dominates, Direction};
use crate::mapping::Individual;
use std::collections::BTreeSet;

/// Bit-exact canonical form of a fitness vector. Used for the stall check
/// and archive snapshots, where two floats are "the same" only if their
/// representations match.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FitnessKey(Vec<u64>);

impl FitnessKey {
    pub fn new(fitness: &[f64]) -> Self {
        Self(fitness.iter().map(|v| v.to_bits()).collect())
    }
}

/// All-time archive of the best candidates found so far.
///
/// Holds mutually non-dominated, fitness-distinct individuals. `update`
/// grows it; a member leaves only when a new candidate dominates it. The
/// archive is never truncated by size.
pub struct ParetoArchive {
    members: Vec<Individual>,
    directions: Vec<Direction>,
}

impl ParetoArchive {
    pub fn new(directions: Vec<Direction>) -> Self {
        Self {
            members: Vec::new(),
            directions,
        }
    }

    /// Offer every member of `population` to the archive.
    pub fn update(&mut self, population: &[Individual]) {
        for candidate in population {
            let mut is_dominated = false;
            let mut has_twin = false;
            let mut to_remove: Vec<usize> = Vec::new();

            for (i, member) in self.members.iter().enumerate() {
                if to_remove.is_empty()
                    && dominates(member.fitness(), candidate.fitness(), &self.directions)
                {
                    is_dominated = true;
                    break;
                } else if dominates(candidate.fitness(), member.fitness(), &self.directions) {
                    to_remove.push(i);
                } else if candidate.fitness() == member.fitness() {
                    has_twin = true;
                    break;
                }
            }

            for i in to_remove.into_iter().rev() {
                self.members.remove(i);
            }
            if !is_dominated && !has_twin {
                self.members.push(candidate.clone());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Individual] {
        &self.members
    }

    /// Canonicalized fitness set for the stall comparison.
    pub fn fitness_keys(&self) -> BTreeSet<FitnessKey> {
        self.members
            .iter()
            .map(|m| FitnessKey::new(m.fitness()))
            .collect()
    }

    /// Fitness vectors of the routable members, the per-generation snapshot
    /// quality tracking consumes.
    pub fn valid_fitnesses(&self) -> Vec<Vec<f64>> {
        self.members
            .iter()
            .filter(|m| m.is_valid())
            .map(|m| m.fitness().to_vec())
            .collect()
    }

    /// Consume the archive, keeping only routable members.
    pub fn into_valid(self) -> Vec<Individual> {
        self.members.into_iter().filter(|m| m.is_valid()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mapping;

    fn candidate(fitness: &[f64], valid: bool) -> Individual {
        let mut ind = Individual::new(Mapping::new(), None);
        ind.set_fitness(fitness.to_vec());
        if valid {
            ind.validate();
        }
        ind
    }

    fn min2() -> Vec<Direction> {
        vec![Direction::Minimize, Direction::Minimize]
    }

    #[test]
    fn test_dominated_members_leave() {
        let mut archive = ParetoArchive::new(min2());
        archive.update(&[candidate(&[5.0, 5.0], true)]);
        assert_eq!(archive.len(), 1);

        archive.update(&[candidate(&[1.0, 1.0], true)]);
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.members()[0].fitness(), &[1.0, 1.0]);
    }

    #[test]
    fn test_non_dominated_members_accumulate() {
        let mut archive = ParetoArchive::new(min2());
        archive.update(&[candidate(&[1.0, 5.0], true)]);
        archive.update(&[candidate(&[5.0, 1.0], true)]);
        archive.update(&[candidate(&[3.0, 3.0], true)]);
        assert_eq!(archive.len(), 3);

        // dominated offer leaves the archive untouched
        archive.update(&[candidate(&[4.0, 4.0], true)]);
        assert_eq!(archive.len(), 3);
    }

    #[test]
    fn test_fitness_twins_are_dropped() {
        let mut archive = ParetoArchive::new(min2());
        archive.update(&[candidate(&[1.0, 5.0], true), candidate(&[1.0, 5.0], true)]);
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn test_fitness_keys_track_content_not_order() {
        let mut a = ParetoArchive::new(min2());
        let mut b = ParetoArchive::new(min2());
        a.update(&[candidate(&[1.0, 5.0], true), candidate(&[5.0, 1.0], true)]);
        b.update(&[candidate(&[5.0, 1.0], true), candidate(&[1.0, 5.0], true)]);
        assert_eq!(a.fitness_keys(), b.fitness_keys());

        b.update(&[candidate(&[0.5, 0.5], true)]);
        assert_ne!(a.fitness_keys(), b.fitness_keys());
    }

    #[test]
    fn test_valid_filters() {
        let mut archive = ParetoArchive::new(min2());
        archive.update(&[candidate(&[1.0, 5.0], true), candidate(&[5.0, 1.0], false)]);
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.valid_fitnesses(), vec![vec![1.0, 5.0]]);
        assert_eq!(archive.into_valid().len(), 1);
    }
}
