use super::traits::ConfigSection;
use crate::error::CgramapError;
use serde::{Deserialize, Serialize};

fn default_indpb() -> f64 {
    0.5
}

/// Parameters of one optimization run, the `[parameters]` table of the run
/// configuration. Every field without a serde default is required; a
/// missing or mistyped value fails at load time naming the field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerParams {
    pub initial_population_size: u32,
    pub initial_place_iteration: u32,
    pub initial_place_count: u32,
    pub random_place_count: u32,
    pub topological_sort_probability: f64,
    pub offspring_size: u32,
    pub crossover_probability: f64,
    pub mutation_probability: f64,
    pub select_size: u32,
    pub random_population_size: u32,
    pub maximum_generation: u32,
    pub maximum_stall: u32,

    /// Per-gene probability inside one mutation.
    #[serde(default = "default_indpb")]
    pub mutation_indpb: f64,

    /// Fixed seed for reproducible runs; entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for OptimizerParams {
    fn default() -> Self {
        Self {
            initial_population_size: 100,
            initial_place_iteration: 100,
            initial_place_count: 50,
            random_place_count: 20,
            topological_sort_probability: 0.5,
            offspring_size: 100,
            crossover_probability: 0.7,
            mutation_probability: 0.3,
            select_size: 100,
            random_population_size: 10,
            maximum_generation: 300,
            maximum_stall: 100,
            mutation_indpb: default_indpb(),
            seed: None,
        }
    }
}

impl ConfigSection for OptimizerParams {
    fn section_name() -> &'static str {
        "parameters"
    }

    fn validate(&self) -> Result<(), CgramapError> {
        for (name, value) in [
            ("topological_sort_probability", self.topological_sort_probability),
            ("crossover_probability", self.crossover_probability),
            ("mutation_probability", self.mutation_probability),
            ("mutation_indpb", self.mutation_indpb),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CgramapError::Configuration(format!(
                    "{name} must be between 0 and 1, got {value}"
                )));
            }
        }

        if self.crossover_probability + self.mutation_probability > 1.0 {
            return Err(CgramapError::Configuration(
                "crossover_probability + mutation_probability must not exceed 1".to_string(),
            ));
        }

        for (name, value) in [
            ("initial_population_size", self.initial_population_size),
            ("initial_place_iteration", self.initial_place_iteration),
            ("initial_place_count", self.initial_place_count),
            ("offspring_size", self.offspring_size),
            ("select_size", self.select_size),
            ("maximum_generation", self.maximum_generation),
            ("maximum_stall", self.maximum_stall),
        ] {
            if value == 0 {
                return Err(CgramapError::Configuration(format!(
                    "{name} must be nonzero"
                )));
            }
        }

        if self.random_population_size > 0 && self.random_place_count == 0 {
            return Err(CgramapError::Configuration(
                "random_place_count must be nonzero when random individuals are injected"
                    .to_string(),
            ));
        }

        Ok(())
    }
}
