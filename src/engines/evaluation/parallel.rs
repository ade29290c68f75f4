use super::pipeline::{self, EvalContext};
use crate::error::{CgramapError, Result};
use crate::mapping::Individual;
use log::debug;
use rayon::prelude::*;

/// Owned worker pool for candidate evaluation.
///
/// Batches are evaluated in place through `par_iter_mut`, so each result
/// lands on the candidate it belongs to no matter how the pool schedules
/// the work. The pool's threads join when the evaluator is dropped, which
/// the engine guarantees on every exit path of a run.
pub struct ParallelEvaluator {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl ParallelEvaluator {
    /// Build a pool with `worker_count` threads, or one sized to the
    /// machine's available parallelism when `None`.
    pub fn new(worker_count: Option<usize>) -> Result<Self> {
        let workers = match worker_count {
            Some(n) if n > 0 => n,
            _ => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("eval-{i}"))
            .build()
            .map_err(|e| CgramapError::WorkerPool(e.to_string()))?;
        debug!("evaluation pool ready with {workers} workers");
        Ok(Self { pool, workers })
    }

    pub fn worker_count(&self) -> usize {
        self.workers
    }

    /// Evaluate every candidate in the batch on the pool.
    pub fn evaluate(&self, ctx: &EvalContext, batch: &mut [Individual]) {
        self.pool.install(|| {
            batch
                .par_iter_mut()
                .for_each(|individual| pipeline::evaluate(ctx, individual));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::evaluation::pipeline::tests::{tiny_context, StageCostRouter};
    use crate::types::Mapping;
    use std::sync::Arc;

    #[test]
    fn test_batch_lands_on_every_candidate() {
        let router = Arc::new(StageCostRouter::flat(1.0, 100.0));
        let ctx = tiny_context(router).expect("ctx");
        let evaluator = ParallelEvaluator::new(Some(2)).expect("pool");

        let mut batch: Vec<Individual> = (0..17)
            .map(|_| Individual::new(Mapping::new(), None))
            .collect();
        evaluator.evaluate(&ctx, &mut batch);

        for ind in &batch {
            assert!(ind.is_valid());
            assert_eq!(ind.routing_cost(), 4.0);
            assert_eq!(ind.fitness().len(), ctx.objectives.len());
        }
    }

    #[test]
    fn test_default_sizing_uses_available_parallelism() {
        let evaluator = ParallelEvaluator::new(None).expect("pool");
        assert!(evaluator.worker_count() >= 1);
    }
}
