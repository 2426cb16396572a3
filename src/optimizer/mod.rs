//! Population-based search over a [`crate::paramspace::ParameterSpace`]
//! (spec.md 4.H).
//!
//! PSO and GA share one contract: given a space, an async objective
//! (`ProjectedCandidate -> fitness`, backed by the [`crate::simulator::Simulator`]),
//! and a budget drawn from [`crate::config::OptimizerConfig`], produce an
//! [`OptimizationResult`]. `run` picks the configured engine; callers that
//! want one engine directly can use [`pso::Pso`] or [`ga::Ga`].

pub mod cache;
pub mod ga;
pub mod pso;

use std::future::Future;

use rand::Rng;

use crate::config::{OptimizerAlgorithm, OptimizerConfig};
use crate::paramspace::{ParameterSpace, ProjectedCandidate};

pub use cache::{FitnessCache, TopK};

/// What a completed optimization run produced.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    pub best_params: Option<ProjectedCandidate>,
    pub best_metric: f64,
    pub top_k: Vec<(ProjectedCandidate, f64)>,
}

/// Run the engine named by `config.algorithm` against `space`, evaluating
/// candidates with `objective`.
pub async fn run<F, Fut>(
    config: &OptimizerConfig,
    space: &ParameterSpace,
    rng: &mut impl Rng,
    objective: F,
) -> OptimizationResult
where
    F: Fn(ProjectedCandidate) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = f64> + Send + 'static,
{
    match config.algorithm {
        OptimizerAlgorithm::Pso => {
            let pso = pso::Pso::new(
                space,
                config.pso.num_particles,
                config.pso.max_iterations,
                config.pso.inertia_weight,
                config.pso.cognitive_coefficient,
                config.pso.social_coefficient,
                config.top_k,
                config.concurrency,
                rng,
            );
            pso.optimize(objective).await
        }
        OptimizerAlgorithm::Ga => {
            let ga = ga::Ga::new(
                space,
                config.ga.population_size,
                config.ga.generations,
                config.ga.elite_size,
                config.ga.tournament_size,
                config.ga.mutation_rate,
                config.top_k,
                config.concurrency,
                rng,
            );
            ga.optimize(objective).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paramspace::{ParameterDescriptor, ParameterKind};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn space() -> ParameterSpace {
        ParameterSpace::new(vec![ParameterDescriptor::new(
            "x",
            ParameterKind::Number {
                min: -5.0,
                max: 5.0,
                integer: false,
            },
        )])
    }

    #[tokio::test]
    async fn run_dispatches_to_the_configured_algorithm() {
        let space = space();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut config = OptimizerConfig::default();
        config.pso.num_particles = 4;
        config.pso.max_iterations = 2;
        config.top_k = 3;

        let result = run(&config, &space, &mut rng, |_c| async { 1.0 }).await;
        assert_eq!(result.best_metric, 1.0);
    }
}
