//! Genetic algorithm over a [`ParameterSpace`] (spec.md 4.H, secondary
//! engine).
//!
//! Tournament selection, elite retention, single-point crossover with a
//! rate ramped linearly across generations, and per-gene resample
//! mutation with a rate ramped the opposite direction. Fitness lookups go
//! through the same projected-candidate cache PSO uses, so identical
//! individuals (post-projection) are simulated once.

use std::future::Future;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use tokio::sync::Semaphore;

use crate::optimizer::cache::{FitnessCache, TopK};
use crate::optimizer::OptimizationResult;
use crate::paramspace::{Candidate, ParameterSpace};

/// Genetic algorithm: `population_size` individuals evolved over
/// `generations`, keeping the top `elite_size` unchanged each generation
/// and selecting parents via `tournament_size`-way tournaments.
pub struct Ga<'a> {
    space: &'a ParameterSpace,
    population: Vec<Candidate>,
    generations: usize,
    elite_size: usize,
    tournament_size: usize,
    mutation_rate: f64,
    top_k_size: usize,
    concurrency: usize,
}

impl<'a> Ga<'a> {
    pub fn new(
        space: &'a ParameterSpace,
        population_size: usize,
        generations: usize,
        elite_size: usize,
        tournament_size: usize,
        mutation_rate: f64,
        top_k_size: usize,
        concurrency: usize,
        rng: &mut impl Rng,
    ) -> Self {
        let population = (0..population_size).map(|_| space.sample(rng)).collect();
        Ga {
            space,
            population,
            generations,
            elite_size,
            tournament_size,
            mutation_rate,
            top_k_size,
            concurrency,
        }
    }

    fn crossover_rate(&self, generation: usize) -> f64 {
        if self.generations <= 1 {
            return 0.1;
        }
        let t = generation as f64 / (self.generations - 1) as f64;
        0.1 + t * (0.9 - 0.1)
    }

    fn mutation_rate_at(&self, generation: usize) -> f64 {
        if self.generations <= 1 {
            return self.mutation_rate;
        }
        let t = generation as f64 / (self.generations - 1) as f64;
        0.9 + t * (0.1 - 0.9)
    }

    fn tournament_select<'p>(
        &self,
        population: &'p [Candidate],
        fitness: &[f64],
        rng: &mut impl Rng,
    ) -> &'p Candidate {
        let mut best_idx = (0..population.len())
            .collect::<Vec<_>>()
            .choose(rng)
            .copied()
            .unwrap();
        for _ in 1..self.tournament_size {
            let idx = rng.gen_range(0..population.len());
            if fitness[idx] < fitness[best_idx] {
                best_idx = idx;
            }
        }
        &population[best_idx]
    }

    fn crossover(
        &self,
        parent1: &Candidate,
        parent2: &Candidate,
        rate: f64,
        rng: &mut impl Rng,
    ) -> Candidate {
        if rng.gen_range(0.0..1.0) > rate {
            return parent1.clone();
        }
        let names: Vec<&String> = parent1.keys().collect();
        if names.len() < 2 {
            return parent1.clone();
        }
        let point = rng.gen_range(1..names.len());
        let mut child = Candidate::new();
        for (i, name) in names.iter().enumerate() {
            let source = if i < point { parent1 } else { parent2 };
            child.insert((*name).clone(), source[*name]);
        }
        child
    }

    fn mutate(&self, candidate: &mut Candidate, rate: f64, rng: &mut impl Rng) {
        let resampled = self.space.sample(rng);
        for descriptor in self.space.descriptors() {
            if rng.gen_range(0.0..1.0) < rate {
                if let Some(v) = resampled.get(&descriptor.name) {
                    candidate.insert(descriptor.name.clone(), *v);
                }
            }
        }
    }

    /// Run the full search, calling `objective` (via `cache`) at most once
    /// per unique projected candidate per generation. At most `concurrency`
    /// evaluations run at once within one generation.
    pub async fn optimize<F, Fut>(mut self, objective: F) -> OptimizationResult
    where
        F: Fn(crate::paramspace::ProjectedCandidate) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = f64> + Send + 'static,
    {
        let cache = FitnessCache::new();
        let mut top_k = TopK::new(self.top_k_size);
        let mut rng = rand::thread_rng();
        let semaphore = Arc::new(Semaphore::new(self.concurrency.max(1)));

        let mut best_position: Option<Candidate> = None;
        let mut best_fitness = f64::INFINITY;

        for generation in 0..self.generations {
            let projected: Vec<_> = self
                .population
                .iter()
                .map(|p| self.space.project(p))
                .collect();

            let mut pending = Vec::new();
            for candidate in projected.iter() {
                if cache.get(candidate).is_none() {
                    let candidate = candidate.clone();
                    let objective = objective.clone();
                    let semaphore = semaphore.clone();
                    pending.push(tokio::spawn(async move {
                        let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                        let fitness = objective(candidate.clone()).await;
                        (candidate, fitness)
                    }));
                }
            }
            for handle in pending {
                if let Ok((candidate, fitness)) = handle.await {
                    cache.insert(candidate, fitness);
                }
            }

            let fitness: Vec<f64> = projected
                .iter()
                .map(|c| cache.get(c).unwrap_or(f64::INFINITY))
                .collect();

            for (candidate, &f) in projected.iter().zip(fitness.iter()) {
                top_k.offer(candidate.clone(), f);
                if f < best_fitness {
                    best_fitness = f;
                    let idx = projected.iter().position(|c| c == candidate).unwrap();
                    best_position = Some(self.population[idx].clone());
                }
            }

            log::debug!(
                "ga generation {}/{}: best={:.6} cache_size={}",
                generation + 1,
                self.generations,
                best_fitness,
                cache.len()
            );

            let mut ranked: Vec<usize> = (0..self.population.len()).collect();
            ranked.sort_by(|&a, &b| fitness[a].total_cmp(&fitness[b]));

            let elite_count = self.elite_size.min(self.population.len());
            let mut next_generation: Vec<Candidate> = ranked
                .iter()
                .take(elite_count)
                .map(|&i| self.population[i].clone())
                .collect();

            let crossover_rate = self.crossover_rate(generation);
            let mutation_rate = self.mutation_rate_at(generation);

            while next_generation.len() < self.population.len() {
                let parent1 = self.tournament_select(&self.population, &fitness, &mut rng);
                let parent2 = self.tournament_select(&self.population, &fitness, &mut rng);
                let mut child = self.crossover(parent1, parent2, crossover_rate, &mut rng);
                self.mutate(&mut child, mutation_rate, &mut rng);
                next_generation.push(child);
            }

            self.population = next_generation;
        }

        OptimizationResult {
            best_params: best_position.map(|p| self.space.project(&p)),
            best_metric: best_fitness,
            top_k: top_k.into_sorted_vec(),
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
        ParameterSpace::new(vec![
            ParameterDescriptor::new(
                "x",
                ParameterKind::Number {
                    min: -10.0,
                    max: 10.0,
                    integer: false,
                },
            ),
            ParameterDescriptor::new(
                "y",
                ParameterKind::Number {
                    min: -10.0,
                    max: 10.0,
                    integer: false,
                },
            ),
        ])
    }

    #[tokio::test]
    async fn constant_objective_converges_with_a_populated_top_k() {
        let space = space();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let ga = Ga::new(&space, 8, 3, 2, 3, 0.2, 4, 8, &mut rng);
        let result = ga.optimize(|_candidate| async { 3.0 }).await;
        assert_eq!(result.best_metric, 3.0);
        assert!(result.best_params.is_some());
        assert!(!result.top_k.is_empty());
    }

    #[tokio::test]
    async fn all_infeasible_leaves_no_best_candidate() {
        let space = space();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let ga = Ga::new(&space, 6, 2, 1, 3, 0.2, 4, 8, &mut rng);
        let result = ga.optimize(|_candidate| async { f64::INFINITY }).await;
        assert_eq!(result.best_metric, f64::INFINITY);
        assert!(result.best_params.is_none());
        assert!(result.top_k.is_empty());
    }
}
