//! Particle swarm optimization over a [`ParameterSpace`] (spec.md 4.H,
//! primary engine).
//!
//! Each particle carries a real-valued position and velocity, one
//! coordinate per parameter, in native units. Every iteration projects
//! each particle's position into a legal [`ProjectedCandidate`], evaluates
//! its fitness (deduplicated through the shared [`FitnessCache`]), updates
//! personal/global bests, then steps velocity and position. Projection
//! absorbs any overshoot from the unclamped velocity update.

use std::future::Future;
use std::sync::Arc;

use rand::Rng;
use tokio::sync::Semaphore;

use crate::optimizer::cache::{FitnessCache, TopK};
use crate::optimizer::OptimizationResult;
use crate::paramspace::{Candidate, ParameterSpace};

struct Particle {
    position: Candidate,
    velocity: Candidate,
    pbest_position: Candidate,
    pbest_fitness: f64,
}

/// Particle swarm optimizer: `num_particles` candidates searched for
/// `max_iterations` steps with inertia `w` and acceleration coefficients
/// `c1`/`c2`.
pub struct Pso<'a> {
    space: &'a ParameterSpace,
    max_iterations: usize,
    w: f64,
    c1: f64,
    c2: f64,
    top_k_size: usize,
    concurrency: usize,
    particles: Vec<Particle>,
    gbest_position: Option<Candidate>,
    gbest_fitness: f64,
}

impl<'a> Pso<'a> {
    pub fn new(
        space: &'a ParameterSpace,
        num_particles: usize,
        max_iterations: usize,
        w: f64,
        c1: f64,
        c2: f64,
        top_k_size: usize,
        concurrency: usize,
        rng: &mut impl Rng,
    ) -> Self {
        let particles = (0..num_particles)
            .map(|_| {
                let position = space.sample(rng);
                let velocity = position.keys().map(|k| (k.clone(), 0.0)).collect();
                Particle {
                    pbest_position: position.clone(),
                    position,
                    velocity,
                    pbest_fitness: f64::INFINITY,
                }
            })
            .collect();

        Pso {
            space,
            max_iterations,
            w,
            c1,
            c2,
            top_k_size,
            concurrency,
            particles,
            gbest_position: None,
            gbest_fitness: f64::INFINITY,
        }
    }

    /// Run the full search, calling `objective` (via `cache`) at most once
    /// per unique projected candidate per iteration. At most `concurrency`
    /// evaluations run at once within one iteration.
    pub async fn optimize<F, Fut>(mut self, objective: F) -> OptimizationResult
    where
        F: Fn(crate::paramspace::ProjectedCandidate) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = f64> + Send + 'static,
    {
        let cache = FitnessCache::new();
        let mut top_k = TopK::new(self.top_k_size);
        let mut rng = rand::thread_rng();
        let semaphore = Arc::new(Semaphore::new(self.concurrency.max(1)));

        for iteration in 0..self.max_iterations {
            let projected: Vec<_> = self
                .particles
                .iter()
                .map(|p| self.space.project(&p.position))
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

            for (i, candidate) in projected.iter().enumerate() {
                let fitness = cache.get(candidate).unwrap_or(f64::INFINITY);
                top_k.offer(candidate.clone(), fitness);

                if fitness < self.particles[i].pbest_fitness {
                    self.particles[i].pbest_fitness = fitness;
                    self.particles[i].pbest_position = self.particles[i].position.clone();
                }
                if fitness < self.gbest_fitness {
                    self.gbest_fitness = fitness;
                    self.gbest_position = Some(self.particles[i].position.clone());
                }
            }

            log::debug!(
                "pso iteration {}/{}: gbest={:.6} cache_size={}",
                iteration + 1,
                self.max_iterations,
                self.gbest_fitness,
                cache.len()
            );

            if let Some(gbest) = self.gbest_position.clone() {
                for particle in self.particles.iter_mut() {
                    for (name, x) in particle.position.clone() {
                        let pbest = particle.pbest_position.get(&name).copied().unwrap_or(x);
                        let g = gbest.get(&name).copied().unwrap_or(x);
                        let r1: f64 = rng.gen_range(0.0..1.0);
                        let r2: f64 = rng.gen_range(0.0..1.0);
                        let v = particle.velocity.entry(name.clone()).or_insert(0.0);
                        *v = self.w * *v + self.c1 * r1 * (pbest - x) + self.c2 * r2 * (g - x);
                        *particle.position.get_mut(&name).unwrap() = x + *v;
                    }
                }
            }
        }

        OptimizationResult {
            best_params: self.gbest_position.map(|p| self.space.project(&p)),
            best_metric: self.gbest_fitness,
            top_k: top_k.into_sorted_vec(),
        }
    }
}
