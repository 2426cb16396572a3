//! Typed configuration for the harness (spec.md 3).
//!
//! A TOML file maps onto [`HarnessConfig`]; everything not present in the
//! file falls back to the defaults named in the optimization modules this
//! was ported from (see `DESIGN.md`). Interactive parameter selection and
//! V8-script config splitting are out of scope — a config file fully
//! determines one run.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Top-level configuration: what to simulate, how to search, how loud to
/// be about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Shape of one simulation run: balance, game-set generation, and how many
/// independent sets to average over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub starting_balance: i64,
    /// Target rounded bust median each generated game set must match.
    pub target_median_payout: f64,
    pub num_games: usize,
    #[serde(default = "default_num_sets")]
    pub num_sets: usize,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_num_sets() -> usize {
    10
}

fn default_history_capacity() -> usize {
    crate::history::DEFAULT_CAPACITY
}

/// Which population-based search to run, plus both algorithms' tunables so
/// a config file can switch between them without reshaping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    #[serde(default)]
    pub algorithm: OptimizerAlgorithm,
    #[serde(default)]
    pub pso: PsoConfig,
    #[serde(default)]
    pub ga: GaConfig,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Upper bound on candidate evaluations running at once within one
    /// iteration/generation, enforced via a `tokio::sync::Semaphore`.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_top_k() -> usize {
    10
}

fn default_concurrency() -> usize {
    8
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            algorithm: OptimizerAlgorithm::default(),
            pso: PsoConfig::default(),
            ga: GaConfig::default(),
            top_k: default_top_k(),
            concurrency: default_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerAlgorithm {
    Pso,
    Ga,
}

impl Default for OptimizerAlgorithm {
    fn default() -> Self {
        OptimizerAlgorithm::Pso
    }
}

/// Particle swarm hyperparameters, defaulted to the values this algorithm
/// has always shipped with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PsoConfig {
    #[serde(default = "default_num_particles")]
    pub num_particles: usize,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_inertia_weight")]
    pub inertia_weight: f64,
    #[serde(default = "default_cognitive_coefficient")]
    pub cognitive_coefficient: f64,
    #[serde(default = "default_social_coefficient")]
    pub social_coefficient: f64,
}

fn default_num_particles() -> usize {
    30
}
fn default_max_iterations() -> usize {
    100
}
fn default_inertia_weight() -> f64 {
    0.9
}
fn default_cognitive_coefficient() -> f64 {
    1.5
}
fn default_social_coefficient() -> f64 {
    1.5
}

impl Default for PsoConfig {
    fn default() -> Self {
        PsoConfig {
            num_particles: default_num_particles(),
            max_iterations: default_max_iterations(),
            inertia_weight: default_inertia_weight(),
            cognitive_coefficient: default_cognitive_coefficient(),
            social_coefficient: default_social_coefficient(),
        }
    }
}

/// Genetic algorithm hyperparameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GaConfig {
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    #[serde(default = "default_generations")]
    pub generations: usize,
    #[serde(default = "default_elite_size")]
    pub elite_size: usize,
    #[serde(default = "default_tournament_size")]
    pub tournament_size: usize,
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
}

fn default_population_size() -> usize {
    20
}
fn default_generations() -> usize {
    30
}
fn default_elite_size() -> usize {
    4
}
fn default_tournament_size() -> usize {
    5
}
fn default_mutation_rate() -> f64 {
    0.2
}

impl Default for GaConfig {
    fn default() -> Self {
        GaConfig {
            population_size: default_population_size(),
            generations: default_generations(),
            elite_size: default_elite_size(),
            tournament_size: default_tournament_size(),
            mutation_rate: default_mutation_rate(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

impl HarnessConfig {
    /// Load and parse a TOML config file from `path`.
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("failed to read config file {path}: {e}"))?;

        let config: HarnessConfig = toml::from_str(&content)
            .map_err(|e| anyhow!("failed to parse config file {path}: {e}"))?;

        config.validate()?;
        Ok(config)
    }

    /// Write a default config (20 000-unit balance, 1.98x target median,
    /// PSO search) to `path`.
    pub async fn create_default(path: &str) -> Result<()> {
        let config = HarnessConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("failed to serialize default config: {e}"))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("failed to write config file {path}: {e}"))?;

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.simulation.starting_balance <= 0 {
            return Err(anyhow!("simulation.starting_balance must be positive"));
        }
        if self.simulation.num_games == 0 {
            return Err(anyhow!("simulation.num_games must be at least 1"));
        }
        if self.simulation.num_sets == 0 {
            return Err(anyhow!("simulation.num_sets must be at least 1"));
        }
        if self.simulation.target_median_payout <= 1.0 {
            return Err(anyhow!(
                "simulation.target_median_payout must be greater than 1.00"
            ));
        }
        Ok(())
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            simulation: SimulationConfig {
                starting_balance: 20_000,
                target_median_payout: 1.98,
                num_games: 1_000,
                num_sets: default_num_sets(),
                history_capacity: default_history_capacity(),
            },
            optimizer: OptimizerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
