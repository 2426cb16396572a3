//! # crashsim — backtesting and optimization harness for crash-style betting strategies
//!
//! `crashsim` replays a user-supplied strategy against deterministically
//! generated crash-game outcomes, accumulates running statistics, and
//! searches a typed parameter space for the configuration that minimizes a
//! scalar fitness — all without ever touching a live game.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use crashsim::config::HarnessConfig;
//! use crashsim::engine::{Engine, Event, EventKind, UserInfo};
//! use crashsim::gameset::build_game_set;
//! use crashsim::statistics::Statistics;
//!
//! fn main() -> anyhow::Result<()> {
//!     env_logger::init();
//!     let config = HarnessConfig::default();
//!     let mut rng = rand::thread_rng();
//!     let game_set = build_game_set(
//!         config.simulation.target_median_payout,
//!         config.simulation.num_games,
//!         &mut rng,
//!     )?;
//!
//!     let mut engine = Engine::new(UserInfo::new("player", config.simulation.starting_balance));
//!     let mut stats = Statistics::new(config.simulation.starting_balance);
//!     engine.on(
//!         EventKind::GameStarting,
//!         Box::new(|_e: &Event, engine: &mut Engine| engine.bet(100, 2.00)),
//!     );
//!     for round in &game_set {
//!         engine.next_round(round)?;
//!         stats.update(&engine);
//!     }
//!     println!("metric = {}", stats.get_metric());
//!     Ok(())
//! }
//! ```
//!
//! ## Module organization
//!
//! - [`rng`] — the provably-fair HMAC-SHA256 hash chain producing bust multipliers.
//! - [`gameset`] — builds median-matched [`gameset::GameSet`]s from that chain.
//! - [`history`] — the fixed-capacity ring of settled rounds.
//! - [`engine`] — the round-by-round betting state machine and its event model.
//! - [`statistics`] — the running performance accumulator and fitness metric.
//! - [`strategy`] — the trait and host bindings a strategy registers handlers through.
//! - [`simulator`] — runs a candidate's game sets and averages the result.
//! - [`paramspace`] — typed parameter sampling and projection.
//! - [`optimizer`] — PSO and GA search over the parameter space.
//! - [`resume_store`] — the optional durable-storage boundary.
//! - [`config`] — typed, TOML-backed harness configuration.
//! - [`error`] — the crate's error type.

pub mod config;
pub mod engine;
pub mod error;
pub mod gameset;
pub mod history;
pub mod logutil;
pub mod optimizer;
pub mod paramspace;
pub mod resume_store;
pub mod rng;
pub mod simulator;
pub mod statistics;
pub mod strategy;
