//! Runs a candidate's game sets through fresh engines and averages the
//! result (spec.md 4.F).
//!
//! One [`Simulator::run_one`] call owns one set end to end: fresh
//! `UserInfo`/`Engine`/`Statistics`, one freshly-registered strategy, the
//! assigned [`GameSet`] played round by round. [`Simulator::run_many`]
//! fans `num_sets` of those out in parallel — the only concurrency inside
//! the core — and averages whichever sets survive.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::engine::{Engine, UserInfo};
use crate::error::{CoreError, CoreResult};
use crate::gameset::GameSet;
use crate::paramspace::{ProjectedCandidate, ProjectedValue};
use crate::statistics::Statistics;
use crate::strategy::{Bindings, Strategy};

/// What a candidate's simulation produced: the config it ran under, the
/// statistics averaged over every surviving set, and any log lines
/// strategies emitted (tagged by set index).
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub config: ProjectedCandidate,
    pub statistics: Statistics,
    pub logs: Vec<String>,
}

fn config_map(candidate: &ProjectedCandidate) -> HashMap<String, ProjectedValue> {
    candidate.iter().cloned().collect()
}

pub struct Simulator;

impl Simulator {
    /// Play one [`GameSet`] to completion against a freshly-registered
    /// `strategy`, starting from `starting_balance`. Stops early (without
    /// error) once the engine's `stopping` flag is set; propagates
    /// whatever error `engine.next_round` raises (most commonly
    /// `InsufficientBalance` from a queued bet that no longer fits the
    /// balance).
    pub fn run_one(
        starting_balance: i64,
        game_set: &GameSet,
        config: &ProjectedCandidate,
        mut strategy: Box<dyn Strategy>,
    ) -> CoreResult<(Statistics, Vec<String>)> {
        let mut engine = Engine::new(UserInfo::new("sim", starting_balance));
        let mut statistics = Statistics::new(starting_balance);
        let log_sink = Arc::new(Mutex::new(Vec::new()));
        let bindings = Bindings::with_log_sink(config_map(config), log_sink.clone());

        strategy.register(&mut engine, &bindings);

        for round in game_set {
            engine.next_round(round)?;
            statistics.update(&engine);
            if engine.is_stopping() {
                break;
            }
        }

        let logs = log_sink.lock().unwrap().clone();
        Ok((statistics, logs))
    }

    /// Spawn `game_sets.len()` concurrent runs of `candidate`, each via a
    /// freshly-built strategy from `strategy_factory`. Sets that error out
    /// are dropped and logged; requires at least one survivor.
    pub async fn run_many<F>(
        starting_balance: i64,
        game_sets: Vec<GameSet>,
        candidate: ProjectedCandidate,
        strategy_factory: F,
    ) -> CoreResult<SimulationOutcome>
    where
        F: Fn() -> Box<dyn Strategy> + Send + Sync + 'static,
    {
        let strategy_factory = Arc::new(strategy_factory);
        let mut handles = Vec::with_capacity(game_sets.len());
        for game_set in game_sets {
            let candidate = candidate.clone();
            let strategy_factory = strategy_factory.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                let strategy = strategy_factory();
                Simulator::run_one(starting_balance, &game_set, &candidate, strategy)
            }));
        }

        let mut survivors = Vec::new();
        let mut logs = Vec::new();
        for (i, handle) in handles.into_iter().enumerate() {
            match handle.await.expect("set task panicked") {
                Ok((stats, set_logs)) => {
                    survivors.push(stats);
                    logs.extend(set_logs.into_iter().map(|l| format!("[set {i}] {l}")));
                }
                Err(e) => {
                    log::warn!("set {i} failed for candidate, dropping: {e}");
                }
            }
        }

        if survivors.is_empty() {
            return Err(CoreError::AggregationEmpty);
        }

        let averaged = Statistics::average_statistics(&survivors)?;
        Ok(SimulationOutcome {
            config: candidate,
            statistics: averaged,
            logs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Event, EventKind};
    use crate::gameset::build_game_sets;
    use crate::paramspace::ParameterSpace;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct NoBetStrategy;
    impl Strategy for NoBetStrategy {
        fn register(&mut self, _engine: &mut Engine, _bindings: &Bindings) {}
    }

    struct FixedBetStrategy {
        wager: i64,
        payout: f64,
    }
    impl Strategy for FixedBetStrategy {
        fn register(&mut self, engine: &mut Engine, _bindings: &Bindings) {
            let wager = self.wager;
            let payout = self.payout;
            engine.on(
                EventKind::GameStarting,
                Box::new(move |_e: &Event, engine: &mut Engine| engine.bet(wager, payout)),
            );
        }
    }

    fn empty_config() -> ProjectedCandidate {
        let space = ParameterSpace::new(vec![]);
        space.project(&Default::default())
    }

    #[test]
    fn no_bet_run_produces_all_skipped_statistics() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let sets = build_game_sets(1.98, 100, 1, &mut rng).unwrap();
        let (stats, _logs) = Simulator::run_one(
            10_000,
            &sets[0],
            &empty_config(),
            Box::new(NoBetStrategy),
        )
        .unwrap();
        assert_eq!(stats.games_played, 0);
        assert_eq!(stats.games_skipped, 100);
        assert_eq!(stats.total_wagered, 0);
        assert_eq!(stats.get_metric(), f64::INFINITY);
    }

    #[test]
    fn insufficient_balance_terminates_the_set_with_an_error() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let sets = build_game_sets(1.98, 50, 1, &mut rng).unwrap();
        let err = Simulator::run_one(
            100,
            &sets[0],
            &empty_config(),
            Box::new(FixedBetStrategy {
                wager: 200,
                payout: 2.0,
            }),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::StrategyError(_)));
    }

    #[tokio::test]
    async fn run_many_averages_surviving_sets() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let sets = build_game_sets(1.98, 200, 4, &mut rng).unwrap();
        let outcome = Simulator::run_many(10_000, sets, empty_config(), || {
            Box::new(FixedBetStrategy {
                wager: 100,
                payout: 1.5,
            }) as Box<dyn Strategy>
        })
        .await
        .unwrap();
        assert_eq!(outcome.statistics.games_played, 200);
    }

    #[tokio::test]
    async fn run_many_fails_when_every_set_fails() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let sets = build_game_sets(1.98, 50, 2, &mut rng).unwrap();
        let err = Simulator::run_many(100, sets, empty_config(), || {
            Box::new(FixedBetStrategy {
                wager: 200,
                payout: 2.0,
            }) as Box<dyn Strategy>
        })
        .await
        .unwrap_err();
        assert!(matches!(err, CoreError::AggregationEmpty));
    }
}
