//! End-to-end coverage across module boundaries: game-set generation,
//! engine/statistics interplay, simulator fan-out, and optimizer
//! convergence, exercised together rather than through module-local
//! stubs.

use std::collections::HashMap;

use crashsim::engine::{Engine, Event, EventKind, UserInfo};
use crashsim::gameset::build_game_sets;
use crashsim::paramspace::{ParameterDescriptor, ParameterKind, ParameterSpace, ProjectedValue};
use crashsim::simulator::Simulator;
use crashsim::statistics::Statistics;
use crashsim::strategy::{Bindings, Strategy};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Bets a fixed wager at a target payout read from config, every round.
struct ConfiguredFixedBet;

impl Strategy for ConfiguredFixedBet {
    fn register(&mut self, engine: &mut Engine, bindings: &Bindings) {
        let target = match bindings.config_value("target") {
            Some(ProjectedValue::Hundredths(h)) => *h as f64 / 100.0,
            _ => 1.50,
        };
        engine.on(
            EventKind::GameStarting,
            Box::new(move |_event: &Event, engine: &mut Engine| engine.bet(100, target)),
        );
    }
}

fn target_space() -> ParameterSpace {
    ParameterSpace::new(vec![ParameterDescriptor::new(
        "target",
        ParameterKind::Payout {
            min: 1.01,
            max: 10.0,
        },
    )])
}

#[test]
fn no_bet_strategy_over_a_hundred_rounds_is_fully_skipped() {
    struct Idle;
    impl Strategy for Idle {
        fn register(&mut self, _engine: &mut Engine, _bindings: &Bindings) {}
    }

    let mut rng = ChaCha8Rng::seed_from_u64(100);
    let sets = build_game_sets(1.98, 100, 1, &mut rng).unwrap();
    let config = target_space().project(&Default::default());
    let (stats, _) =
        Simulator::run_one(10_000, &sets[0], &config, Box::new(Idle)).unwrap();

    assert_eq!(stats.games_played, 0);
    assert_eq!(stats.games_skipped, 100);
    assert_eq!(stats.total_wagered, 0);
    assert_eq!(stats.get_metric(), f64::INFINITY);
}

#[test]
fn fixed_bet_win_and_loss_deltas_match_the_payout_formula() {
    let mut engine = Engine::new(UserInfo::new("p", 10_000));
    let mut stats = Statistics::new(10_000);

    engine.bet(100, 1.50).unwrap();
    engine
        .next_round(&crashsim::rng::Round {
            id: 1,
            hash: "a".into(),
            bust: 2.00,
        })
        .unwrap();
    stats.update(&engine);
    assert_eq!(engine.user_info().balance, 10_000 - 100 + 150);

    engine.bet(100, 1.50).unwrap();
    engine
        .next_round(&crashsim::rng::Round {
            id: 2,
            hash: "b".into(),
            bust: 1.20,
        })
        .unwrap();
    stats.update(&engine);
    assert_eq!(engine.user_info().balance, 10_000 - 100 + 150 - 100);
}

#[test]
fn queued_bet_placed_after_starting_lands_next_round_and_toggles_is_queued() {
    let mut engine = Engine::new(UserInfo::new("p", 10_000));
    engine.on(
        EventKind::GameStarted,
        Box::new(|_e: &Event, engine: &mut Engine| engine.bet(100, 2.00)),
    );

    engine
        .next_round(&crashsim::rng::Round {
            id: 1,
            hash: "a".into(),
            bust: 3.0,
        })
        .unwrap();
    assert_eq!(engine.get_state().wager, None);
    assert!(engine.is_bet_queued());

    engine
        .next_round(&crashsim::rng::Round {
            id: 2,
            hash: "b".into(),
            bust: 3.0,
        })
        .unwrap();
    assert_eq!(engine.get_state().wager, Some(100));
    assert!(!engine.is_bet_queued());
}

#[test]
fn insufficient_balance_is_excluded_from_aggregation_with_one_set() {
    let mut rng = ChaCha8Rng::seed_from_u64(101);
    let sets = build_game_sets(1.98, 50, 1, &mut rng).unwrap();
    let config = target_space().project(&Default::default());

    struct OverBet;
    impl Strategy for OverBet {
        fn register(&mut self, engine: &mut Engine, _bindings: &Bindings) {
            engine.on(
                EventKind::GameStarting,
                Box::new(|_e: &Event, engine: &mut Engine| engine.bet(200, 2.00)),
            );
        }
    }

    let err = Simulator::run_one(100, &sets[0], &config, Box::new(OverBet)).unwrap_err();
    assert!(matches!(err, crashsim::error::CoreError::StrategyError(_)));
}

#[tokio::test]
async fn optimizer_converges_on_a_constant_objective_with_unique_top_k() {
    let space = target_space();
    let mut rng = ChaCha8Rng::seed_from_u64(102);
    let mut config = crashsim::config::OptimizerConfig::default();
    config.pso.num_particles = 6;
    config.pso.max_iterations = 5;
    config.top_k = 4;

    let result = crashsim::optimizer::run(&config, &space, &mut rng, |_candidate| async { 42.0 }).await;

    assert_eq!(result.best_metric, 42.0);
    assert!(result.best_params.is_some());
    assert!(!result.top_k.is_empty());
    let mut seen = std::collections::HashSet::new();
    for (candidate, fitness) in &result.top_k {
        assert_eq!(*fitness, 42.0);
        assert!(seen.insert(candidate.clone()), "top_k contained a duplicate candidate");
    }
}

#[tokio::test]
async fn simulator_config_overlay_reaches_the_registered_strategy() {
    let space = target_space();
    let mut candidate = HashMap::new();
    candidate.insert("target".to_string(), 3.0);
    let projected = space.project(&candidate);

    let mut rng = ChaCha8Rng::seed_from_u64(103);
    let sets = build_game_sets(1.98, 100, 2, &mut rng).unwrap();

    let outcome = Simulator::run_many(10_000, sets, projected, || {
        Box::new(ConfiguredFixedBet) as Box<dyn Strategy>
    })
    .await
    .unwrap();

    assert_eq!(outcome.statistics.games_played, 100);
}
