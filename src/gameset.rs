//! Game-set builder: produces independent [`GameSet`]s whose bust median
//! matches a configured target.
//!
//! Repeatedly draws a fresh random 32-byte hex seed, generates a candidate
//! set via [`crate::rng::generate_games`], and accepts it iff the rounded
//! median of its `bust` values equals `required_median`. Bounded by
//! [`BUILDER_ATTEMPT_CAP`]; exhausting it is a hard failure — the caller
//! cannot construct the inputs the rest of the harness needs.

use rand::RngCore;

use crate::error::{CoreError, CoreResult};
use crate::rng::{generate_games, Round};

/// An ordered sequence of rounds, `len() == num_games`, whose bust median
/// matches the builder's `required_median` to 2 decimals.
pub type GameSet = Vec<Round>;

/// Hard cap on seed-generation attempts per set before giving up.
/// See DESIGN.md for the rationale (spec.md 9's open question).
pub const BUILDER_ATTEMPT_CAP: u32 = 10_000;

/// Number of attempts past which we warn that `required_median` may be
/// mistuned for this `num_games`.
const WARN_ATTEMPT_THRESHOLD: u32 = 100;

fn random_seed_hex(rng: &mut impl RngCore) -> String {
    let mut bytes = [0u8; 32];
    rng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn rounded_median(busts: &mut [f64]) -> f64 {
    busts.sort_by(|a, b| a.partial_cmp(b).expect("bust is never NaN"));
    let mid = busts.len() / 2;
    let raw = if busts.len() % 2 == 0 {
        (busts[mid - 1] + busts[mid]) / 2.0
    } else {
        busts[mid]
    };
    (raw * 100.0).round() / 100.0
}

/// Build one [`GameSet`] of `num_games` rounds whose rounded bust median
/// equals `required_median`, using `rng` to draw candidate seeds.
pub fn build_game_set(
    required_median: f64,
    num_games: usize,
    rng: &mut impl RngCore,
) -> CoreResult<GameSet> {
    for attempt in 1..=BUILDER_ATTEMPT_CAP {
        let seed = random_seed_hex(rng);
        let rounds = generate_games(&seed, num_games)?;
        let mut busts: Vec<f64> = rounds.iter().map(|r| r.bust).collect();
        if rounded_median(&mut busts) == required_median {
            if attempt > WARN_ATTEMPT_THRESHOLD {
                log::warn!(
                    "game-set builder needed {attempt} attempts to match median {required_median:.2} \
                     (num_games={num_games}); required_median may be mistuned"
                );
            }
            return Ok(rounds);
        }
    }
    Err(CoreError::BuilderExhausted {
        attempts: BUILDER_ATTEMPT_CAP,
        required_median,
    })
}

/// Build `num_sets` independent [`GameSet`]s, each matching `required_median`.
pub fn build_game_sets(
    required_median: f64,
    num_games: usize,
    num_sets: usize,
    rng: &mut impl RngCore,
) -> CoreResult<Vec<GameSet>> {
    (0..num_sets)
        .map(|_| build_game_set(required_median, num_games, rng))
        .collect()
}
