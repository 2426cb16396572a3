//! Error types for the crash-sim core.
//!
//! One [`CoreError`] variant per error kind named in the spec's error
//! handling design: malformed bets, balance violations, exhausted set
//! generation, strategy failures, empty aggregation, and infeasible
//! fitness. Callers that need to bubble these past the library boundary
//! (e.g. an embedding binary) can convert via `anyhow::Error::from`.

use thiserror::Error;

/// Errors that can arise while generating game outcomes, running the
/// engine, simulating a candidate, or aggregating statistics.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A wager or payout violated the engine's bet validation rules.
    #[error("invalid bet: {0}")]
    InvalidBet(String),

    /// A debit would have driven `UserInfo.balance` negative.
    #[error("insufficient balance: balance {balance} < wager {wager}")]
    InsufficientBalance { balance: i64, wager: i64 },

    /// No game set matching `required_median` was found within the
    /// attempt cap. Aborts the whole optimization run per spec.
    #[error("game-set builder exhausted after {attempts} attempts targeting median {required_median:.2}")]
    BuilderExhausted {
        attempts: u32,
        required_median: f64,
    },

    /// The seed supplied to the crash RNG was malformed (not valid hex, or
    /// not enough bytes to derive the HMAC key material from).
    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    /// The strategy failed to load or a registered handler failed.
    #[error("strategy error: {0}")]
    StrategyError(String),

    /// `average_statistics` was called with zero survivors.
    #[error("cannot aggregate statistics: no sets survived")]
    AggregationEmpty,

    /// The fitness metric's numerator/denominator was undefined
    /// (`games_played == 0` or `total_wagered == 0`). Surfaced to the
    /// optimizer as the sentinel `+inf`, never mixed into aggregates.
    #[error("fitness is infeasible for this candidate")]
    Infeasible,
}

pub type CoreResult<T> = Result<T, CoreError>;
