//! Running performance accumulator for one simulated user (spec.md 4.E).
//!
//! One [`Statistics`] tracks exactly one [`crate::engine::Engine`]: call
//! [`Statistics::update`] once per settled round, reading
//! `engine.history().first()` for the round that was just appended. All
//! fields are monotonic running totals or streak counters; nothing here is
//! recomputed from scratch, so `update` must be called exactly once per
//! round in order.

use crate::engine::Engine;

/// Running totals, streaks, and extrema over a sequence of settled rounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub duration: f64,
    pub starting_balance: i64,
    pub balance: i64,
    pub balance_ath: i64,
    pub balance_atl: i64,
    pub games_total: u64,
    pub games_played: u64,
    pub games_skipped: u64,
    pub games_won: u64,
    pub games_lost: u64,
    pub profit: i64,
    pub lowest_bet: f64,
    pub highest_bet: f64,
    pub longest_win_streak: u64,
    pub longest_streak_gain: f64,
    pub since_last_win: u64,
    pub since_last_lose: u64,
    pub longest_lose_streak: u64,
    pub longest_streak_cost: i64,
    pub streak_cost: i64,
    pub streak_gain: f64,
    pub profit_per_hour: f64,
    pub profit_ath: i64,
    pub profit_atl: i64,
    pub total_wagered: i64,
    pub total_won: f64,
    pub total_lost: i64,
}

/// Divisor converting a round's `ln(bust)` into an elapsed-seconds estimate,
/// carried over unchanged from the accumulator this was ported from.
const DURATION_DIVISOR: f64 = 0.00006;

impl Statistics {
    pub fn new(initial_balance: i64) -> Self {
        Statistics {
            duration: 0.0,
            starting_balance: initial_balance,
            balance: initial_balance,
            balance_ath: initial_balance,
            balance_atl: initial_balance,
            games_total: 0,
            games_played: 0,
            games_skipped: 0,
            games_won: 0,
            games_lost: 0,
            profit: 0,
            lowest_bet: f64::INFINITY,
            highest_bet: f64::NEG_INFINITY,
            longest_win_streak: 0,
            longest_streak_gain: 0.0,
            since_last_win: 0,
            since_last_lose: 0,
            longest_lose_streak: 0,
            longest_streak_cost: 0,
            streak_cost: 0,
            streak_gain: 0.0,
            profit_per_hour: 0.0,
            profit_ath: 0,
            profit_atl: 0,
            total_wagered: 0,
            total_won: 0.0,
            total_lost: 0,
        }
    }

    /// Fold the most-recently-settled round (`engine.history().first()`)
    /// into the running totals.
    pub fn update(&mut self, engine: &Engine) {
        let last_game = match engine.history().first() {
            Some(entry) => entry,
            None => return,
        };

        self.games_total += 1;
        self.duration += last_game.bust.ln() / DURATION_DIVISOR;

        match last_game.wager {
            None => self.games_skipped += 1,
            Some(wager) => {
                self.games_played += 1;
                self.total_wagered += wager;
                if (wager as f64) < self.lowest_bet {
                    self.lowest_bet = wager as f64;
                }
                if (wager as f64) > self.highest_bet {
                    self.highest_bet = wager as f64;
                }

                match last_game.cashed_at {
                    Some(cashed_at) => {
                        self.games_won += 1;
                        let winnings = (wager as f64) * cashed_at;
                        self.total_won += winnings;
                        self.balance += winnings.round() as i64;
                        self.since_last_win = 0;
                        self.since_last_lose += 1;
                        self.streak_gain += winnings;
                        if self.since_last_lose > self.longest_win_streak {
                            self.longest_win_streak = self.since_last_lose;
                            self.longest_streak_gain = self.streak_gain;
                        }
                    }
                    None => {
                        self.games_lost += 1;
                        self.total_lost += wager;
                        self.balance -= wager;
                        self.since_last_win += 1;
                        self.since_last_lose = 0;
                        self.streak_cost += wager;
                        if self.since_last_win > self.longest_lose_streak {
                            self.longest_lose_streak = self.since_last_win;
                            self.longest_streak_cost = self.streak_cost;
                        }
                    }
                }

                if self.balance > self.balance_ath {
                    self.balance_ath = self.balance;
                }
                if self.balance < self.balance_atl {
                    self.balance_atl = self.balance;
                }

                self.profit = self.balance - self.starting_balance;
                if self.profit > self.profit_ath {
                    self.profit_ath = self.profit;
                }
                if self.profit < self.profit_atl {
                    self.profit_atl = self.profit;
                }
            }
        }

        self.profit_per_hour = if self.duration > 0.0 {
            self.profit as f64 / (self.duration / 3600.0)
        } else {
            0.0
        };

        log::debug!(
            "statistics: games_total={} games_played={} profit={}",
            self.games_total,
            self.games_played,
            self.profit
        );
    }

    /// Fitness scalar the optimizer minimizes: `-profit / sqrt(total_wagered
    /// * games_played)`. Returns `+inf` when either denominator term is
    /// zero (no rounds were ever wagered), marking the candidate as
    /// infeasible rather than dividing by zero.
    pub fn get_metric(&self) -> f64 {
        if self.total_wagered == 0 || self.games_played == 0 {
            log::debug!("{}", crate::error::CoreError::Infeasible);
            return f64::INFINITY;
        }
        let denom = ((self.total_wagered as f64) * (self.games_played as f64)).sqrt();
        -(self.profit as f64) / denom
    }

    /// Elementwise mean across `stats`, with `profit_per_hour` and the
    /// metric recomputed from the averaged fields rather than averaged
    /// themselves (averaging ratios directly would not equal the ratio of
    /// averages).
    pub fn average_statistics(stats: &[Statistics]) -> crate::error::CoreResult<Statistics> {
        if stats.is_empty() {
            return Err(crate::error::CoreError::AggregationEmpty);
        }
        let n = stats.len() as f64;
        let mut avg = Statistics::new(0);
        avg.starting_balance = (stats.iter().map(|s| s.starting_balance).sum::<i64>() as f64 / n) as i64;
        avg.balance = (stats.iter().map(|s| s.balance).sum::<i64>() as f64 / n) as i64;
        avg.balance_ath = (stats.iter().map(|s| s.balance_ath).sum::<i64>() as f64 / n) as i64;
        avg.balance_atl = (stats.iter().map(|s| s.balance_atl).sum::<i64>() as f64 / n) as i64;
        avg.games_total = (stats.iter().map(|s| s.games_total).sum::<u64>() as f64 / n) as u64;
        avg.games_played = (stats.iter().map(|s| s.games_played).sum::<u64>() as f64 / n) as u64;
        avg.games_skipped = (stats.iter().map(|s| s.games_skipped).sum::<u64>() as f64 / n) as u64;
        avg.games_won = (stats.iter().map(|s| s.games_won).sum::<u64>() as f64 / n) as u64;
        avg.games_lost = (stats.iter().map(|s| s.games_lost).sum::<u64>() as f64 / n) as u64;
        avg.profit = (stats.iter().map(|s| s.profit).sum::<i64>() as f64 / n) as i64;
        avg.lowest_bet = stats.iter().map(|s| s.lowest_bet).sum::<f64>() / n;
        avg.highest_bet = stats.iter().map(|s| s.highest_bet).sum::<f64>() / n;
        avg.longest_win_streak = (stats.iter().map(|s| s.longest_win_streak).sum::<u64>() as f64 / n) as u64;
        avg.longest_streak_gain = stats.iter().map(|s| s.longest_streak_gain).sum::<f64>() / n;
        avg.longest_lose_streak = (stats.iter().map(|s| s.longest_lose_streak).sum::<u64>() as f64 / n) as u64;
        avg.longest_streak_cost = (stats.iter().map(|s| s.longest_streak_cost).sum::<i64>() as f64 / n) as i64;
        avg.total_wagered = (stats.iter().map(|s| s.total_wagered).sum::<i64>() as f64 / n) as i64;
        avg.total_won = stats.iter().map(|s| s.total_won).sum::<f64>() / n;
        avg.total_lost = (stats.iter().map(|s| s.total_lost).sum::<i64>() as f64 / n) as i64;
        avg.duration = stats.iter().map(|s| s.duration).sum::<f64>() / n;

        avg.profit_per_hour = if avg.duration > 0.0 {
            avg.profit as f64 / (avg.duration / 3600.0)
        } else {
            0.0
        };
        Ok(avg)
    }
}
