//! The round-by-round betting engine (spec.md 4.D).
//!
//! `Engine` drives one user through a sequence of [`Round`]s, one call to
//! [`Engine::next_round`] per round. Each call runs a fixed six-step
//! transition — reset scratch, place a queued bet if one exists, settle
//! against the round's bust, append to history — emitting a
//! [`Event`] at each observable point along the way. Handlers registered
//! via [`Engine::on`] run synchronously, in registration order, and may
//! re-enter the engine (e.g. call `bet()` from inside a `GameStarting`
//! handler) because `emit` temporarily detaches the handler list it is
//! iterating before calling into `&mut Engine`.

mod events;

pub use events::{Event, EventKind, Handler};
use events::HandlerRegistry;

use crate::error::{CoreError, CoreResult};
use crate::history::{History, HistoryEntry};
use crate::rng::Round;

/// A player's running account state, mutated only by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct UserInfo {
    pub name: String,
    pub balance: i64,
    pub wagered: i64,
    pub profit: i64,
    pub wagers: u64,
}

impl UserInfo {
    pub fn new(name: impl Into<String>, starting_balance: i64) -> Self {
        UserInfo {
            name: name.into(),
            balance: starting_balance,
            wagered: 0,
            profit: 0,
            wagers: 0,
        }
    }
}

/// A placed or queued wager: stake plus target cash-out multiplier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bet {
    pub wager: i64,
    pub payout: f64,
}

/// Coarse lifecycle phase of the round currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    Starting,
    InProgress,
    Ended,
}

/// A read-only snapshot of the engine's current-round scratch state, as
/// returned by [`Engine::get_state`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
    pub round_state: RoundState,
    pub game_id: u64,
    pub hash: Option<String>,
    pub bust: Option<f64>,
    pub wager: Option<i64>,
    pub payout: Option<f64>,
    pub cashed_at: Option<f64>,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Drives one user through a sequence of rounds, emitting the
/// `GameStarting -> BetPlaced? -> GameStarted -> CashedOut? -> GameEnded`
/// event sequence for each.
pub struct Engine {
    user_info: UserInfo,
    pending_bet: Option<Bet>,
    history: History,
    handlers: HandlerRegistry,

    round_state: RoundState,
    game_id: u64,
    hash: Option<String>,
    bust: Option<f64>,
    wager: Option<i64>,
    payout: Option<f64>,
    cashed_at: Option<f64>,

    /// Once set, `bet()` is a silent no-op and any already-queued bet is
    /// dropped. Set by a strategy's `stop()` binding (spec.md 4.I).
    stopping: bool,
}

impl Engine {
    pub fn new(user_info: UserInfo) -> Self {
        Engine {
            user_info,
            pending_bet: None,
            history: History::default(),
            handlers: HandlerRegistry::new(),
            round_state: RoundState::Ended,
            game_id: 0,
            hash: None,
            bust: None,
            wager: None,
            payout: None,
            cashed_at: None,
            stopping: false,
        }
    }

    pub fn with_history_capacity(user_info: UserInfo, capacity: usize) -> Self {
        let mut engine = Engine::new(user_info);
        engine.history = History::new(capacity);
        engine
    }

    pub fn user_info(&self) -> &UserInfo {
        &self.user_info
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Register `handler` to run whenever `kind` fires, after handlers
    /// already registered for that kind.
    pub fn on(&mut self, kind: EventKind, handler: Handler) {
        self.handlers.on(kind, handler);
    }

    /// Drop every handler registered for `kind`.
    pub fn off(&mut self, kind: EventKind) {
        self.handlers.off(kind);
    }

    /// Run every handler registered for `event`'s kind, in registration
    /// order. Stops at the first handler that returns `Err` and reports it
    /// as [`CoreError::StrategyError`] — the remaining handlers for this
    /// kind do not run, but the full list is restored before returning so
    /// later rounds still see them.
    fn emit(&mut self, event: Event) -> CoreResult<()> {
        let kind = event.kind();
        let mut list = self.handlers.take_list(kind);
        let mut outcome = Ok(());
        for handler in list.iter_mut() {
            if let Err(e) = handler(&event, self) {
                outcome = Err(CoreError::StrategyError(format!(
                    "{} handler failed: {e}",
                    event.wire_name()
                )));
                break;
            }
        }
        self.handlers.put_back(kind, list);
        outcome
    }

    /// Queue `wager` at target multiplier `payout`.
    ///
    /// If called while the current round is still `STARTING` (i.e. before
    /// this round's pending-bet sweep has run), the bet is picked up by
    /// this same round. Called any later, it is queued for the next
    /// round. The two cases share one code path: the timing of the sweep
    /// in [`Engine::next_round`] is what decides which round a given call
    /// lands in.
    pub fn bet(&mut self, wager: i64, payout: f64) -> CoreResult<()> {
        if self.stopping {
            return Ok(());
        }
        if self.pending_bet.is_some() {
            return Err(CoreError::InvalidBet(
                "a bet is already queued for the next round".to_string(),
            ));
        }
        if wager <= 0 || wager % 100 != 0 {
            return Err(CoreError::InvalidBet(format!(
                "wager must be a positive multiple of 100, got {wager}"
            )));
        }
        let payout = round2(payout);
        if payout <= 1.00 {
            return Err(CoreError::InvalidBet(format!(
                "payout must be greater than 1.00, got {payout:.2}"
            )));
        }
        if self.user_info.balance < wager {
            return Err(CoreError::InsufficientBalance {
                balance: self.user_info.balance,
                wager,
            });
        }
        self.pending_bet = Some(Bet { wager, payout });
        Ok(())
    }

    /// API-parity no-op. Cash-out is decided automatically in
    /// `next_round` by comparing the bet's payout target against the
    /// round's bust; there is no manual intervention point once a round
    /// is in flight.
    pub fn cash_out(&self) {}

    pub fn cancel_queued_bet(&mut self) {
        self.pending_bet = None;
    }

    pub fn is_bet_queued(&self) -> bool {
        self.pending_bet.is_some()
    }

    /// The bet active *in the current round*, if one has been placed —
    /// distinct from a bet still queued for a future round.
    pub fn get_current_bet(&self) -> Option<Bet> {
        match (self.wager, self.payout) {
            (Some(wager), Some(payout)) => Some(Bet { wager, payout }),
            _ => None,
        }
    }

    pub fn get_state(&self) -> EngineState {
        EngineState {
            round_state: self.round_state,
            game_id: self.game_id,
            hash: self.hash.clone(),
            bust: self.bust,
            wager: self.wager,
            payout: self.payout,
            cashed_at: self.cashed_at,
        }
    }

    /// Once set, no new pending bets are accepted and the currently
    /// queued bet (if any) is dropped. Does not affect a bet already
    /// active in the round in flight.
    pub fn set_stopping(&mut self) {
        self.stopping = true;
        self.pending_bet = None;
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping
    }

    /// Advance through one round: reset scratch, sweep a queued bet into
    /// play, settle against `round.bust`, and append the result to
    /// history. Emits the full `GameStarting -> BetPlaced? -> GameStarted
    /// -> CashedOut? -> GameEnded` sequence.
    pub fn next_round(&mut self, round: &Round) -> CoreResult<()> {
        // 1. reset scratch for the new round
        self.game_id += 1;
        self.hash = None;
        self.bust = None;
        self.wager = None;
        self.payout = None;
        self.cashed_at = None;
        self.round_state = RoundState::Starting;
        self.emit(Event::GameStarting)?;

        // 2. sweep a queued bet into this round, if any
        if let Some(bet) = self.pending_bet.take() {
            if self.user_info.balance < bet.wager {
                return Err(CoreError::InsufficientBalance {
                    balance: self.user_info.balance,
                    wager: bet.wager,
                });
            }
            self.user_info.balance -= bet.wager;
            self.user_info.wagered += bet.wager;
            self.user_info.wagers += 1;
            self.wager = Some(bet.wager);
            self.payout = Some(bet.payout);
            self.emit(Event::BetPlaced {
                wager: bet.wager,
                payout: bet.payout,
            })?;
        }

        // 3. round starts
        self.round_state = RoundState::InProgress;
        self.emit(Event::GameStarted)?;

        // 4. settle against the drawn outcome
        self.hash = Some(round.hash.clone());
        self.bust = Some(round.bust);
        if let (Some(wager), Some(payout)) = (self.wager, self.payout) {
            if payout <= round.bust {
                let winnings = (wager as f64) * payout;
                let credit = winnings.round() as i64;
                self.user_info.balance += credit;
                self.user_info.profit += credit - wager;
                self.cashed_at = Some(payout);
                self.emit(Event::CashedOut {
                    wager,
                    cashed_at: payout,
                })?;
            } else {
                self.user_info.profit -= wager;
            }
        }

        // 5. append the settled round to history
        self.history.append(HistoryEntry {
            game_id: self.game_id,
            hash: round.hash.clone(),
            bust: round.bust,
            wager: self.wager,
            payout: self.payout,
            cashed_at: self.cashed_at,
        });

        // 6. round ends
        self.round_state = RoundState::Ended;
        self.emit(Event::GameEnded)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn round(id: u64, bust: f64) -> Round {
        Round {
            id,
            hash: format!("hash-{id}"),
            bust,
        }
    }

    #[test]
    fn no_bet_round_emits_starting_started_ended_only() {
        let observed = Arc::new(Mutex::new(Vec::new()));
        let mut engine = Engine::new(UserInfo::new("alice", 10_000));
        for kind in [
            EventKind::GameStarting,
            EventKind::BetPlaced,
            EventKind::GameStarted,
            EventKind::CashedOut,
            EventKind::GameEnded,
        ] {
            let observed = observed.clone();
            engine.on(
                kind,
                Box::new(move |event: &Event, _engine: &mut Engine| {
                    observed.lock().unwrap().push(event.wire_name());
                    Ok(())
                }),
            );
        }
        engine.next_round(&round(1, 1.5)).unwrap();
        assert_eq!(
            *observed.lock().unwrap(),
            vec!["GAME_STARTING", "GAME_STARTED", "GAME_ENDED"]
        );
    }

    #[test]
    fn fixed_bet_win_credits_balance_and_profit() {
        let mut engine = Engine::new(UserInfo::new("alice", 10_000));
        engine.bet(100, 2.00).unwrap();
        engine.next_round(&round(1, 2.50)).unwrap();
        let info = engine.user_info();
        assert_eq!(info.balance, 10_000 - 100 + 200);
        assert_eq!(info.profit, 100);
        assert_eq!(info.wagered, 100);
        assert_eq!(info.wagers, 1);
        assert_eq!(engine.get_state().cashed_at, Some(2.00));
    }

    #[test]
    fn fixed_bet_loss_debits_only_the_wager() {
        let mut engine = Engine::new(UserInfo::new("alice", 10_000));
        engine.bet(100, 2.00).unwrap();
        engine.next_round(&round(1, 1.20)).unwrap();
        let info = engine.user_info();
        assert_eq!(info.balance, 10_000 - 100);
        assert_eq!(info.profit, -100);
        assert_eq!(engine.get_state().cashed_at, None);
    }

    #[test]
    fn bet_placed_during_starting_is_swept_into_the_same_round() {
        let mut engine = Engine::new(UserInfo::new("alice", 10_000));
        engine.on(
            EventKind::GameStarting,
            Box::new(|_event: &Event, engine: &mut Engine| engine.bet(100, 1.50)),
        );
        engine.next_round(&round(1, 2.00)).unwrap();
        assert_eq!(engine.get_state().wager, Some(100));
        assert_eq!(engine.get_state().cashed_at, Some(1.50));
    }

    #[test]
    fn bet_placed_after_starting_queues_for_next_round() {
        let mut engine = Engine::new(UserInfo::new("alice", 10_000));
        engine.on(
            EventKind::GameStarted,
            Box::new(|_event: &Event, engine: &mut Engine| engine.bet(100, 1.50)),
        );
        engine.next_round(&round(1, 2.00)).unwrap();
        assert_eq!(engine.get_state().wager, None, "first round has no bet yet");
        assert!(engine.is_bet_queued());

        engine.next_round(&round(2, 2.00)).unwrap();
        assert_eq!(engine.get_state().wager, Some(100));
    }

    #[test]
    fn insufficient_balance_is_rejected_at_bet_time() {
        let mut engine = Engine::new(UserInfo::new("alice", 50));
        let err = engine.bet(100, 2.00).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientBalance { .. }));
    }

    #[test]
    fn cancel_queued_bet_removes_it_before_next_round() {
        let mut engine = Engine::new(UserInfo::new("alice", 10_000));
        engine.bet(100, 2.00).unwrap();
        assert!(engine.is_bet_queued());
        engine.cancel_queued_bet();
        assert!(!engine.is_bet_queued());
        engine.next_round(&round(1, 5.0)).unwrap();
        assert_eq!(engine.get_state().wager, None);
    }

    #[test]
    fn stopping_drops_queued_bet_and_rejects_new_ones() {
        let mut engine = Engine::new(UserInfo::new("alice", 10_000));
        engine.bet(100, 2.00).unwrap();
        engine.set_stopping();
        assert!(!engine.is_bet_queued());
        engine.bet(100, 2.00).unwrap(); // silent no-op
        assert!(!engine.is_bet_queued());
    }

    #[test]
    fn invalid_wager_not_a_multiple_of_one_hundred_is_rejected() {
        let mut engine = Engine::new(UserInfo::new("alice", 10_000));
        let err = engine.bet(150, 2.00).unwrap_err();
        assert!(matches!(err, CoreError::InvalidBet(_)));
    }

    #[test]
    fn invalid_payout_at_or_below_one_is_rejected() {
        let mut engine = Engine::new(UserInfo::new("alice", 10_000));
        let err = engine.bet(100, 1.00).unwrap_err();
        assert!(matches!(err, CoreError::InvalidBet(_)));
    }

    #[test]
    fn handler_side_bet_failure_aborts_the_round_as_a_strategy_error() {
        // A GameStarting handler that tries to place an over-balance bet
        // must stop the round instead of silently proceeding with no bet.
        let mut engine = Engine::new(UserInfo::new("alice", 50));
        engine.on(
            EventKind::GameStarting,
            Box::new(|_event: &Event, engine: &mut Engine| engine.bet(100, 2.00)),
        );
        let err = engine.next_round(&round(1, 5.0)).unwrap_err();
        assert!(matches!(err, CoreError::StrategyError(_)));
    }
}
