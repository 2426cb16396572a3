//! Typed round events and the engine's handler registry.
//!
//! The original event emitter is stringly-typed (`on(event, callback)`
//! against a dict of lists). Here each event is a variant of a tagged enum
//! so a mistyped event name is a compile error, and the emission order
//! invariant (`Starting -> BetPlaced? -> Started -> CashedOut? -> Ended`)
//! is enforced by the engine calling a fixed sequence of `emit` calls
//! rather than by convention.

/// One round-lifecycle event, carrying its spec.md 4.D payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    GameStarting,
    BetPlaced { wager: i64, payout: f64 },
    GameStarted,
    CashedOut { wager: i64, cashed_at: f64 },
    GameEnded,
}

impl Event {
    /// The wire-level string name a strategy-facing consumer would see
    /// (spec.md 6's "Event names").
    pub fn wire_name(&self) -> &'static str {
        match self {
            Event::GameStarting => "GAME_STARTING",
            Event::BetPlaced { .. } => "BET_PLACED",
            Event::GameStarted => "GAME_STARTED",
            Event::CashedOut { .. } => "CASHED_OUT",
            Event::GameEnded => "GAME_ENDED",
        }
    }
}

/// Which event kind a handler was registered against — used as the key
/// into the engine's per-kind handler lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    GameStarting,
    BetPlaced,
    GameStarted,
    CashedOut,
    GameEnded,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::GameStarting => EventKind::GameStarting,
            Event::BetPlaced { .. } => EventKind::BetPlaced,
            Event::GameStarted => EventKind::GameStarted,
            Event::CashedOut { .. } => EventKind::CashedOut,
            Event::GameEnded => EventKind::GameEnded,
        }
    }
}

use super::Engine;
use crate::error::CoreResult;

/// A handler registered via [`crate::engine::Engine::on`]. Boxed so the
/// engine can hold a heterogeneous, registration-ordered list per event
/// kind without generics leaking into the engine's public type.
///
/// Takes `&mut Engine` (not just the event) so a handler can legally
/// re-enter the engine — e.g. call `bet()` from inside a `GameStarting`
/// handler, per the reentrancy invariant in spec.md 5.
///
/// Returns `CoreResult<()>` so a handler-side failure (e.g. `bet()`
/// rejecting an over-large wager) is observable by `Engine::emit` instead
/// of being silently swallowed — the error aborts the round in progress.
pub type Handler = Box<dyn FnMut(&Event, &mut Engine) -> CoreResult<()> + Send>;

/// Per-event-kind lists of handlers, invoked synchronously in registration
/// order — the Rust equivalent of the original's `_event_callbacks` dict.
#[derive(Default)]
pub struct HandlerRegistry {
    game_starting: Vec<Handler>,
    bet_placed: Vec<Handler>,
    game_started: Vec<Handler>,
    cashed_out: Vec<Handler>,
    game_ended: Vec<Handler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn list_mut(&mut self, kind: EventKind) -> &mut Vec<Handler> {
        match kind {
            EventKind::GameStarting => &mut self.game_starting,
            EventKind::BetPlaced => &mut self.bet_placed,
            EventKind::GameStarted => &mut self.game_started,
            EventKind::CashedOut => &mut self.cashed_out,
            EventKind::GameEnded => &mut self.game_ended,
        }
    }

    /// Register `handler` to run (in order) whenever `kind` is emitted.
    pub fn on(&mut self, kind: EventKind, handler: Handler) {
        self.list_mut(kind).push(handler);
    }

    /// Drop all handlers registered for `kind`.
    pub fn off(&mut self, kind: EventKind) {
        self.list_mut(kind).clear();
    }

    /// Temporarily remove the handler list for `kind`, leaving an empty
    /// `Vec` in its place. Paired with [`HandlerRegistry::put_back`] so
    /// `Engine::emit` can hand each handler `&mut Engine` (which also owns
    /// this registry) without aliasing `self.handlers` while iterating it.
    pub fn take_list(&mut self, kind: EventKind) -> Vec<Handler> {
        std::mem::take(self.list_mut(kind))
    }

    pub fn put_back(&mut self, kind: EventKind, list: Vec<Handler>) {
        *self.list_mut(kind) = list;
    }
}
