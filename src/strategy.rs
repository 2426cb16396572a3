//! The strategy binding surface (spec.md 4.I).
//!
//! The original ran user strategies as V8 scripts inside a sandbox given
//! `engine`, `userInfo`, `config`, and a handful of host functions. Here a
//! strategy is a Rust trait object: `register` gets direct, typed access to
//! the engine plus a [`Bindings`] bundle standing in for the sandbox's host
//! functions (`log`, `SHA256`, `gameResultFromHash`, `stop`, the resolved
//! `config` map). Registration happens exactly once, synchronously, before
//! any round is played.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};

use crate::engine::Engine;
use crate::error::CoreResult;
use crate::logutil::escape_log;
use crate::paramspace::ProjectedValue;
use crate::rng::{generate_games, Round};

/// Registers event handlers on an [`Engine`]. Implementors decide entirely
/// through the handlers they register what the strategy does; `register`
/// itself must not block or loop — it only wires things up.
pub trait Strategy: Send {
    fn register(&mut self, engine: &mut Engine, bindings: &Bindings);
}

/// Host functions and resolved config handed to a strategy at registration
/// time, standing in for the original sandbox's bound globals.
pub struct Bindings {
    config: HashMap<String, ProjectedValue>,
    log_sink: Option<Arc<Mutex<Vec<String>>>>,
}

impl Bindings {
    pub fn new(config: HashMap<String, ProjectedValue>) -> Self {
        Bindings {
            config,
            log_sink: None,
        }
    }

    /// As [`Bindings::new`], but every `log()` call also pushes onto
    /// `sink` — used by the simulator to return strategy log lines as part
    /// of a [`crate::simulator::SimulationOutcome`].
    pub fn with_log_sink(
        config: HashMap<String, ProjectedValue>,
        sink: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Bindings {
            config,
            log_sink: Some(sink),
        }
    }

    /// The resolved, typed config value for `name`, if the candidate's
    /// parameter space declared one.
    pub fn config_value(&self, name: &str) -> Option<&ProjectedValue> {
        self.config.get(name)
    }

    /// Emit a log line from strategy code, sanitized to stay single-line.
    pub fn log(&self, message: &str) {
        let escaped = escape_log(message);
        log::info!("[strategy] {escaped}");
        if let Some(sink) = &self.log_sink {
            sink.lock().unwrap().push(escaped);
        }
    }

    /// Lowercase hex SHA256 of `text`.
    pub fn sha256(&self, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// A single [`Round`] derived from `seed`, via the same chain as
    /// [`crate::rng::generate_games`] with `num_games = 1`.
    pub fn game_result_from_hash(&self, seed: &str) -> CoreResult<Round> {
        let mut rounds = generate_games(seed, 1)?;
        Ok(rounds.remove(0))
    }

    /// Set the engine's stopping flag: the current round still completes,
    /// then the set that owns `engine` terminates.
    pub fn stop(&self, engine: &mut Engine, reason: &str) {
        log::info!("[strategy] stop requested: {}", escape_log(reason));
        engine.set_stopping();
    }
}
