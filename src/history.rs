//! Fixed-capacity ring of completed round results.
//!
//! `first()` returns the most-recently-appended entry — the convention the
//! statistics accumulator relies on (it always reads `history.first()` as
//! "the round that was just completed"). `last()` returns the oldest entry
//! still retained.

use std::collections::VecDeque;

/// One settled round as recorded into history by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub game_id: u64,
    pub hash: String,
    pub bust: f64,
    pub wager: Option<i64>,
    pub payout: Option<f64>,
    pub cashed_at: Option<f64>,
}

/// Ring buffer over the last `capacity` [`HistoryEntry`] values.
#[derive(Debug, Clone)]
pub struct History {
    capacity: usize,
    data: VecDeque<HistoryEntry>,
}

/// Default ring capacity per spec.md 4.C.
pub const DEFAULT_CAPACITY: usize = 50;

impl History {
    pub fn new(capacity: usize) -> Self {
        History {
            capacity,
            data: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a round, overwriting the oldest entry once at capacity.
    pub fn append(&mut self, entry: HistoryEntry) {
        if self.data.len() == self.capacity {
            self.data.pop_back();
        }
        self.data.push_front(entry);
    }

    /// The most-recently-appended entry.
    pub fn first(&self) -> Option<&HistoryEntry> {
        self.data.front()
    }

    /// The oldest entry still retained.
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.data.back()
    }

    /// Insertion-ordered copy (oldest first).
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.data.iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for History {
    fn default() -> Self {
        History::new(DEFAULT_CAPACITY)
    }
}
