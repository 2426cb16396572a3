//! Fitness cache and top-K tracking shared by both optimizer engines
//! (spec.md 4.H, 5).
//!
//! Both are the only state shared across concurrent candidate
//! evaluations within one optimizer iteration; each is guarded by its own
//! `std::sync::Mutex`, held only for the duration of a map lookup/insert,
//! never across an `.await`.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::paramspace::ProjectedCandidate;

/// Maps a projected candidate to the fitness already computed for it, so
/// structurally-equal candidates are simulated at most once.
#[derive(Default)]
pub struct FitnessCache {
    entries: Mutex<HashMap<ProjectedCandidate, f64>>,
}

impl FitnessCache {
    pub fn new() -> Self {
        FitnessCache {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, candidate: &ProjectedCandidate) -> Option<f64> {
        self.entries.lock().unwrap().get(candidate).copied()
    }

    pub fn insert(&self, candidate: ProjectedCandidate, fitness: f64) {
        self.entries.lock().unwrap().insert(candidate, fitness);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
struct Entry {
    fitness: f64,
    candidate: ProjectedCandidate,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.fitness == other.fitness
    }
}
impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fitness.total_cmp(&other.fitness)
    }
}

/// Keeps the `k` best (lowest-fitness) unique projected candidates seen so
/// far. Infeasible (`+inf`) fitnesses never enter the set. Implemented as
/// a max-heap over the kept entries so the current worst — the one to
/// evict when a better candidate arrives — is always the root.
pub struct TopK {
    k: usize,
    heap: std::collections::BinaryHeap<Entry>,
    seen: HashSet<ProjectedCandidate>,
}

impl TopK {
    pub fn new(k: usize) -> Self {
        TopK {
            k,
            heap: std::collections::BinaryHeap::with_capacity(k),
            seen: HashSet::new(),
        }
    }

    /// Offer `candidate` with `fitness`. Ignored if infeasible or already
    /// tracked; otherwise inserted, evicting the current worst entry once
    /// the heap is at capacity and `fitness` beats it.
    pub fn offer(&mut self, candidate: ProjectedCandidate, fitness: f64) {
        if !fitness.is_finite() || self.seen.contains(&candidate) {
            return;
        }
        if self.heap.len() < self.k {
            self.seen.insert(candidate.clone());
            self.heap.push(Entry { fitness, candidate });
            return;
        }
        if let Some(worst) = self.heap.peek() {
            if fitness < worst.fitness {
                let evicted = self.heap.pop().unwrap();
                self.seen.remove(&evicted.candidate);
                self.seen.insert(candidate.clone());
                self.heap.push(Entry { fitness, candidate });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// The kept entries, best (lowest fitness) first.
    pub fn into_sorted_vec(self) -> Vec<(ProjectedCandidate, f64)> {
        let mut entries: Vec<Entry> = self.heap.into_vec();
        entries.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));
        entries
            .into_iter()
            .map(|e| (e.candidate, e.fitness))
            .collect()
    }
}
