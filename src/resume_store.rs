//! The resume/persistence boundary (spec.md 6).
//!
//! The original kept a SQLite-backed store for optimization runs and their
//! per-iteration state so a long search could be resumed. The core here
//! treats durable storage as an opaque collaborator behind one trait —
//! concrete backends (a file, a database, a remote service) are out of
//! scope; [`InMemoryResumeStore`] exists only so tests can exercise the
//! contract without one.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::CoreResult;

/// Durable key-value storage for `optimization(id)` and
/// `iteration_state(optimization_id, iteration)` entries. Keys are opaque
/// strings the caller constructs; the store does not interpret them.
pub trait ResumeStore: Send + Sync {
    fn save(&self, key: &str, value: &[u8]) -> CoreResult<()>;
    fn load(&self, key: &str) -> CoreResult<Option<Vec<u8>>>;
    fn exists(&self, key: &str) -> CoreResult<bool>;
    /// All keys currently stored with the given prefix.
    fn list(&self, prefix: &str) -> CoreResult<Vec<String>>;
    fn delete(&self, key: &str) -> CoreResult<()>;
}

/// A [`ResumeStore`] backed by a `Mutex<HashMap>`, useful for tests and for
/// embedding a run without wiring up durable storage.
#[derive(Default)]
pub struct InMemoryResumeStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryResumeStore {
    pub fn new() -> Self {
        InMemoryResumeStore::default()
    }
}

impl ResumeStore for InMemoryResumeStore {
    fn save(&self, key: &str, value: &[u8]) -> CoreResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn load(&self, key: &str) -> CoreResult<Option<Vec<u8>>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn exists(&self, key: &str) -> CoreResult<bool> {
        Ok(self.entries.lock().unwrap().contains_key(key))
    }

    fn list(&self, prefix: &str) -> CoreResult<Vec<String>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn delete(&self, key: &str) -> CoreResult<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}
