/*!
Thread-safe store of high-quality learned clauses shared between solver instances.
*/

use std::sync::{Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashSet;

use crate::formula::{Clause, Literal};

/// Only clauses whose LBD is at most this value are admitted by default.
pub const DEFAULT_LBD_THRESHOLD: usize = 2;

#[derive(Default)]
struct PoolInner {
    clauses: Vec<Clause>,
    /// Sorted, deduplicated literal sets of the stored clauses.
    keys: FxHashSet<Vec<Literal>>,
}

/// Deduplicated collection of glue clauses. Grows monotonically.
///
/// Two clauses are duplicates when they contain the same set of literals, regardless of
/// literal order or repetition.
pub struct ClausePool {
    lbd_threshold: usize,
    inner: Mutex<PoolInner>,
}

impl ClausePool {
    pub fn new() -> Self {
        ClausePool::with_lbd_threshold(DEFAULT_LBD_THRESHOLD)
    }

    pub fn with_lbd_threshold(lbd_threshold: usize) -> Self {
        ClausePool {
            lbd_threshold,
            inner: Mutex::new(PoolInner::default()),
        }
    }

    pub fn lbd_threshold(&self) -> usize {
        self.lbd_threshold
    }

    fn lock(&self) -> MutexGuard<'_, PoolInner> {
        // Each operation leaves the pool consistent, so a panic elsewhere cannot corrupt it.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `clause` if `lbd` is within the threshold and no equal clause is stored yet.
    /// Returns true if the clause was added.
    pub fn admit(&self, clause: &Clause, lbd: usize) -> bool {
        if lbd > self.lbd_threshold {
            return false;
        }

        let mut key = clause.literals().to_vec();
        key.sort_unstable();
        key.dedup();

        let mut inner = self.lock();
        if inner.keys.insert(key) {
            inner.clauses.push(clause.clone());
            true
        } else {
            false
        }
    }

    /// Point-in-time copy of all admitted clauses.
    pub fn snapshot(&self) -> Vec<Clause> {
        self.lock().clauses.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ClausePool {
    fn default() -> Self {
        ClausePool::new()
    }
}

impl std::fmt::Debug for ClausePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClausePool")
            .field("lbd_threshold", &self.lbd_threshold)
            .field("len", &self.len())
            .finish()
    }
}
