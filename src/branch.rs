/*!
Registry of unexplored branches, keyed by decision depth.

A worker records the polarity it did not try at some depth, and another worker may later
drain those branches and explore them. Nothing in the dispatcher produces or consumes
branches yet; the registry is the hand-off point for work stealing between solvers.
*/

use std::sync::{Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashMap;

use crate::formula::Variable;

#[derive(Debug, Default)]
pub struct BranchRegistry {
    paths: Mutex<FxHashMap<usize, Vec<(Variable, bool)>>>,
}

impl BranchRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    fn lock(&self) -> MutexGuard<'_, FxHashMap<usize, Vec<(Variable, bool)>>> {
        self.paths.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an unexplored `variable = value` branch at `depth`.
    pub fn record(&self, depth: usize, variable: Variable, value: bool) {
        self.lock().entry(depth).or_default().push((variable, value));
    }

    /// Removes and returns every branch recorded at `depth`, oldest first.
    pub fn drain(&self, depth: usize) -> Vec<(Variable, bool)> {
        self.lock().remove(&depth).unwrap_or_default()
    }

    /// Number of branches waiting at `depth`.
    pub fn pending(&self, depth: usize) -> usize {
        self.lock().get(&depth).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().values().all(Vec::is_empty)
    }
}
