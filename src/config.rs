use crate::{graph::DEFAULT_MAX_CUTSET_SIZE, pool::DEFAULT_LBD_THRESHOLD};

/// Tuning knobs of the cutset dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Largest cutset worth enumerating. Bigger cutsets fall back to a direct solve.
    pub max_cutset_size: usize,
    /// Worker threads for the mask fan-out. `0` lets rayon pick.
    pub num_threads: usize,
    /// Skip and interrupt remaining masks once one is satisfiable.
    pub short_circuit: bool,
    /// Conflict budget handed to every solver instance.
    pub conflict_limit: Option<u64>,
    /// Admission threshold of the shared clause pool.
    pub lbd_threshold: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_cutset_size: DEFAULT_MAX_CUTSET_SIZE,
            num_threads: 0,
            short_circuit: true,
            conflict_limit: None,
            lbd_threshold: DEFAULT_LBD_THRESHOLD,
        }
    }
}
