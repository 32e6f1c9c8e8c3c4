/*!
Divide-and-conquer solving over a small vertex cutset of the interaction graph.

Every assignment of the cutset variables (a mask) is tried on a bounded thread pool. For a
mask, the left and right sub-problems are independent and are solved concurrently; the mask
is satisfiable iff both are. The formula is satisfiable iff some mask is.
*/

use std::{
    marker::PhantomData,
    mem,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use rayon::prelude::*;

use crate::branch::BranchRegistry;
use crate::config::Config;
use crate::formula::{check_range, Clause, Cnf, FormulaError};
use crate::graph::InteractionGraph;
use crate::partition::{mask_assignment, Partition, PartitionError, Partitioner};
use crate::pool::ClausePool;
use crate::prelude::*;
use crate::solver::{CdclSolver, Solver, Verdict};

/// Largest cutset the dispatcher enumerates, whatever the configuration asks for.
pub const MAX_CUTSET_SIZE: usize = 20;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Invalid formula"))]
    InvalidFormula { source: FormulaError },
    #[snafu(display("The solver gave up before reaching a verdict"))]
    Undecided,
    #[snafu(display("The solver panicked while solving the whole formula"))]
    EngineFailed,
}

/// Reasons to abandon the decomposition and solve the formula directly.
#[derive(Debug, Snafu)]
enum DecompositionError {
    #[snafu(display("Failed to partition the formula"))]
    Split { source: PartitionError },
    #[snafu(display("A solver failed on some cutset assignment"))]
    FailedMask,
    #[snafu(display("A cutset of size {} has too many assignments", size))]
    TooManyMasks { size: usize },
}

/// Outcome of one cutset assignment.
enum MaskOutcome {
    Sat(Vec<bool>),
    /// A solver panicked or the sub-problems could not be built.
    Failed,
    Exhausted,
    /// Skipped because another mask was already satisfiable.
    Cancelled,
    Unsat,
}

impl MaskOutcome {
    fn priority(&self) -> u8 {
        match self {
            MaskOutcome::Sat(_) => 4,
            MaskOutcome::Failed => 3,
            MaskOutcome::Exhausted => 2,
            MaskOutcome::Cancelled => 1,
            MaskOutcome::Unsat => 0,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            MaskOutcome::Sat(_) => "SAT",
            MaskOutcome::Failed => "failed",
            MaskOutcome::Exhausted => "exhausted",
            MaskOutcome::Cancelled => "cancelled",
            MaskOutcome::Unsat => "UNSAT",
        }
    }

    /// Logical OR over masks.
    fn combine(self, other: MaskOutcome) -> MaskOutcome {
        if other.priority() > self.priority() {
            other
        } else {
            self
        }
    }
}

/// Cutset-based parallel solver over the base engine `S`.
pub struct CutsetSolver<S = CdclSolver> {
    config: Config,
    pool: Arc<ClausePool>,
    branches: Arc<BranchRegistry>,
    _engine: PhantomData<fn() -> S>,
}

impl<S: Solver> CutsetSolver<S> {
    /// Creates a dispatcher. `max_cutset_size` is capped at `MAX_CUTSET_SIZE`.
    pub fn new(mut config: Config) -> Self {
        if config.max_cutset_size > MAX_CUTSET_SIZE {
            warn!(
                "Cutset bound {} lowered to {}",
                config.max_cutset_size, MAX_CUTSET_SIZE
            );
            config.max_cutset_size = MAX_CUTSET_SIZE;
        }

        let pool = Arc::new(ClausePool::with_lbd_threshold(config.lbd_threshold));
        CutsetSolver {
            config,
            pool,
            branches: Arc::new(BranchRegistry::new()),
            _engine: PhantomData,
        }
    }

    /// Shares `pool` with the solver instances instead of a private one.
    pub fn with_clause_pool(mut self, pool: Arc<ClausePool>) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_branch_registry(mut self, branches: Arc<BranchRegistry>) -> Self {
        self.branches = branches;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn clause_pool(&self) -> &Arc<ClausePool> {
        &self.pool
    }

    pub fn branch_registry(&self) -> &Arc<BranchRegistry> {
        &self.branches
    }

    pub fn solve_cnf(&self, formula: &Cnf) -> Result<Verdict, Error> {
        self.solve(formula.clauses(), formula.num_variables())
    }

    /// Decides `clauses` over variables `[0, num_variables)`.
    ///
    /// Formulas whose cutset exceeds `max_cutset_size` are handed to a single solver.
    pub fn solve(&self, clauses: &[Clause], num_variables: usize) -> Result<Verdict, Error> {
        self.solve_with(clauses, num_variables, true)
    }

    /// Like `solve`, but tries the cutset assignments one after another on the calling
    /// thread, as when no worker pool can be built.
    pub(crate) fn solve_sequential(
        &self,
        clauses: &[Clause],
        num_variables: usize,
    ) -> Result<Verdict, Error> {
        self.solve_with(clauses, num_variables, false)
    }

    fn solve_with(
        &self,
        clauses: &[Clause],
        num_variables: usize,
        parallel: bool,
    ) -> Result<Verdict, Error> {
        check_range(clauses, num_variables).context(InvalidFormula)?;

        let graph = InteractionGraph::from_clauses(num_variables, clauses);
        let cutset = graph.find_cutset(self.config.max_cutset_size);
        info!(
            "Interaction graph: {} vertices, {} edges, cutset of size {}",
            graph.num_vertices(),
            graph.num_edges(),
            cutset.len()
        );

        if cutset.len() > self.config.max_cutset_size {
            info!(
                "Cutset size {} exceeds limit {}, solving directly",
                cutset.len(),
                self.config.max_cutset_size
            );
            return self.solve_direct(clauses, num_variables);
        }

        match self.solve_decomposed(&graph, clauses, &cutset, parallel) {
            Ok(verdict) => Ok(verdict),
            Err(e) => {
                warn!("{}, solving directly", e);
                self.solve_direct(clauses, num_variables)
            }
        }
    }

    /// A fresh solver with `num_variables` variables and the configured hooks.
    fn instance(&self, num_variables: usize) -> S {
        let mut solver = S::new();
        for _ in 0..num_variables {
            solver.new_var();
        }
        if let Some(limit) = self.config.conflict_limit {
            solver.set_conflict_limit(limit);
        }
        solver.set_clause_pool(Arc::clone(&self.pool));
        solver
    }

    fn solve_direct(&self, clauses: &[Clause], num_variables: usize) -> Result<Verdict, Error> {
        panic::catch_unwind(AssertUnwindSafe(|| {
            let mut solver = self.instance(num_variables);
            for clause in clauses {
                solver.add_clause(clause);
            }
            solver.solve()
        }))
        .map_err(|_| Error::EngineFailed)
    }

    fn solve_decomposed(
        &self,
        graph: &InteractionGraph,
        clauses: &[Clause],
        cutset: &[usize],
        parallel: bool,
    ) -> Result<Verdict, DecompositionError> {
        ensure!(
            cutset.len() < mem::size_of::<usize>() * 8,
            TooManyMasks { size: cutset.len() }
        );
        let num_masks = 1usize << cutset.len();
        let partitioner = Partitioner::new(graph, clauses, cutset).context(Split)?;
        let num_variables = graph.num_vertices();
        let stop = Arc::new(AtomicBool::new(false));

        info!(
            "Trying {} assignments for cutset of size {}",
            num_masks,
            cutset.len()
        );

        let workers = if parallel {
            self.thread_pool().map_err(|e| {
                warn!(
                    "Failed to build the worker pool ({}), trying assignments sequentially",
                    e
                )
            })
        } else {
            Err(())
        };

        let outcome = match workers {
            Ok(workers) => workers.install(|| {
                (0..num_masks)
                    .into_par_iter()
                    .map(|mask| self.solve_mask(&partitioner, num_variables, mask, &stop, true))
                    .reduce(|| MaskOutcome::Unsat, MaskOutcome::combine)
            }),
            Err(()) => (0..num_masks)
                .map(|mask| self.solve_mask(&partitioner, num_variables, mask, &stop, false))
                .fold(MaskOutcome::Unsat, MaskOutcome::combine),
        };

        match outcome {
            MaskOutcome::Sat(model) => Ok(Verdict::Sat(model)),
            MaskOutcome::Failed => FailedMask.fail(),
            // Masks are only cancelled after a satisfiable one, so this is never a proof.
            MaskOutcome::Exhausted | MaskOutcome::Cancelled => Ok(Verdict::Exhausted),
            MaskOutcome::Unsat => Ok(Verdict::Unsat),
        }
    }

    fn thread_pool(&self) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.num_threads)
            .thread_name(|index| format!("cutsat-mask-{}", index))
            .build()
    }

    fn solve_mask(
        &self,
        partitioner: &Partitioner<'_>,
        num_variables: usize,
        mask: usize,
        stop: &Arc<AtomicBool>,
        parallel: bool,
    ) -> MaskOutcome {
        if stop.load(Ordering::Relaxed) {
            return MaskOutcome::Cancelled;
        }

        let assignment = mask_assignment(mask, partitioner.cutset().len());
        let (left, right) = match partitioner.partition(&assignment) {
            Ok(sides) => sides,
            Err(e) => {
                warn!("Mask {}: {}", mask, e);
                return MaskOutcome::Failed;
            }
        };

        let solve_left = || self.solve_partition(&left, num_variables, stop);
        let solve_right = || self.solve_partition(&right, num_variables, stop);
        let verdicts = panic::catch_unwind(AssertUnwindSafe(|| {
            if parallel {
                rayon::join(solve_left, solve_right)
            } else {
                (solve_left(), solve_right())
            }
        }));

        let outcome = match verdicts {
            Ok((Verdict::Sat(left_model), Verdict::Sat(right_model))) => {
                MaskOutcome::Sat(partitioner.merge_models(&left_model, &right_model))
            }
            Ok((Verdict::Unsat, _)) | Ok((_, Verdict::Unsat)) => MaskOutcome::Unsat,
            Ok(_) => MaskOutcome::Exhausted,
            Err(_) => MaskOutcome::Failed,
        };
        debug!("Mask {:#b}: {}", mask, outcome.label());

        if self.config.short_circuit {
            if let MaskOutcome::Sat(_) = outcome {
                stop.store(true, Ordering::Relaxed);
            }
        }

        outcome
    }

    fn solve_partition(
        &self,
        partition: &Partition<'_>,
        num_variables: usize,
        stop: &Arc<AtomicBool>,
    ) -> Verdict {
        let mut solver = self.instance(num_variables);
        if self.config.short_circuit {
            solver.set_interrupt(Arc::clone(stop));
        }
        for clause in partition.clauses() {
            solver.add_clause(clause);
        }
        solver.solve()
    }
}

impl<S: Solver> Default for CutsetSolver<S> {
    fn default() -> Self {
        CutsetSolver::new(Config::default())
    }
}

/// Decides `clauses` with the default configuration and the CDCL engine.
pub fn is_satisfiable(clauses: &[Clause], num_variables: usize) -> Result<bool, Error> {
    match CutsetSolver::<CdclSolver>::default().solve(clauses, num_variables)? {
        Verdict::Sat(_) => Ok(true),
        Verdict::Unsat => Ok(false),
        Verdict::Exhausted => Undecided.fail(),
    }
}
