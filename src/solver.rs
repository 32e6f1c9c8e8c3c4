use std::sync::{atomic::AtomicBool, Arc};

use crate::formula::{Clause, Cnf, Variable};
use crate::pool::ClausePool;

mod cdcl;
mod dpll;

pub use cdcl::CdclSolver;
pub use dpll::DpllSolver;

/// Result of a solver run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Satisfiable, with a value for every variable.
    Sat(Vec<bool>),
    Unsat,
    /// The solver ran out of budget or was interrupted before reaching a decision.
    Exhausted,
}

impl Verdict {
    pub fn is_sat(&self) -> bool {
        matches!(self, Verdict::Sat(_))
    }

    pub fn is_unsat(&self) -> bool {
        matches!(self, Verdict::Unsat)
    }

    pub fn model(&self) -> Option<&[bool]> {
        match self {
            Verdict::Sat(assignment) => Some(assignment),
            _ => None,
        }
    }
}

/// A base SAT engine. Variables are registered one by one, then clauses are added in bulk,
/// then the instance is consumed by `solve`.
pub trait Solver: Sized {
    /// Creates an empty solver instance.
    fn new() -> Self;

    /// Registers a fresh variable. Variables are numbered in creation order.
    fn new_var(&mut self) -> Variable;

    /// Adds a clause over registered variables. An empty clause makes the instance unsat.
    fn add_clause(&mut self, clause: &Clause);

    /// Solves the accumulated clauses.
    fn solve(self) -> Verdict;

    /// The solver gives up with `Verdict::Exhausted` once `flag` is raised.
    fn set_interrupt(&mut self, _flag: Arc<AtomicBool>) {}

    /// The solver gives up with `Verdict::Exhausted` after `limit` conflicts.
    fn set_conflict_limit(&mut self, _limit: u64) {}

    /// Learned clauses of low LBD are offered to `pool`.
    fn set_clause_pool(&mut self, _pool: Arc<ClausePool>) {}

    /// Creates a solver loaded with `formula`.
    fn from_cnf(formula: &Cnf) -> Self {
        let mut solver = Self::new();
        for _ in 0..formula.num_variables() {
            solver.new_var();
        }
        for clause in formula.clauses() {
            solver.add_clause(clause);
        }
        solver
    }
}
