use std::{
    mem::take,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use typed_index_collections::TiVec;

use crate::formula::{Clause, Literal, Variable};
use crate::pool::ClausePool;

use self::{
    conflict::{ConflictAnalyzer, ConflictDataProvider, Learnt},
    vsids::VsidsScoring,
};

use super::{Solver, Verdict};

mod conflict;
mod vsids;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClauseRef(usize);

impl From<usize> for ClauseRef {
    fn from(index: usize) -> Self {
        ClauseRef(index)
    }
}

impl From<ClauseRef> for usize {
    fn from(index: ClauseRef) -> Self {
        index.0
    }
}

type ClauseDb = TiVec<ClauseRef, Vec<Literal>>;

/// Assignment trail with the decision level and antecedent of every assigned variable.
#[derive(Default)]
struct Trail {
    values: Vec<Option<bool>>,
    levels: Vec<usize>,
    reasons: Vec<Option<ClauseRef>>,
    /// Assigned literals in assignment order.
    stack: Vec<Literal>,
    /// Start of each decision level in `stack`.
    limits: Vec<usize>,
    /// Next literal in `stack` to propagate.
    head: usize,
}

impl Trail {
    fn grow(&mut self) {
        self.values.push(None);
        self.levels.push(0);
        self.reasons.push(None);
    }

    fn decision_level(&self) -> usize {
        self.limits.len()
    }

    fn value(&self, literal: Literal) -> Option<bool> {
        literal.partial_value(&self.values)
    }

    fn assign(&mut self, literal: Literal, reason: Option<ClauseRef>) {
        let index = literal.index();
        self.values[index] = Some(literal.positive());
        self.levels[index] = self.decision_level();
        self.reasons[index] = reason;
        self.stack.push(literal);
    }

    fn new_decision_level(&mut self) {
        self.limits.push(self.stack.len());
    }
}

/// Read-only view handed to the conflict analyzer.
struct Antecedents<'a> {
    trail: &'a Trail,
    clauses: &'a ClauseDb,
}

impl<'a> ConflictDataProvider for Antecedents<'a> {
    fn level(&self, variable: Variable) -> usize {
        self.trail.levels[variable.index()]
    }

    fn reason(&self, variable: Variable) -> Option<&[Literal]> {
        self.trail.reasons[variable.index()].map(|reason| self.clauses[reason].as_slice())
    }
}

/// Conflict-driven clause learning solver with two watched literals, first-UIP learning,
/// VSIDS branching with phase saving and geometric restarts.
#[derive(Default)]
pub struct CdclSolver {
    num_variables: usize,
    /// The first two literals of each clause are watched.
    clauses: ClauseDb,
    /// Literal code -> clauses watching that literal.
    watches: Vec<Vec<ClauseRef>>,
    /// Unit clauses added before search.
    units: Vec<Literal>,
    /// Set once an empty clause has been added.
    inconsistent: bool,
    trail: Trail,
    analyzer: ConflictAnalyzer,
    vsids: VsidsScoring,
    /// Last value of each variable, reused when it is picked again.
    phases: Vec<bool>,
    conflicts: u64,
    conflict_limit: Option<u64>,
    interrupt: Option<Arc<AtomicBool>>,
    pool: Option<Arc<ClausePool>>,
}

impl CdclSolver {
    const FIRST_RESTART: u64 = 100;
    const RESTART_GROWTH: f64 = 1.5;

    fn attach(&mut self, literals: Vec<Literal>) -> ClauseRef {
        let first = literals[0].code();
        let second = literals[1].code();
        let clause_ref = self.clauses.push_and_get_key(literals);
        self.watches[first].push(clause_ref);
        self.watches[second].push(clause_ref);
        clause_ref
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Relaxed))
    }

    fn out_of_budget(&self) -> bool {
        self.conflict_limit
            .map_or(false, |limit| self.conflicts >= limit)
    }

    /// Propagates every pending assignment. Returns a falsified clause on conflict.
    fn propagate(&mut self) -> Option<ClauseRef> {
        let CdclSolver {
            clauses,
            watches,
            trail,
            ..
        } = self;

        while trail.head < trail.stack.len() {
            let false_literal = !trail.stack[trail.head];
            trail.head += 1;

            let mut watchers = take(&mut watches[false_literal.code()]);
            let mut kept = 0;
            let mut next = 0;
            let mut conflict = None;

            while next < watchers.len() {
                let clause_ref = watchers[next];
                next += 1;

                let literals = &mut clauses[clause_ref];
                if literals[0] == false_literal {
                    literals.swap(0, 1);
                }
                let first = literals[0];

                if trail.value(first) == Some(true) {
                    watchers[kept] = clause_ref;
                    kept += 1;
                    continue;
                }

                let replacement =
                    (2..literals.len()).find(|&k| trail.value(literals[k]) != Some(false));
                if let Some(k) = replacement {
                    literals.swap(1, k);
                    watches[literals[1].code()].push(clause_ref);
                    continue;
                }

                watchers[kept] = clause_ref;
                kept += 1;

                if trail.value(first) == Some(false) {
                    conflict = Some(clause_ref);
                    while next < watchers.len() {
                        watchers[kept] = watchers[next];
                        kept += 1;
                        next += 1;
                    }
                } else {
                    trail.assign(first, Some(clause_ref));
                }
            }

            watchers.truncate(kept);
            watches[false_literal.code()] = watchers;

            if conflict.is_some() {
                return conflict;
            }
        }

        None
    }

    fn learn(&mut self, conflict: ClauseRef) -> Learnt {
        let provider = Antecedents {
            trail: &self.trail,
            clauses: &self.clauses,
        };
        self.analyzer.analyze(
            &provider,
            self.trail.decision_level(),
            &self.clauses[conflict],
            &self.trail.stack,
        )
    }

    fn backtrack(&mut self, level: usize) {
        if self.trail.decision_level() <= level {
            return;
        }

        let limit = self.trail.limits[level];
        while self.trail.stack.len() > limit {
            if let Some(literal) = self.trail.stack.pop() {
                let index = literal.index();
                self.trail.values[index] = None;
                self.trail.reasons[index] = None;
                self.phases[index] = literal.positive();
                self.vsids.insert(literal.variable());
            }
        }
        self.trail.limits.truncate(level);
        self.trail.head = self.trail.stack.len();
    }

    /// Picks the unassigned variable of highest activity with its saved phase.
    fn pick_branch(&mut self) -> Option<Literal> {
        while let Some(variable) = self.vsids.top() {
            if self.trail.values[variable.index()].is_some() {
                self.vsids.remove(variable);
            } else {
                return Some(Literal::new(variable, self.phases[variable.index()]));
            }
        }
        None
    }

    fn share(&self, literals: &[Literal], lbd: usize) {
        if let Some(pool) = &self.pool {
            if lbd <= pool.lbd_threshold() && pool.admit(&Clause::new(literals.to_vec()), lbd) {
                trace!("Shared learned clause of size {} (LBD {})", literals.len(), lbd);
            }
        }
    }

    fn search(&mut self) -> Verdict {
        let mut restart_limit = Self::FIRST_RESTART as f64;
        let mut conflicts_since_restart = 0u64;

        loop {
            if let Some(conflict) = self.propagate() {
                self.conflicts += 1;
                conflicts_since_restart += 1;

                if self.trail.decision_level() == 0 {
                    return Verdict::Unsat;
                }

                let Learnt {
                    literals,
                    backjump,
                    lbd,
                } = self.learn(conflict);
                self.share(&literals, lbd);
                self.vsids.learn_clause(&literals);
                self.vsids.decay();

                self.backtrack(backjump);
                let asserting = literals[0];
                if literals.len() == 1 {
                    self.trail.assign(asserting, None);
                } else {
                    let clause_ref = self.attach(literals);
                    self.trail.assign(asserting, Some(clause_ref));
                }

                if self.out_of_budget() || self.interrupted() {
                    debug!("CDCL stopped after {} conflicts", self.conflicts);
                    return Verdict::Exhausted;
                }
            } else {
                if self.interrupted() {
                    return Verdict::Exhausted;
                }

                if conflicts_since_restart as f64 >= restart_limit {
                    trace!("Restart after {} conflicts", self.conflicts);
                    conflicts_since_restart = 0;
                    restart_limit *= Self::RESTART_GROWTH;
                    self.backtrack(0);
                    continue;
                }

                match self.pick_branch() {
                    Some(literal) => {
                        self.trail.new_decision_level();
                        self.trail.assign(literal, None);
                    }
                    None => {
                        let model = self
                            .trail
                            .values
                            .iter()
                            .map(|value| value.unwrap_or(false))
                            .collect();
                        return Verdict::Sat(model);
                    }
                }
            }
        }
    }
}

impl Solver for CdclSolver {
    fn new() -> Self {
        Default::default()
    }

    fn new_var(&mut self) -> Variable {
        let variable =
            Variable::from_index(self.num_variables).expect("too many variables registered");
        self.num_variables += 1;
        self.trail.grow();
        self.watches.push(Vec::new());
        self.watches.push(Vec::new());
        self.phases.push(false);
        variable
    }

    fn add_clause(&mut self, clause: &Clause) {
        let mut literals = clause.literals().to_vec();
        literals.sort_unstable();
        literals.dedup();
        if literals.windows(2).any(|pair| pair[0] == !pair[1]) {
            // Tautology
            return;
        }

        match literals.len() {
            0 => self.inconsistent = true,
            1 => self.units.push(literals[0]),
            _ => {
                self.attach(literals);
            }
        }
    }

    fn solve(mut self) -> Verdict {
        if self.inconsistent {
            return Verdict::Unsat;
        }

        let mut occurrences = vec![0; self.num_variables];
        for literal in self.clauses.iter().flatten().chain(&self.units) {
            occurrences[literal.index()] += 1;
        }
        self.vsids = VsidsScoring::new(&occurrences);
        self.analyzer = ConflictAnalyzer::new(self.num_variables);

        for literal in take(&mut self.units) {
            match self.trail.value(literal) {
                Some(true) => {}
                Some(false) => return Verdict::Unsat,
                None => self.trail.assign(literal, None),
            }
        }

        let verdict = self.search();
        trace!(
            "CDCL finished with {} conflicts, {} clauses",
            self.conflicts,
            self.clauses.len()
        );
        verdict
    }

    fn set_interrupt(&mut self, flag: Arc<AtomicBool>) {
        self.interrupt = Some(flag);
    }

    fn set_conflict_limit(&mut self, limit: u64) {
        self.conflict_limit = Some(limit);
    }

    fn set_clause_pool(&mut self, pool: Arc<ClausePool>) {
        self.pool = Some(pool);
    }
}
