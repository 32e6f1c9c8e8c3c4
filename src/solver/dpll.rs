use crate::formula::{Clause, Literal, Variable};

use self::inner::Watch;

use super::{Solver, Verdict};

/// Internal modules whose implementation details are hidden from the solver.
mod inner {
    use std::ops::{Index, IndexMut};

    use crate::formula::{Clause, Literal};

    /// Literal -> indices of the clauses containing it.
    #[derive(Debug, Default)]
    pub struct Watch {
        occurrences: Vec<Vec<usize>>,
    }

    impl Watch {
        pub fn new(num_variables: usize, clauses: &[Clause]) -> Self {
            let mut watch = Self {
                occurrences: vec![Vec::new(); 2 * num_variables],
            };

            for (idx, clause) in clauses.iter().enumerate() {
                for literal in clause.iter() {
                    watch[literal].push(idx);
                }
            }

            watch
        }
    }

    impl Index<Literal> for Watch {
        type Output = Vec<usize>;

        fn index(&self, literal: Literal) -> &Self::Output {
            &self.occurrences[literal.code()]
        }
    }

    impl IndexMut<Literal> for Watch {
        fn index_mut(&mut self, literal: Literal) -> &mut Self::Output {
            &mut self.occurrences[literal.code()]
        }
    }
}

#[derive(Clone, Debug, Default)]
struct ClauseStat {
    /// Satisfied literal count in the clause.
    satisfied: usize,
    /// Unsatisfied literal count in the clause.
    unsatisfied: usize,
}

/// Chronological backtracking search with unit propagation. Slow, but simple enough to
/// serve as a reference for the other solvers.
#[derive(Debug, Default)]
pub struct DpllSolver {
    num_variables: usize,
    /// Clauses with duplicate literals merged. Tautologies are never stored.
    clauses: Vec<Clause>,
    watch: Watch,
    /// Variable index -> assigned status
    assignment: Vec<Option<bool>>,
    /// Clause index -> clause stat
    clause_stats: Vec<ClauseStat>,
    /// Cache for `clauses.count(satisfied_literals > 0)`
    satisfied_clauses: usize,
    /// Cache for `clauses.count(unsatisfied_literals == clause.num_literals)`
    unsatisfied_clauses: usize,
    assigned_stack: Vec<Literal>,
}

impl DpllSolver {
    fn assigned_value(&self, literal: Literal) -> Option<bool> {
        literal.partial_value(&self.assignment)
    }

    /// Returns a forced literal in a unit clause.
    fn forced_assignment(&self, clause_index: usize) -> Option<Literal> {
        let clause = &self.clauses[clause_index];
        let stat = &self.clause_stats[clause_index];
        if stat.satisfied == 0 && stat.unsatisfied + 1 == clause.len() {
            clause
                .iter()
                .find(|&literal| self.assigned_value(literal).is_none())
        } else {
            None
        }
    }

    /// Finds the next unit clause if exists and returns the forced literal.
    fn search_unit_clause(&self) -> Option<Literal> {
        (0..self.clauses.len()).find_map(|clause_index| self.forced_assignment(clause_index))
    }

    fn first_unassigned(&self) -> Option<Variable> {
        let index = self
            .assignment
            .iter()
            .position(|assigned| assigned.is_none())?;

        Variable::from_index(index)
    }

    fn assign_literal(&mut self, literal: Literal) {
        self.assigned_stack.push(literal);
        self.assignment[literal.index()] = Some(literal.positive());

        for &clause_index in &self.watch[literal] {
            let stat = &mut self.clause_stats[clause_index];

            if stat.satisfied == 0 {
                self.satisfied_clauses += 1;
            }
            stat.satisfied += 1;
        }

        for &clause_index in &self.watch[!literal] {
            let stat = &mut self.clause_stats[clause_index];

            stat.unsatisfied += 1;
            if stat.unsatisfied == self.clauses[clause_index].len() {
                self.unsatisfied_clauses += 1;
            }
        }
    }

    fn pop_assignment(&mut self) {
        let literal = match self.assigned_stack.pop() {
            Some(literal) => literal,
            None => return,
        };
        self.assignment[literal.index()] = None;

        for &clause_index in &self.watch[literal] {
            let stat = &mut self.clause_stats[clause_index];

            if stat.satisfied == 1 {
                self.satisfied_clauses -= 1;
            }
            stat.satisfied -= 1;
        }

        for &clause_index in &self.watch[!literal] {
            let stat = &mut self.clause_stats[clause_index];

            if stat.unsatisfied == self.clauses[clause_index].len() {
                self.unsatisfied_clauses -= 1;
            }
            stat.unsatisfied -= 1;
        }
    }

    /// Explores one literal and undoes it on failure.
    fn try_literal(&mut self, literal: Literal) -> Option<Vec<bool>> {
        self.assign_literal(literal);
        if let Some(assignment) = self.search() {
            return Some(assignment);
        }
        self.pop_assignment();

        None
    }

    fn search(&mut self) -> Option<Vec<bool>> {
        if self.unsatisfied_clauses > 0 {
            // There is a clause that can be never satisfied.
            return None;
        } else if self.satisfied_clauses == self.clauses.len() {
            // All clauses are satisfied, fill remaining variables and return.
            let assignment = self
                .assignment
                .iter()
                .map(|assign| assign.unwrap_or(false))
                .collect::<Vec<_>>();

            return Some(assignment);
        }

        // See if there is a unit assignment.
        if let Some(literal) = self.search_unit_clause() {
            return self.try_literal(literal);
        }

        // Try the first unassigned variable.
        // Some clause is neither satisfied nor falsified, so a variable is still free.
        let variable = self.first_unassigned()?;
        let literal = Literal::new(variable, false);

        self.try_literal(literal)
            .or_else(|| self.try_literal(!literal))
    }
}

impl Solver for DpllSolver {
    fn new() -> Self {
        Default::default()
    }

    fn new_var(&mut self) -> Variable {
        let variable =
            Variable::from_index(self.num_variables).expect("too many variables registered");
        self.num_variables += 1;
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
        self.clauses.push(Clause::new(literals));
    }

    fn solve(mut self) -> Verdict {
        let num_clauses = self.clauses.len();

        self.watch = Watch::new(self.num_variables, &self.clauses);
        self.assignment = vec![None; self.num_variables];
        self.clause_stats = vec![Default::default(); num_clauses];
        self.unsatisfied_clauses = self.clauses.iter().filter(|c| c.is_empty()).count();
        self.assigned_stack = Vec::with_capacity(self.num_variables);

        match self.search() {
            Some(assignment) => Verdict::Sat(assignment),
            None => Verdict::Unsat,
        }
    }
}
