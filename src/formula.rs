/*!
A module to represent conjunctive normal form formula.
*/

use std::{convert::TryInto, fmt::Display, num::NonZeroU32, str::FromStr};

use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum VariableParseError {
    #[snafu(display("Failed to parse Variable ID"))]
    ParseIntError { source: std::num::ParseIntError },
    #[snafu(display(
        "Variable ID {} is out of range (must be within 1 to {})",
        num,
        Variable::MAX_VARIABLE_ID
    ))]
    RangeError { num: usize },
}

#[derive(Debug, Snafu)]
pub enum FormulaError {
    #[snafu(display(
        "Clause #{} references {} but the formula only has {} variables",
        clause_index,
        variable,
        num_variables
    ))]
    VariableOutOfRange {
        clause_index: usize,
        variable: Variable,
        num_variables: usize,
    },
    #[snafu(display(
        "{} variables requested, at most {} are supported",
        num_variables,
        Variable::MAX_VARIABLE_ID
    ))]
    TooManyVariables { num_variables: usize },
}

/// Newtype wrapper for variable ID.
/// Invariant: 0 < ID <= MAX_VARIABLE_ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable(NonZeroU32);

impl Variable {
    pub const MAX_VARIABLE_ID: usize = std::u32::MAX as usize;
}

impl Variable {
    pub fn index(&self) -> usize {
        (self.0.get() - 1) as usize
    }

    /// Creates a variable from a raw index.
    /// Returns `None` if the index is invalid.
    pub fn from_index(index: usize) -> Option<Self> {
        let id = index.checked_add(1)?;
        if id > Variable::MAX_VARIABLE_ID {
            return None;
        }
        Some(Variable(NonZeroU32::new(id.try_into().ok()?)?))
    }
}

impl FromStr for Variable {
    type Err = VariableParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let num = s.parse::<usize>().context(ParseIntError)?;
        ensure!(num != 0, RangeError { num });
        Variable::from_index(num - 1).context(RangeError { num })
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    id: Variable,
    positive: bool,
}

impl Literal {
    pub fn new(id: Variable, positive: bool) -> Self {
        Literal { id, positive }
    }

    /// Creates a literal from a signed DIMACS integer (`3` is `x3`, `-3` is `¬x3`).
    pub fn from_dimacs(value: i64) -> Option<Self> {
        let index = (value.checked_abs()? as usize).checked_sub(1)?;
        Some(Literal::new(Variable::from_index(index)?, value > 0))
    }

    pub fn variable(&self) -> Variable {
        self.id
    }

    /// Index of the underlying variable.
    pub fn index(&self) -> usize {
        self.id.index()
    }

    pub fn positive(&self) -> bool {
        self.positive
    }

    /// Dense code of the literal, `2 * index` for positive and `2 * index + 1` for negative
    /// literals.
    pub fn code(&self) -> usize {
        2 * self.index() + (!self.positive) as usize
    }

    /// Value of the literal under a partial assignment indexed by variable.
    pub fn partial_value(&self, assignments: &[Option<bool>]) -> Option<bool> {
        assignments[self.index()].map(|value| value == self.positive)
    }
}

impl FromStr for Literal {
    type Err = VariableParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (positive, id) = if let Some(stripped) = s.strip_prefix('-') {
            (false, stripped.parse()?)
        } else {
            (true, s.parse()?)
        };

        Ok(Literal { id, positive })
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", if self.positive { "" } else { "¬" }, self.id)
    }
}

impl std::ops::Not for Literal {
    type Output = Literal;

    fn not(self) -> Self::Output {
        Literal {
            id: self.id,
            positive: !self.positive,
        }
    }
}

/// Disjunction of literals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    pub fn new(literals: Vec<Literal>) -> Self {
        Self { literals }
    }

    /// Builds a clause from signed DIMACS integers.
    ///
    /// # Panics
    ///
    /// Panics on `0` or on a value that does not fit a variable ID.
    pub fn from_dimacs(values: &[i64]) -> Self {
        Clause::new(
            values
                .iter()
                .map(|&value| Literal::from_dimacs(value).expect("invalid DIMACS literal"))
                .collect(),
        )
    }

    /// A unit clause fixing `variable` to `value`.
    pub fn unit(variable: Variable, value: bool) -> Self {
        Clause::new(vec![Literal::new(variable, value)])
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    pub fn iter(&self) -> impl Iterator<Item = Literal> + '_ {
        self.literals.iter().copied()
    }

    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.iter().map(|literal| literal.variable())
    }

    /// Returns true if some literal of the clause is satisfied by a total assignment.
    pub fn is_satisfied_by(&self, assignment: &[bool]) -> bool {
        self.iter()
            .any(|literal| assignment[literal.index()] == literal.positive())
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;

        let mut iter = self.literals.iter();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for literal in iter {
            write!(f, " ∨ {}", literal)?;
        }

        write!(f, ")")?;

        Ok(())
    }
}

/// Checks that every literal in `clauses` refers to a variable in `[0, num_variables)`.
pub fn check_range(clauses: &[Clause], num_variables: usize) -> Result<(), FormulaError> {
    ensure!(
        num_variables <= Variable::MAX_VARIABLE_ID,
        TooManyVariables { num_variables }
    );

    for (clause_index, clause) in clauses.iter().enumerate() {
        if let Some(variable) = clause.variables().find(|v| v.index() >= num_variables) {
            return VariableOutOfRange {
                clause_index,
                variable,
                num_variables,
            }
            .fail();
        }
    }

    Ok(())
}

/// Formula representation in Conjunctive Normal Form
#[derive(Debug, Clone)]
pub struct Cnf {
    num_variables: usize,
    clauses: Vec<Clause>,
}

impl Cnf {
    pub fn new(num_variables: usize) -> Self {
        assert!(num_variables <= Variable::MAX_VARIABLE_ID);

        Cnf {
            num_variables,
            clauses: Vec::new(),
        }
    }

    /// Builds a formula, rejecting clauses that mention variables out of range.
    pub fn from_clauses(num_variables: usize, clauses: Vec<Clause>) -> Result<Self, FormulaError> {
        check_range(&clauses, num_variables)?;
        Ok(Cnf {
            num_variables,
            clauses,
        })
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn add_clause(&mut self, clause: Clause) -> Result<(), FormulaError> {
        check_range(std::slice::from_ref(&clause), self.num_variables).map_err(|e| match e {
            FormulaError::VariableOutOfRange {
                variable,
                num_variables,
                ..
            } => FormulaError::VariableOutOfRange {
                clause_index: self.clauses.len(),
                variable,
                num_variables,
            },
            e => e,
        })?;
        self.clauses.push(clause);
        Ok(())
    }

    /// Returns true if `assignment` satisfies every clause.
    pub fn is_satisfied_by(&self, assignment: &[bool]) -> bool {
        assignment.len() == self.num_variables
            && self
                .clauses
                .iter()
                .all(|clause| clause.is_satisfied_by(assignment))
    }
}

impl Display for Cnf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CNF with {} variables (", self.num_variables)?;

        let mut iter = self.clauses.iter();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for clause in iter {
            write!(f, " ∧ {}", clause)?;
        }

        write!(f, ")")?;

        Ok(())
    }
}

/// Represents a satisfying assignment for a formula.
#[derive(Debug)]
pub struct Model {
    formula: Cnf,
    assignment: Vec<bool>,
}

impl Model {
    /// Creates a new model from a formula and an assignment.
    ///
    /// # Panics
    ///
    /// Panics when `assignment` is invalid (e.g., length mismatch, unsatisfying).
    pub fn new(formula: Cnf, assignment: Vec<bool>) -> Self {
        assert!(assignment.len() == formula.num_variables());
        assert!(
            formula.is_satisfied_by(&assignment),
            "assignment does not satisfy the formula"
        );

        Model {
            formula,
            assignment,
        }
    }

    pub fn formula(&self) -> &Cnf {
        &self.formula
    }

    pub fn assignment(&self) -> &[bool] {
        &self.assignment
    }
}

impl Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v")?;
        for (idx, &val) in self.assignment.iter().enumerate() {
            write!(f, " {}{}", if val { "" } else { "-" }, idx + 1)?;
        }
        write!(f, " 0")
    }
}
