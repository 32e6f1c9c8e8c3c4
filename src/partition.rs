/*!
Splits a formula into two independent sub-problems once the cutset variables are fixed.

After removing the cutset from the interaction graph, the non-cut vertices reachable from
the lowest non-cut vertex form the left side and every other non-cut vertex forms the
right side. No edge joins the two sides, so every clause has its non-cut variables on a
single side.
*/

use crate::formula::{Clause, Literal, Variable};
use crate::graph::{cut_mask, InteractionGraph};
use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum PartitionError {
    #[snafu(display("Clause #{} {} has variables on both sides of the cutset", clause_index, clause))]
    StraddlingClause { clause_index: usize, clause: Clause },
    #[snafu(display("Cutset vertex {} has no matching variable", vertex))]
    InvalidVertex { vertex: usize },
    #[snafu(display(
        "Assignment has {} values for a cutset of size {}",
        found,
        expected
    ))]
    AssignmentMismatch { expected: usize, found: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Cut,
    Left,
    Right,
}

/// One sub-problem: the variables it owns (cutset included) and the clauses it must satisfy.
#[derive(Debug, Clone)]
pub struct Partition<'a> {
    variables: Vec<Variable>,
    units: Vec<Clause>,
    clauses: Vec<&'a Clause>,
}

impl<'a> Partition<'a> {
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Unit clauses fixing the cutset, followed by the routed original clauses.
    pub fn clauses(&self) -> impl Iterator<Item = &Clause> + '_ {
        self.units.iter().chain(self.clauses.iter().copied())
    }

    pub fn num_clauses(&self) -> usize {
        self.units.len() + self.clauses.len()
    }
}

/// Side assignment and clause routing for a fixed cutset. Only the unit clauses depend on
/// the cutset assignment, so this is computed once per cutset and shared by all masks.
#[derive(Debug)]
pub struct Partitioner<'a> {
    cutset: Vec<Variable>,
    sides: Vec<Side>,
    left_variables: Vec<Variable>,
    right_variables: Vec<Variable>,
    left_clauses: Vec<&'a Clause>,
    right_clauses: Vec<&'a Clause>,
}

impl<'a> Partitioner<'a> {
    pub fn new(
        graph: &InteractionGraph,
        clauses: &'a [Clause],
        cutset: &[usize],
    ) -> Result<Self, PartitionError> {
        let num_vertices = graph.num_vertices();
        let is_cut = cut_mask(num_vertices, cutset);

        let cutset = cutset
            .iter()
            .map(|&vertex| Variable::from_index(vertex).context(InvalidVertex { vertex }))
            .collect::<Result<Vec<_>, _>>()?;

        let mut sides = vec![Side::Right; num_vertices];
        for variable in &cutset {
            sides[variable.index()] = Side::Cut;
        }
        if let Some(seed) = (0..num_vertices).find(|&vertex| !is_cut[vertex]) {
            let reached = graph.reachable_from(seed, &is_cut);
            for (vertex, side) in sides.iter_mut().enumerate() {
                if reached[vertex] {
                    *side = Side::Left;
                }
            }
        }

        let mut left_variables = Vec::new();
        let mut right_variables = Vec::new();
        for (vertex, side) in sides.iter().enumerate() {
            let variable = Variable::from_index(vertex).context(InvalidVertex { vertex })?;
            match side {
                Side::Left => left_variables.push(variable),
                Side::Right => right_variables.push(variable),
                Side::Cut => {}
            }
        }
        left_variables.extend_from_slice(&cutset);
        right_variables.extend_from_slice(&cutset);

        let mut left_clauses = Vec::new();
        let mut right_clauses = Vec::new();
        for (clause_index, clause) in clauses.iter().enumerate() {
            let mut in_left = true;
            let mut in_right = true;
            for variable in clause.variables() {
                match sides[variable.index()] {
                    Side::Cut => {}
                    Side::Left => in_right = false,
                    Side::Right => in_left = false,
                }
            }

            ensure!(
                in_left || in_right,
                StraddlingClause {
                    clause_index,
                    clause: clause.clone(),
                }
            );

            if in_left {
                left_clauses.push(clause);
            }
            if in_right {
                right_clauses.push(clause);
            }
        }

        trace!(
            "Partition: {} left / {} right variables, {} left / {} right clauses",
            left_variables.len() - cutset.len(),
            right_variables.len() - cutset.len(),
            left_clauses.len(),
            right_clauses.len()
        );

        Ok(Partitioner {
            cutset,
            sides,
            left_variables,
            right_variables,
            left_clauses,
            right_clauses,
        })
    }

    pub fn cutset(&self) -> &[Variable] {
        &self.cutset
    }

    pub fn side(&self, variable: Variable) -> Side {
        self.sides[variable.index()]
    }

    /// Builds the left and right sub-problems for one cutset assignment. Both sides start
    /// with one unit clause per cutset variable.
    pub fn partition(
        &self,
        assignment: &[bool],
    ) -> Result<(Partition<'a>, Partition<'a>), PartitionError> {
        ensure!(
            assignment.len() == self.cutset.len(),
            AssignmentMismatch {
                expected: self.cutset.len(),
                found: assignment.len(),
            }
        );

        let units: Vec<Clause> = self
            .cutset
            .iter()
            .zip(assignment)
            .map(|(&variable, &value)| Clause::new(vec![Literal::new(variable, value)]))
            .collect();

        let left = Partition {
            variables: self.left_variables.clone(),
            units: units.clone(),
            clauses: self.left_clauses.clone(),
        };
        let right = Partition {
            variables: self.right_variables.clone(),
            units,
            clauses: self.right_clauses.clone(),
        };

        Ok((left, right))
    }

    /// Combines the models of both sides: left variables and the cutset from `left`,
    /// right variables from `right`.
    pub fn merge_models(&self, left: &[bool], right: &[bool]) -> Vec<bool> {
        self.sides
            .iter()
            .enumerate()
            .map(|(index, side)| match side {
                Side::Right => right[index],
                Side::Left | Side::Cut => left[index],
            })
            .collect()
    }
}

/// Decodes bit `i` of `mask` as the value of the `i`-th cutset variable.
pub fn mask_assignment(mask: usize, cutset_size: usize) -> Vec<bool> {
    (0..cutset_size).map(|i| (mask >> i) & 1 == 1).collect()
}
