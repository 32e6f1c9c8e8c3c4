use std::mem::take;

use crate::formula::{Literal, Variable};

/// Read access to the assignment trail during conflict analysis.
pub trait ConflictDataProvider {
    /// Decision level at which `variable` was assigned.
    fn level(&self, variable: Variable) -> usize;

    /// Clause that propagated `variable`.
    /// `None` for decisions and for units fixed before search.
    fn reason(&self, variable: Variable) -> Option<&[Literal]>;
}

/// Clause derived from a conflict.
#[derive(Debug)]
pub struct Learnt {
    /// Asserting literal first, then a literal of the backjump level.
    pub literals: Vec<Literal>,
    /// Deepest level among the non-asserting literals, `0` for a unit.
    pub backjump: usize,
    /// Number of distinct decision levels among `literals`.
    pub lbd: usize,
}

/// First-UIP conflict analysis with local clause minimization.
#[derive(Default)]
pub struct ConflictAnalyzer {
    seen: Vec<bool>,
    /// Variables whose `seen` flag must be cleared after the analysis.
    touched: Vec<Variable>,
    /// Collected literals assigned below the conflict level.
    lower: Vec<Literal>,
    /// Seen variables of the conflict level that are not resolved yet.
    pending: usize,
}

impl ConflictAnalyzer {
    pub fn new(num_variables: usize) -> Self {
        ConflictAnalyzer {
            seen: vec![false; num_variables],
            ..Default::default()
        }
    }

    fn mark(&mut self, variable: Variable) -> bool {
        let seen = &mut self.seen[variable.index()];
        if *seen {
            false
        } else {
            *seen = true;
            self.touched.push(variable);
            true
        }
    }

    fn absorb<'a, P, I>(&mut self, provider: &P, level: usize, literals: I)
    where
        P: ConflictDataProvider,
        I: IntoIterator<Item = &'a Literal>,
    {
        for &literal in literals {
            let variable = literal.variable();
            if !self.mark(variable) {
                continue;
            }

            match provider.level(variable) {
                0 => {}
                assigned if assigned == level => self.pending += 1,
                _ => self.lower.push(literal),
            }
        }
    }

    /// A collected literal is redundant when its reason only adds literals that are already
    /// in the clause or fixed at level 0.
    fn redundant<P>(&self, provider: &P, variable: Variable) -> bool
    where
        P: ConflictDataProvider,
    {
        match provider.reason(variable) {
            Some(reason) => reason.iter().all(|literal| {
                self.seen[literal.index()] || provider.level(literal.variable()) == 0
            }),
            None => false,
        }
    }

    /// Resolves `conflict` against the reasons on `trail` (newest last) until a single
    /// literal of `level` remains.
    pub fn analyze<P>(
        &mut self,
        provider: &P,
        level: usize,
        conflict: &[Literal],
        trail: &[Literal],
    ) -> Learnt
    where
        P: ConflictDataProvider,
    {
        self.absorb(provider, level, conflict);

        let mut asserting = None;
        for &literal in trail.iter().rev() {
            let variable = literal.variable();
            if !self.seen[variable.index()] {
                continue;
            }

            self.pending -= 1;
            if self.pending == 0 {
                asserting = Some(!literal);
                break;
            }

            // resolved away, so it must not count as part of the clause
            self.seen[variable.index()] = false;
            if let Some(reason) = provider.reason(variable) {
                // the reason also holds the resolved literal itself
                let others = reason.iter().filter(|other| other.variable() != variable);
                self.absorb(provider, level, others);
            }
        }

        let asserting = match asserting {
            Some(literal) => literal,
            // the decision of the conflict level is always a UIP
            None => unreachable!(),
        };

        let mut lower = take(&mut self.lower);
        lower.retain(|literal| !self.redundant(provider, literal.variable()));

        for variable in self.touched.drain(..) {
            self.seen[variable.index()] = false;
        }
        self.pending = 0;

        let mut literals = Vec::with_capacity(lower.len() + 1);
        literals.push(asserting);
        literals.extend(lower);

        let deepest =
            (1..literals.len()).max_by_key(|&position| provider.level(literals[position].variable()));
        let backjump = match deepest {
            Some(position) => {
                literals.swap(1, position);
                provider.level(literals[1].variable())
            }
            None => 0,
        };

        let mut levels: Vec<usize> = literals
            .iter()
            .map(|literal| provider.level(literal.variable()))
            .collect();
        levels.sort_unstable();
        levels.dedup();

        Learnt {
            literals,
            backjump,
            lbd: levels.len(),
        }
    }
}
