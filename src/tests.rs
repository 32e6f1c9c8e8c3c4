use paste::paste;
use rand::{rngs::StdRng, Rng};

use crate::{
    dispatch::CutsetSolver,
    formula::{Clause, Cnf, Literal, Variable},
    parser::parse_file,
    solver::{CdclSolver, DpllSolver, Solver, Verdict},
};

mod branch;
mod parser;
mod partition;
mod pool;
mod report;

/// Runs one way of solving a whole formula.
trait Harness {
    fn run(formula: &Cnf) -> Verdict;
}

impl Harness for DpllSolver {
    fn run(formula: &Cnf) -> Verdict {
        DpllSolver::from_cnf(formula).solve()
    }
}

impl Harness for CdclSolver {
    fn run(formula: &Cnf) -> Verdict {
        CdclSolver::from_cnf(formula).solve()
    }
}

struct Cutset;

impl Harness for Cutset {
    fn run(formula: &Cnf) -> Verdict {
        CutsetSolver::<CdclSolver>::default()
            .solve_cnf(formula)
            .unwrap()
    }
}

macro_rules! sat_testcase_with_solver {
    ($solver:ident, $dir:ident, $name: ident) => {
        paste! {
            #[test]
            fn [< $solver:lower _ $dir _ $name >]() {
                let formula = parse_file(
                    concat!("testcases/", stringify!($dir), "/", stringify!($name), ".cnf")
                ).unwrap();
                let verdict = <$solver as Harness>::run(&formula);
                let model = verdict.model().expect("expected a satisfiable verdict");
                assert!(formula.is_satisfied_by(model));
            }
        }
    };
}

macro_rules! unsat_testcase_with_solver {
    ($solver:ident, $dir:ident, $name:ident) => {
        paste! {
            #[test]
            fn [< $solver:lower _ $dir _ $name >]() {
                let formula = parse_file(
                    concat!("testcases/", stringify!($dir), "/", stringify!($name), ".cnf")
                ).unwrap();
                assert_eq!(<$solver as Harness>::run(&formula), Verdict::Unsat);
            }
        }
    };
}

macro_rules! sat_testcase {
    ($dir:ident, $name:ident) => {
        sat_testcase_with_solver!(DpllSolver, $dir, $name);
        sat_testcase_with_solver!(CdclSolver, $dir, $name);
        sat_testcase_with_solver!(Cutset, $dir, $name);
    };
}

macro_rules! unsat_testcase {
    ($dir:ident, $name:ident) => {
        unsat_testcase_with_solver!(DpllSolver, $dir, $name);
        unsat_testcase_with_solver!(CdclSolver, $dir, $name);
        unsat_testcase_with_solver!(Cutset, $dir, $name);
    };
}

sat_testcase!(basic, empty);
sat_testcase!(basic, two_clauses);
sat_testcase!(basic, chain);
unsat_testcase!(basic, unit_conflict);
unsat_testcase!(basic, ph3);
unsat_testcase!(basic, ph5);

sat_testcase!(structured, bridged_sat);
unsat_testcase!(structured, bridged_unsat);
unsat_testcase!(structured, clique10_unsat);

pub fn clause(literals: &[i64]) -> Clause {
    Clause::from_dimacs(literals)
}

pub fn clauses(literals: &[&[i64]]) -> Vec<Clause> {
    literals.iter().map(|literals| clause(literals)).collect()
}

/// Ground truth by enumerating every assignment.
pub fn brute_force<'a, I>(num_variables: usize, clauses: I) -> bool
where
    I: IntoIterator<Item = &'a Clause> + Clone,
{
    assert!(num_variables <= 20);
    (0..1usize << num_variables).any(|mask| {
        let assignment: Vec<bool> = (0..num_variables).map(|i| (mask >> i) & 1 == 1).collect();
        clauses
            .clone()
            .into_iter()
            .all(|clause| clause.is_satisfied_by(&assignment))
    })
}

pub fn random_literal(rng: &mut StdRng, num_variables: usize) -> Literal {
    let index = rng.gen_range(0..num_variables);
    Literal::new(Variable::from_index(index).unwrap(), rng.gen())
}

/// Uniform random k-CNF.
pub fn random_cnf(rng: &mut StdRng, num_variables: usize, num_clauses: usize, width: usize) -> Vec<Clause> {
    (0..num_clauses)
        .map(|_| Clause::new((0..width).map(|_| random_literal(rng, num_variables)).collect()))
        .collect()
}

/// Two random clusters of variables that only interact through `num_bridges` shared
/// variables. Shared variables are `0..num_bridges`, followed by both clusters.
pub fn clustered_cnf(
    rng: &mut StdRng,
    num_bridges: usize,
    cluster_size: usize,
    clauses_per_cluster: usize,
) -> (usize, Vec<Clause>) {
    let num_variables = num_bridges + 2 * cluster_size;
    let mut clauses = Vec::new();

    for cluster in 0..2 {
        let offset = num_bridges + cluster * cluster_size;
        for _ in 0..clauses_per_cluster {
            let mut literals: Vec<Literal> = (0..2)
                .map(|_| {
                    let index = offset + rng.gen_range(0..cluster_size);
                    Literal::new(Variable::from_index(index).unwrap(), rng.gen())
                })
                .collect();
            if num_bridges > 0 && rng.gen_bool(0.5) {
                let index = rng.gen_range(0..num_bridges);
                literals.push(Literal::new(Variable::from_index(index).unwrap(), rng.gen()));
            }
            clauses.push(Clause::new(literals));
        }
    }

    (num_variables, clauses)
}
