use rand::{rngs::StdRng, SeedableRng};

use super::{brute_force, clauses, clustered_cnf};
use crate::{
    formula::{Clause, Variable},
    graph::{cut_mask, InteractionGraph},
    parser::parse_file,
    partition::{mask_assignment, PartitionError, Partitioner, Side},
    solver::{DpllSolver, Solver},
};

fn var(index: usize) -> Variable {
    Variable::from_index(index).unwrap()
}

/// Solves one side over the whole variable range.
fn solve_side<'a>(num_variables: usize, clauses: impl Iterator<Item = &'a Clause>) -> Option<Vec<bool>> {
    let mut solver = DpllSolver::new();
    for _ in 0..num_variables {
        solver.new_var();
    }
    for clause in clauses {
        solver.add_clause(clause);
    }
    solver.solve().model().map(<[bool]>::to_vec)
}

#[test]
fn mask_bits_map_to_cutset_positions() {
    assert_eq!(mask_assignment(0b101, 3), vec![true, false, true]);
    assert_eq!(mask_assignment(0b10, 2), vec![false, true]);
    assert_eq!(mask_assignment(0, 0), Vec::<bool>::new());
}

#[test]
fn sides_of_bridged_clusters() {
    let formula = parse_file("testcases/structured/bridged_unsat.cnf").unwrap();
    let graph = InteractionGraph::from_clauses(formula.num_variables(), formula.clauses());
    let partitioner = Partitioner::new(&graph, formula.clauses(), &[0, 1, 2]).unwrap();

    assert_eq!(partitioner.cutset(), &[var(0), var(1), var(2)]);
    assert_eq!(partitioner.side(var(1)), Side::Cut);
    for index in 3..9 {
        assert_eq!(partitioner.side(var(index)), Side::Left);
    }
    for index in 9..15 {
        assert_eq!(partitioner.side(var(index)), Side::Right);
    }

    let (left, right) = partitioner.partition(&[true, false, true]).unwrap();
    assert_eq!(
        left.variables(),
        &[var(3), var(4), var(5), var(6), var(7), var(8), var(0), var(1), var(2)]
    );
    assert_eq!(right.variables().len(), 9);

    // 3 units, 18 bridge clauses and the chain of each side
    assert_eq!(left.num_clauses(), 3 + 18 + 5);
    assert_eq!(right.num_clauses(), 3 + 18 + 9);
    assert_eq!(
        left.clauses().take(3).cloned().collect::<Vec<_>>(),
        clauses(&[&[1], &[-2], &[3]])
    );
}

#[test]
fn clause_over_cutset_only_goes_to_both_sides() {
    let formula = clauses(&[&[1, 2], &[2, 3], &[-2]]);
    let graph = InteractionGraph::from_clauses(3, &formula);
    let partitioner = Partitioner::new(&graph, &formula, &[1]).unwrap();

    let (left, right) = partitioner.partition(&[false]).unwrap();
    assert!(left.clauses().any(|clause| *clause == formula[2]));
    assert!(right.clauses().any(|clause| *clause == formula[2]));
    assert!(left.clauses().all(|clause| *clause != formula[1]));
    assert!(right.clauses().all(|clause| *clause != formula[0]));
}

#[test]
fn everything_cut_leaves_no_free_variables() {
    let formula = clauses(&[&[1, 2], &[-1, -2]]);
    let graph = InteractionGraph::from_clauses(2, &formula);
    let partitioner = Partitioner::new(&graph, &formula, &[0, 1]).unwrap();

    let (left, right) = partitioner.partition(&[true, false]).unwrap();
    assert_eq!(left.num_clauses(), 4);
    assert_eq!(right.num_clauses(), 4);
    assert_eq!(partitioner.merge_models(&[true, false], &[false, true]), vec![true, false]);
}

#[test]
fn straddling_clause_is_rejected() {
    // the graph does not know about the clause joining the two vertices
    let graph = InteractionGraph::new(2);
    let formula = clauses(&[&[1, 2]]);

    match Partitioner::new(&graph, &formula, &[]) {
        Err(PartitionError::StraddlingClause { clause_index, .. }) => assert_eq!(clause_index, 0),
        other => panic!("expected a straddling clause, got {:?}", other),
    }
}

#[test]
fn assignment_must_cover_cutset() {
    let formula = clauses(&[&[1, 2], &[2, 3]]);
    let graph = InteractionGraph::from_clauses(3, &formula);
    let partitioner = Partitioner::new(&graph, &formula, &[1]).unwrap();

    match partitioner.partition(&[true, false]) {
        Err(PartitionError::AssignmentMismatch { expected, found }) => {
            assert_eq!((expected, found), (1, 2))
        }
        other => panic!("expected an assignment mismatch, got {:?}", other),
    }
}

#[test]
fn partition_preserves_satisfiability() {
    let mut rng = StdRng::seed_from_u64(0x7061_7274);

    for _ in 0..40 {
        let (n, formula) = clustered_cnf(&mut rng, 2, 4, 7);
        let graph = InteractionGraph::from_clauses(n, &formula);
        let cutset = graph.find_cutset(7);
        if graph.is_connected(&cut_mask(n, &cutset)) {
            continue;
        }

        let partitioner = Partitioner::new(&graph, &formula, &cutset).unwrap();
        let mut any_mask = false;

        for mask in 0..1usize << cutset.len() {
            let (left, right) = partitioner.partition(&mask_assignment(mask, cutset.len())).unwrap();
            let restricted: Vec<Clause> = left.clauses().take(cutset.len()).cloned().collect();
            let whole = brute_force(n, formula.iter().chain(&restricted));

            let sides = (solve_side(n, left.clauses()), solve_side(n, right.clauses()));
            assert_eq!(sides.0.is_some() && sides.1.is_some(), whole);

            if let (Some(left_model), Some(right_model)) = sides {
                let merged = partitioner.merge_models(&left_model, &right_model);
                assert!(formula.iter().all(|clause| clause.is_satisfied_by(&merged)));
                assert!(restricted.iter().all(|clause| clause.is_satisfied_by(&merged)));
                any_mask = true;
            }
        }

        assert_eq!(any_mask, brute_force(n, &formula));
    }
}
