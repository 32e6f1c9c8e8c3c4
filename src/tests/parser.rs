use super::clauses;
use crate::{
    formula::{Cnf, Model},
    parser::{parse_file, parse_str, Error},
};

#[test]
fn parse_with_comments() {
    let formula = parse_str(
        "c leading comment
p cnf 3 2
1 -2 0
c in between

2 3 -1 0
",
    )
    .unwrap();

    assert_eq!(formula.num_variables(), 3);
    assert_eq!(formula.clauses(), &clauses(&[&[1, -2], &[2, 3, -1]])[..]);
}

#[test]
fn clauses_may_span_lines() {
    let formula = parse_str("p cnf 4 3\n1 2\n-3 0 4 0\n-1\n-4\n0\n").unwrap();
    assert_eq!(
        formula.clauses(),
        &clauses(&[&[1, 2, -3], &[4], &[-1, -4]])[..]
    );

    let formula = parse_file("testcases/basic/chain.cnf").unwrap();
    assert_eq!(formula.clauses()[4], clauses(&[&[-4, 5]])[0]);
}

#[test]
fn satlib_trailer_ends_input() {
    let formula = parse_str("p cnf 2 1\n1 -2 0\n%\n0\n\n").unwrap();
    assert_eq!(formula.clauses().len(), 1);
}

#[test]
fn empty_clause_is_kept() {
    let formula = parse_str("p cnf 1 2\n0\n1 0\n").unwrap();
    assert!(formula.clauses()[0].is_empty());
}

#[test]
fn missing_problem_line() {
    assert!(matches!(
        parse_str("1 2 0\n"),
        Err(Error::MalformedProblemDefinition)
    ));
    assert!(matches!(
        parse_str("p dnf 2 1\n1 2 0\n"),
        Err(Error::MalformedProblemDefinition)
    ));
    assert!(matches!(
        parse_str("p cnf two 1\n1 2 0\n"),
        Err(Error::MalformedProblemDefinition)
    ));
}

#[test]
fn clause_count_mismatch() {
    match parse_str("p cnf 2 2\n1 2 0\n") {
        Err(Error::ClauseCountMismatch { expected, found }) => {
            assert_eq!((expected, found), (2, 1))
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn variable_out_of_range() {
    match parse_str("p cnf 2 2\n1 2 0\n-1 3 0\n") {
        Err(Error::OutOfRange { line, .. }) => assert_eq!(line, 3),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn malformed_literal() {
    match parse_str("p cnf 2 1\n1 x2 0\n") {
        Err(Error::MalformedVariable { token, line, .. }) => {
            assert_eq!(token, "x2");
            assert_eq!(line, 2);
        }
        other => panic!("unexpected result {:?}", other),
    }
    assert!(matches!(
        parse_str("p cnf 2 1\n1 -0 0\n"),
        Err(Error::MalformedVariable { .. })
    ));
}

#[test]
fn unterminated_clause() {
    assert!(matches!(
        parse_str("p cnf 2 1\n1 2\n"),
        Err(Error::UnterminatedClause)
    ));
}

#[test]
fn missing_file() {
    assert!(matches!(
        parse_file("testcases/does_not_exist.cnf"),
        Err(Error::IoError { .. })
    ));
}

#[test]
fn model_output() {
    let formula = Cnf::from_clauses(3, clauses(&[&[1, -2], &[3]])).unwrap();
    let model = Model::new(formula, vec![true, false, true]);
    assert_eq!(model.to_string(), "v 1 -2 3 0");
}

#[test]
#[should_panic]
fn model_must_satisfy() {
    let formula = Cnf::from_clauses(2, clauses(&[&[1, -2]])).unwrap();
    Model::new(formula, vec![false, true]);
}
