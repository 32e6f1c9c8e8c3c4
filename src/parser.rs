use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::formula::{Clause, Cnf, FormulaError, Literal, VariableParseError};
use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("I/O error occurred while parsing CNF file '{}'", path.display()))]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Invalid literal '{}' on line {}", token, line))]
    MalformedVariable {
        token: String,
        line: usize,
        source: VariableParseError,
    },
    #[snafu(display("Problem line 'p cnf <num_variables> <num_clauses>' is not found"))]
    MalformedProblemDefinition,
    #[snafu(display("The last clause is not terminated by 0"))]
    UnterminatedClause,
    #[snafu(display("Clause on line {} is out of range", line))]
    OutOfRange { line: usize, source: FormulaError },
    #[snafu(display(
        "The number of clauses ({}) does not match the clauses number in the problem definition ({})",
        found,
        expected,
    ))]
    ClauseCountMismatch { expected: usize, found: usize },
}

/// Parses the `p cnf <num_variables> <num_clauses>` line.
fn parse_problem_line(line: &str) -> Result<(usize, usize), Error> {
    let splitted = line.split_whitespace().collect::<Vec<_>>();

    // We only support CNF DIMACS format
    ensure!(
        splitted.len() == 4 && splitted[0] == "p" && splitted[1] == "cnf",
        MalformedProblemDefinition
    );

    match (splitted[2].parse::<usize>(), splitted[3].parse::<usize>()) {
        (Ok(num_variables), Ok(num_clauses)) => Ok((num_variables, num_clauses)),
        _ => MalformedProblemDefinition.fail(),
    }
}

/// Parses DIMACS CNF from lines of text. Clauses may span several lines and are
/// terminated by `0`.
fn parse_lines<I>(lines: I) -> Result<Cnf, Error>
where
    I: IntoIterator<Item = (usize, String)>,
{
    // skip until we find the problem definition
    let mut lines = lines
        .into_iter()
        .skip_while(|(_, line)| !line.trim_start().starts_with('p'));

    let (_, prob_line) = lines
        .next()
        .ok_or_else(|| MalformedProblemDefinition.build())?;
    let (num_variables, num_clauses) = parse_problem_line(&prob_line)?;
    ensure!(
        num_variables <= crate::formula::Variable::MAX_VARIABLE_ID,
        MalformedProblemDefinition
    );

    let mut cnf = Cnf::new(num_variables);
    let mut literals = Vec::new();

    for (line_number, line) in lines {
        let trimmed = line.trim();
        if trimmed.starts_with('%') {
            // SATLIB trailer
            break;
        }
        if trimmed.is_empty() || trimmed.starts_with('c') {
            continue;
        }

        for token in trimmed.split_whitespace() {
            if token == "0" {
                let clause = Clause::new(std::mem::take(&mut literals));
                cnf.add_clause(clause)
                    .context(OutOfRange { line: line_number })?;
            } else {
                literals.push(token.parse::<Literal>().with_context(|| MalformedVariable {
                    token: token.to_owned(),
                    line: line_number,
                })?);
            }
        }
    }

    ensure!(literals.is_empty(), UnterminatedClause);
    ensure!(
        cnf.clauses().len() == num_clauses,
        ClauseCountMismatch {
            found: cnf.clauses().len(),
            expected: num_clauses,
        }
    );

    Ok(cnf)
}

/// Parses CNF formula from a string
pub fn parse_str(text: &str) -> Result<Cnf, Error> {
    parse_lines(
        text.lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line.to_owned())),
    )
}

/// Parses CNF formula from a file
pub fn parse_file(path: impl AsRef<Path>) -> Result<Cnf, Error> {
    let path = path.as_ref();
    let file = BufReader::new(File::open(path).context(IoError {
        path: path.to_owned(),
    })?);

    let lines = file
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .context(IoError {
            path: path.to_owned(),
        })?;

    parse_lines(
        lines
            .into_iter()
            .enumerate()
            .map(|(index, line)| (index + 1, line)),
    )
}
