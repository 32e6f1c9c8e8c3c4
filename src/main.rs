use std::{
    env::args,
    fs,
    path::{Path, PathBuf},
    process,
};

use cutsat::{
    formula::{Cnf, Model},
    parser::{self, parse_file},
    prelude::*,
    report::Report,
    solver::{CdclSolver, DpllSolver, Solver, Verdict},
    Config, CutsetSolver,
};
use log::info;
use pretty_env_logger::formatted_builder;

fn usage_string() -> String {
    format!(
        "Usage: {} <solver_name> <command> [options]

solver_name: dpll, cdcl, cutset, cutset-dpll

command:
    check <file_name> [result_file] - solve the given DIMACS file

options (cutset solvers):
    --max-cutset <n>  - largest cutset to enumerate (default 7)
    --threads <n>     - worker threads, 0 for one per core (default 0)
    --conflicts <n>   - conflict budget per solver instance",
        args().next().unwrap_or_else(|| "cutsat".to_owned())
    )
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Unknown solver '{}'\n\n{}", name, usage_string()))]
    UnknownSolver { name: String },
    #[snafu(display("Unknown command '{}'\n\n{}", name, usage_string()))]
    UnknownCommand { name: String },
    #[snafu(display("Unknown option '{}'\n\n{}", name, usage_string()))]
    UnknownOption { name: String },
    #[snafu(display("Option '{}' expects a number", name))]
    InvalidOptionValue { name: String },
    #[snafu(display("Failed to parse CNF"))]
    ParserError { source: parser::Error },
    #[snafu(display("Failed to solve CNF"))]
    SolverError { source: cutsat::dispatch::Error },
    #[snafu(display("Failed to write result file '{}'", path.display()))]
    ResultFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Required argument does not exist\n\n{}", usage_string()))]
    MissingArgument,
}

enum Engine {
    Plain(fn(&Cnf) -> Verdict),
    Cutset(fn(&Cnf, Config) -> Result<Verdict, cutsat::dispatch::Error>),
}

fn solve_plain<T: Solver>(formula: &Cnf) -> Verdict {
    T::from_cnf(formula).solve()
}

fn solve_cutset<T: Solver>(
    formula: &Cnf,
    config: Config,
) -> Result<Verdict, cutsat::dispatch::Error> {
    let solver = CutsetSolver::<T>::new(config);
    let verdict = solver.solve_cnf(formula)?;
    info!("{} clauses shared between solvers", solver.clause_pool().len());
    Ok(verdict)
}

/// Parses `--name value` pairs into the dispatcher configuration.
fn parse_options(options: &[String]) -> Result<Config, Error> {
    let mut config = Config::default();
    let mut iter = options.iter();

    while let Some(name) = iter.next() {
        let value = iter
            .next()
            .and_then(|value| value.parse::<u64>().ok())
            .context(InvalidOptionValue { name: name.clone() })?;

        match name.as_str() {
            "--max-cutset" => config.max_cutset_size = value as usize,
            "--threads" => config.num_threads = value as usize,
            "--conflicts" => config.conflict_limit = Some(value),
            _ => UnknownOption { name: name.clone() }.fail()?,
        }
    }

    Ok(config)
}

fn write_result(path: &Path, verdict: &Verdict) -> Result<(), Error> {
    let text = match verdict {
        Verdict::Sat(_) => "SAT\n",
        Verdict::Unsat => "UNSAT\n",
        Verdict::Exhausted => "INDET\n",
    };
    fs::write(path, text).context(ResultFile {
        path: path.to_owned(),
    })
}

/// Runs the command and returns the process exit code.
fn dispatch_command(engine: Engine, args: Vec<String>) -> Result<i32, Error> {
    match args.get(0).map(|s| s.as_str()) {
        Some("check") => {
            let path = args.get(1).context(MissingArgument)?;
            let (result_path, options) = match args.get(2) {
                Some(arg) if !arg.starts_with("--") => (Some(PathBuf::from(arg)), &args[3..]),
                _ => (None, &args[2.min(args.len())..]),
            };
            let config = parse_options(options)?;

            let formula = parse_file(path).context(ParserError)?;
            info!(
                "Parsed {} variables, {} clauses",
                formula.num_variables(),
                formula.clauses().len()
            );

            let verdict = match engine {
                Engine::Plain(solve) => solve(&formula),
                Engine::Cutset(solve) => solve(&formula, config).context(SolverError)?,
            };

            if let Some(result_path) = result_path {
                write_result(&result_path, &verdict)?;
            }

            match verdict {
                Verdict::Sat(assignment) => {
                    println!("SAT\n{}", Model::new(formula, assignment));
                    Ok(10)
                }
                Verdict::Unsat => {
                    println!("UNSAT");
                    Ok(20)
                }
                Verdict::Exhausted => {
                    println!("INDETERMINATE");
                    Ok(0)
                }
            }
        }
        Some(name) => UnknownCommand {
            name: name.to_owned(),
        }
        .fail(),
        None => MissingArgument.fail(),
    }
}

fn init_logger() {
    let mut builder = formatted_builder();

    if let Ok(s) = ::std::env::var("RUST_LOG") {
        builder.parse_filters(&s);
    } else if cfg!(debug_assertions) {
        builder.parse_filters("cutsat=debug");
    } else {
        builder.parse_filters("cutsat=warn");
    }

    builder.try_init().expect("Failed to initialize the logger");
}

fn main() -> Result<(), Report> {
    init_logger();

    let mut args = args();

    // drop arg[0]
    args.next();

    // solver name
    let solver_name = args.next();
    let remaining: Vec<_> = args.collect();

    let engine = match solver_name.as_deref() {
        Some("dpll") => Engine::Plain(solve_plain::<DpllSolver>),
        Some("cdcl") => Engine::Plain(solve_plain::<CdclSolver>),
        Some("cutset") => Engine::Cutset(solve_cutset::<CdclSolver>),
        Some("cutset-dpll") => Engine::Cutset(solve_cutset::<DpllSolver>),
        Some(name) => UnknownSolver {
            name: name.to_owned(),
        }
        .fail()?,
        None => {
            println!("{}", usage_string());
            return Ok(());
        }
    };

    let code = dispatch_command(engine, remaining)?;
    process::exit(code);
}
