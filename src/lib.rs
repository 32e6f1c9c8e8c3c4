#[macro_use]
extern crate log;

pub mod branch;
pub mod config;
pub mod dispatch;
pub mod formula;
pub mod graph;
pub mod parser;
pub mod partition;
pub mod pool;
pub mod prelude;
pub mod report;
pub mod solver;

pub use config::Config;
pub use dispatch::{is_satisfiable, CutsetSolver};

#[cfg(test)]
mod tests;
