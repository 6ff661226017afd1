pub mod config;
pub mod models;
pub mod parse;
pub mod problem;
pub mod routes;
pub mod utils;

pub use config::Config;

use models::routing::RoutingSolver;
use models::{Error, MipSolver};
use problem::Problem;
use routes::Routes;

/// Builds the routing model for `problem`, solves it once with `solver` and decodes the
/// routes of every agent.
pub fn plan<M: MipSolver>(problem: &Problem, config: &Config, solver: M) -> Result<Routes, Error> {
    let result = RoutingSolver::solve(problem, config, solver)?;
    Ok(routes::decode(problem, &result, config.threshold))
}
