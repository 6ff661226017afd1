pub mod lp_file;
pub mod microlp;
pub mod routing;
pub mod solver;
pub mod utils;

#[cfg(feature = "gurobi")]
pub mod gurobi;

use derive_more::Display;

pub use solver::{ConstraintBuilder, MipSolution, MipSolver, ModelBuilder};

#[derive(Debug, Display, Clone, PartialEq)]
pub enum Error {
    /// No assignment satisfies all constraints
    #[display(fmt = "model is infeasible")]
    Infeasible,
    /// The objective is unbounded
    #[display(fmt = "model is unbounded")]
    Unbounded,
    /// The time limit expired before a feasible solution was found
    #[display(fmt = "no feasible solution found within the time limit")]
    NoSolution,
    /// Error reported by the solver backend
    #[display(fmt = "solver error: {}", _0)]
    Backend(String),
}

impl std::error::Error for Error {}
