use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use log::{info, warn};
use microlp::{ComparisonOp, OptimizationDirection, Problem, Variable};

use super::{Error, MipSolution, MipSolver, ModelBuilder};

/// Pure Rust branch-and-bound backend.
pub struct MicrolpSolver {
    problem: Problem,
    variables: usize,
    time_limit: Option<Duration>,
    /// First constraint without terms whose bounds exclude zero
    violated: Option<String>,
}

impl MicrolpSolver {
    pub fn new() -> MicrolpSolver {
        MicrolpSolver {
            problem: Problem::new(OptimizationDirection::Minimize),
            variables: 0,
            time_limit: None,
            violated: None,
        }
    }
}

impl Default for MicrolpSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelBuilder for MicrolpSolver {
    type Var = Variable;

    fn binary_var(&mut self, _name: &str, objective: f64) -> Result<Variable, Error> {
        self.variables += 1;
        Ok(self.problem.add_binary_var(objective))
    }

    fn add_constraint(
        &mut self,
        name: &str,
        terms: &[(Variable, f64)],
        lower: f64,
        upper: f64,
    ) -> Result<(), Error> {
        // an empty row is constant zero
        if terms.is_empty() {
            if (lower > 0.0 || upper < 0.0) && self.violated.is_none() {
                self.violated = Some(name.to_string());
            }
            return Ok(());
        }

        if lower == upper {
            self.problem
                .add_constraint(terms.iter().copied(), ComparisonOp::Eq, lower);
        } else {
            self.problem
                .add_constraint(terms.iter().copied(), ComparisonOp::Ge, lower);
            self.problem
                .add_constraint(terms.iter().copied(), ComparisonOp::Le, upper);
        }

        Ok(())
    }
}

impl MipSolver for MicrolpSolver {
    type Solution = MicrolpSolution;

    fn set_time_limit(&mut self, limit: Duration) -> Result<(), Error> {
        self.time_limit = Some(limit);
        Ok(())
    }

    fn solve(self) -> Result<MicrolpSolution, Error> {
        if let Some(name) = self.violated {
            info!("Constraint {name} has no terms and excludes zero");
            return Err(Error::Infeasible);
        }

        if self.variables == 0 {
            return Ok(MicrolpSolution { solution: None });
        }

        // microlp cannot be interrupted, so the search runs on a worker that is abandoned
        // once the limit expires
        let problem = self.problem;
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(problem.solve());
        });

        let stopped = || Error::Backend("microlp worker stopped without a result".to_string());
        let result = match self.time_limit {
            Some(limit) => rx.recv_timeout(limit).map_err(|err| match err {
                RecvTimeoutError::Timeout => {
                    warn!("Time limit of {:?} reached without a solution", limit);
                    Error::NoSolution
                }
                RecvTimeoutError::Disconnected => stopped(),
            })?,
            None => rx.recv().map_err(|_| stopped())?,
        };

        let solution = result.map_err(|err| match err {
            microlp::Error::Infeasible => Error::Infeasible,
            microlp::Error::Unbounded => Error::Unbounded,
            other => Error::Backend(other.to_string()),
        })?;

        Ok(MicrolpSolution {
            solution: Some(solution),
        })
    }
}

pub struct MicrolpSolution {
    /// `None` when the model has no variables
    solution: Option<microlp::Solution>,
}

impl MipSolution for MicrolpSolution {
    type Var = Variable;

    fn objective(&self) -> Result<f64, Error> {
        Ok(self.solution.as_ref().map_or(0.0, |s| s.objective()))
    }

    fn value(&self, var: Variable) -> Result<f64, Error> {
        match &self.solution {
            Some(solution) => Ok(solution[var]),
            None => Err(Error::Backend(format!("{var:?} is not part of the model"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::routing::RoutingSolver;
    use crate::problem::{Point, Problem as RoutingProblem};

    #[test]
    fn solves_small_binary_program() {
        let mut model = MicrolpSolver::new();
        let x = model.binary_var("x", 1.0).unwrap();
        let y = model.binary_var("y", 3.0).unwrap();
        model.add_constraint("pick", &[(x, 1.0), (y, 1.0)], 1.0, 1.0).unwrap();

        let solution = model.solve().unwrap();
        assert!(solution.value(x).unwrap() > 0.5);
        assert!(solution.value(y).unwrap() < 0.5);
        assert!((solution.objective().unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn ranged_rows_bind_both_ways() {
        let mut model = MicrolpSolver::new();
        let vars: Vec<_> = (0..3).map(|i| model.binary_var(&i.to_string(), -1.0).unwrap()).collect();
        let terms: Vec<_> = vars.iter().map(|v| (*v, 1.0)).collect();
        model.add_constraint("range", &terms, 1.0, 2.0).unwrap();

        let solution = model.solve().unwrap();
        let chosen = vars.iter().filter(|v| solution.value(**v).unwrap() > 0.5).count();
        assert_eq!(chosen, 2);
    }

    #[test]
    fn empty_rows_excluding_zero_are_infeasible() {
        let mut model = MicrolpSolver::new();
        model.binary_var("x", 1.0).unwrap();
        model.add_constraint("empty", &[], 1.0, 2.0).unwrap();
        assert!(matches!(model.solve(), Err(Error::Infeasible)));
    }

    #[test]
    fn empty_models_solve_trivially() {
        let mut model = MicrolpSolver::new();
        model.add_constraint("empty", &[], 0.0, 0.0).unwrap();
        let solution = model.solve().unwrap();
        assert_eq!(solution.objective().unwrap(), 0.0);
    }

    #[test]
    fn expired_time_limit_yields_no_solution() {
        let problem = RoutingProblem::new(
            (0..5).map(|a| Point::new(a as f64 * 7.0, 3.0)).collect(),
            (0..30)
                .map(|v| {
                    let location = Point::new((v * 13 % 29) as f64, (v * 7 % 17) as f64);
                    (v as u32 % 3, location, 10 + (v * 31 % 50) as u64)
                })
                .collect(),
        )
        .unwrap();
        let config = Config {
            time_limit: 0,
            ..Config::default()
        };

        let result = RoutingSolver::solve(&problem, &config, MicrolpSolver::new());
        assert!(matches!(result, Err(Error::NoSolution)));
    }

    #[test]
    fn generous_time_limit_returns_the_optimum() {
        let mut model = MicrolpSolver::new();
        let x = model.binary_var("x", 2.0).unwrap();
        let y = model.binary_var("y", 1.0).unwrap();
        model.add_constraint("pick", &[(x, 1.0), (y, 1.0)], 1.0, 2.0).unwrap();
        model.set_time_limit(Duration::from_secs(60)).unwrap();

        let solution = model.solve().unwrap();
        assert!(solution.value(y).unwrap() > 0.5);
        assert!((solution.objective().unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn infeasible_rows_are_reported() {
        let mut model = MicrolpSolver::new();
        let x = model.binary_var("x", 1.0).unwrap();
        model.add_constraint("too_much", &[(x, 10.0)], 19.0, 20.0).unwrap();
        assert!(matches!(model.solve(), Err(Error::Infeasible)));
    }
}
