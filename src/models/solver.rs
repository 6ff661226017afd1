use std::fmt::Debug;
use std::time::Duration;

use super::Error;

/// Accumulates the variables and constraints of a mixed-integer program.
///
/// Every variable is binary and contributes its coefficient to a minimization objective.
pub trait ModelBuilder {
    /// Handle to a variable created by this builder
    type Var: Copy + Debug;

    /// Adds a new 0/1 variable with the given objective coefficient
    fn binary_var(&mut self, name: &str, objective: f64) -> Result<Self::Var, Error>;

    /// Adds the constraint `lower <= sum(coefficient * var) <= upper`, both bounds inclusive.
    fn add_constraint(
        &mut self,
        name: &str,
        terms: &[(Self::Var, f64)],
        lower: f64,
        upper: f64,
    ) -> Result<(), Error>;
}

/// A model that can be optimized.
pub trait MipSolver: ModelBuilder {
    type Solution: MipSolution<Var = Self::Var>;

    /// Caps the wall-clock time spent in `solve`
    fn set_time_limit(&mut self, limit: Duration) -> Result<(), Error>;

    /// Runs the optimizer once, returning the best feasible solution found.
    fn solve(self) -> Result<Self::Solution, Error>;
}

/// The values assigned by the optimizer.
pub trait MipSolution {
    type Var;

    /// The value of the objective function
    fn objective(&self) -> Result<f64, Error>;

    /// The solved value of a variable. Integral variables may carry numerical noise.
    fn value(&self, var: Self::Var) -> Result<f64, Error>;
}

/// A linear constraint under construction.
#[derive(Debug, Clone)]
pub struct ConstraintBuilder<V> {
    name: String,
    terms: Vec<(V, f64)>,
}

impl<V: Copy + Debug> ConstraintBuilder<V> {
    pub fn new(name: impl Into<String>) -> Self {
        ConstraintBuilder {
            name: name.into(),
            terms: Vec::new(),
        }
    }

    /// Appends `coefficient * var`. Structurally absent variables (`None`) are skipped.
    pub fn add_term(&mut self, var: Option<V>, coefficient: f64) -> &mut Self {
        if let Some(var) = var {
            self.terms.push((var, coefficient));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Adds `lower <= terms <= upper` to the model.
    pub fn commit<M>(self, model: &mut M, lower: f64, upper: f64) -> Result<(), Error>
    where
        M: ModelBuilder<Var = V>,
    {
        model.add_constraint(&self.name, &self.terms, lower, upper)
    }
}
