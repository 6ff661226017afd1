use std::time::Duration;

use grb::prelude::*;
use grb::{attr, param, Status};
use log::{info, warn};

use super::{Error, MipSolution, MipSolver, ModelBuilder};

impl From<grb::Error> for Error {
    fn from(err: grb::Error) -> Self {
        Error::Backend(err.to_string())
    }
}

/// Gurobi backend. Requires a Gurobi installation and licence at build and run time.
pub struct GurobiSolver {
    model: Model,
}

impl GurobiSolver {
    pub fn new(name: &str) -> Result<GurobiSolver, Error> {
        let mut model = Model::new(name)?;
        model.set_param(param::OutputFlag, 0)?;
        Ok(GurobiSolver { model })
    }
}

impl ModelBuilder for GurobiSolver {
    type Var = Var;

    fn binary_var(&mut self, name: &str, objective: f64) -> Result<Var, Error> {
        Ok(self.model.add_var(
            name,
            VarType::Binary,
            objective,
            0.0,
            1.0,
            std::iter::empty(),
        )?)
    }

    fn add_constraint(
        &mut self,
        name: &str,
        terms: &[(Var, f64)],
        lower: f64,
        upper: f64,
    ) -> Result<(), Error> {
        let lhs = terms.iter().map(|(var, coeff)| *coeff * *var).grb_sum();

        if lower == upper {
            self.model.add_constr(name, c!(lhs == lower))?;
        } else {
            self.model
                .add_constr(&format!("{name}_lo"), c!(lhs.clone() >= lower))?;
            self.model.add_constr(&format!("{name}_hi"), c!(lhs <= upper))?;
        }

        Ok(())
    }
}

impl MipSolver for GurobiSolver {
    type Solution = GurobiSolution;

    fn set_time_limit(&mut self, limit: Duration) -> Result<(), Error> {
        self.model.set_param(param::TimeLimit, limit.as_secs_f64())?;
        Ok(())
    }

    fn solve(mut self) -> Result<GurobiSolution, Error> {
        self.model.update()?;
        self.model.optimize()?;

        let status = self.model.status()?;
        info!("Gurobi finished with status {:?}", status);

        match status {
            Status::Infeasible | Status::InfOrUnbd => return Err(Error::Infeasible),
            Status::Unbounded => return Err(Error::Unbounded),
            Status::TimeLimit => warn!("Time limit reached; solution is not proven optimal"),
            _ => (),
        }

        if self.model.get_attr(attr::SolCount)? == 0 {
            return Err(Error::NoSolution);
        }

        Ok(GurobiSolution { model: self.model })
    }
}

pub struct GurobiSolution {
    model: Model,
}

impl MipSolution for GurobiSolution {
    type Var = Var;

    fn objective(&self) -> Result<f64, Error> {
        Ok(self.model.get_attr(attr::ObjVal)?)
    }

    fn value(&self, var: Var) -> Result<f64, Error> {
        Ok(self.model.get_obj_attr(attr::X, &var)?)
    }
}
