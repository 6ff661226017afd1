//! A model builder that records the model instead of solving it, and writes it in the
//! CPLEX LP format understood by most MIP solvers.

use std::io::{self, Write};

use log::info;

use super::{Error, ModelBuilder};

#[derive(Debug, Clone, PartialEq)]
pub struct LpVariable {
    pub name: String,
    pub objective: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LpConstraint {
    pub name: String,
    pub terms: Vec<(usize, f64)>,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone)]
pub struct LpFile {
    name: String,
    variables: Vec<LpVariable>,
    constraints: Vec<LpConstraint>,
}

impl LpFile {
    pub fn new(name: &str) -> LpFile {
        LpFile {
            name: name.to_string(),
            variables: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn variables(&self) -> &[LpVariable] {
        &self.variables
    }

    pub fn constraints(&self) -> &[LpConstraint] {
        &self.constraints
    }

    fn write_expr<W: Write>(&self, out: &mut W, terms: &[(usize, f64)]) -> io::Result<()> {
        if terms.is_empty() {
            return write!(out, " 0");
        }

        for (i, (var, coeff)) in terms.iter().enumerate() {
            let sign = if *coeff < 0.0 { "-" } else if i > 0 { "+" } else { "" };
            write!(out, " {sign} {} {}", coeff.abs(), self.variables[*var].name)?;
        }

        Ok(())
    }

    /// Writes the model in LP format. Ranged constraints are split into a lower and an upper row,
    /// and constraints without terms become comments.
    pub fn write<W: Write>(&self, mut out: W) -> io::Result<()> {
        info!(
            "Writing model {} with {} variables and {} constraints",
            self.name,
            self.variables.len(),
            self.constraints.len()
        );

        writeln!(out, "\\ {}", self.name)?;
        writeln!(out, "Minimize")?;
        write!(out, " obj:")?;
        let objective: Vec<_> = self
            .variables
            .iter()
            .enumerate()
            .filter(|(_, v)| v.objective != 0.0)
            .map(|(i, v)| (i, v.objective))
            .collect();
        self.write_expr(&mut out, &objective)?;
        writeln!(out)?;

        writeln!(out, "Subject To")?;
        for c in &self.constraints {
            // rows without variables are not valid LP, only their bounds are recorded
            if c.terms.is_empty() {
                writeln!(out, "\\ {}: 0 in [{}, {}]", c.name, c.lower, c.upper)?;
                continue;
            }

            if c.lower == c.upper {
                write!(out, " {}:", c.name)?;
                self.write_expr(&mut out, &c.terms)?;
                writeln!(out, " = {}", c.lower)?;
                continue;
            }

            write!(out, " {}_lo:", c.name)?;
            self.write_expr(&mut out, &c.terms)?;
            writeln!(out, " >= {}", c.lower)?;
            write!(out, " {}_hi:", c.name)?;
            self.write_expr(&mut out, &c.terms)?;
            writeln!(out, " <= {}", c.upper)?;
        }

        writeln!(out, "Binary")?;
        for v in &self.variables {
            writeln!(out, " {}", v.name)?;
        }
        writeln!(out, "End")?;

        Ok(())
    }
}

impl ModelBuilder for LpFile {
    type Var = usize;

    fn binary_var(&mut self, name: &str, objective: f64) -> Result<usize, Error> {
        self.variables.push(LpVariable {
            name: name.to_string(),
            objective,
        });
        Ok(self.variables.len() - 1)
    }

    fn add_constraint(
        &mut self,
        name: &str,
        terms: &[(usize, f64)],
        lower: f64,
        upper: f64,
    ) -> Result<(), Error> {
        self.constraints.push(LpConstraint {
            name: name.to_string(),
            terms: terms.to_vec(),
            lower,
            upper,
        });
        Ok(())
    }
}
