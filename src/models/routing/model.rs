use itertools::iproduct;
use log::{debug, info, trace};
use serde::Serialize;

use super::sets_and_parameters::{Parameters, Sets};
use crate::config::Config;
use crate::models::utils::{AddVars, ConvertVars};
use crate::models::{ConstraintBuilder, Error, MipSolution, MipSolver, ModelBuilder};
use crate::problem::{AgentIndex, Distance, Place, Problem, VisitIndex};

/// An entry of the travel tensor `x[a][o][d]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Move<V> {
    /// The agent may travel directly from origin to destination at the given distance
    Travel { var: V, distance: Distance },
    /// The move is impossible and fixed to zero. Never part of the model.
    Absent,
}

impl<V: Copy> Move<V> {
    pub fn var(&self) -> Option<V> {
        match self {
            Move::Travel { var, .. } => Some(*var),
            Move::Absent => None,
        }
    }

    pub fn distance(&self) -> Option<Distance> {
        match self {
            Move::Travel { distance, .. } => Some(*distance),
            Move::Absent => None,
        }
    }

    pub fn is_travel(&self) -> bool {
        matches!(self, Move::Travel { .. })
    }
}

impl<S, V> ConvertVars<S> for Move<V>
where
    S: MipSolution<Var = V>,
    V: Copy,
{
    type Out = Option<f64>;

    fn convert(&self, solution: &S) -> Result<Self::Out, Error> {
        match self {
            Move::Travel { var, .. } => Ok(Some(solution.value(*var)?)),
            Move::Absent => Ok(None),
        }
    }
}

/// Whether `agent` can travel directly from `origin` to `destination`.
///
/// An agent only leaves from and returns to its own home, and moves between visits only
/// forward in time: the origin's slot must be strictly earlier than the destination's.
/// This also rules out self-loops and cycles.
pub fn admissible(
    parameters: &Parameters,
    agent: AgentIndex,
    origin: Place,
    destination: Place,
) -> bool {
    match (origin, destination) {
        (Place::Home(home), Place::Visit(_)) => home == agent,
        (Place::Visit(_), Place::Home(home)) => home == agent,
        (Place::Visit(o), Place::Visit(d)) => parameters.slot[o] < parameters.slot[d],
        (Place::Home(_), Place::Home(_)) => false,
    }
}

pub struct Variables<V> {
    /// 1 if agent a travels directly from place o to place d, indexed by flat place index
    pub x: Vec<Vec<Vec<Move<V>>>>,
    /// The number of agents, needed to project places to flat indices
    agents: usize,
}

impl<V: Copy> Variables<V> {
    /// Creates a binary variable for every admissible move, weighted by its distance.
    pub fn build<M>(model: &mut M, sets: &Sets, parameters: &Parameters) -> Result<Self, Error>
    where
        M: ModelBuilder<Var = V>,
    {
        let agents = sets.A.len();
        let places = sets.P.len();

        let x = (agents, places, places).vars_with(|(a, o, d)| {
            if !admissible(parameters, sets.A[a], sets.P[o], sets.P[d]) {
                return Ok(Move::Absent);
            }

            let distance = parameters.distance[o][d];
            let var = model.binary_var(&format!("x_{a}_{o}_{d}"), distance)?;
            trace!("x_{a}_{o}_{d}: {} -> {} ({distance})", sets.P[o], sets.P[d]);
            Ok(Move::Travel { var, distance })
        })?;

        Ok(Variables { x, agents })
    }

    pub fn get(&self, agent: AgentIndex, origin: Place, destination: Place) -> &Move<V> {
        &self.x[*agent][origin.index(self.agents)][destination.index(self.agents)]
    }

    pub fn var(&self, agent: AgentIndex, origin: Place, destination: Place) -> Option<V> {
        self.get(agent, origin, destination).var()
    }

    /// The number of variables present in the model
    pub fn count(&self) -> usize {
        self.x
            .iter()
            .flatten()
            .flatten()
            .filter(|entry| entry.is_travel())
            .count()
    }

    /// Arrivals of `agent` at visit `vd`: from its home, and from every earlier visit
    pub fn inflow<'a>(
        &'a self,
        sets: &'a Sets,
        agent: AgentIndex,
        vd: VisitIndex,
    ) -> impl Iterator<Item = Option<V>> + 'a {
        let destination = Place::Visit(vd);
        std::iter::once(self.var(agent, Place::Home(agent), destination)).chain(
            sets.before[vd]
                .iter()
                .map(move |vo| self.var(agent, Place::Visit(*vo), destination)),
        )
    }

    /// Departures of `agent` from visit `vo`: to every later visit, and back home
    pub fn outflow<'a>(
        &'a self,
        sets: &'a Sets,
        agent: AgentIndex,
        vo: VisitIndex,
    ) -> impl Iterator<Item = Option<V>> + 'a {
        let origin = Place::Visit(vo);
        sets.after[vo]
            .iter()
            .map(move |vd| self.var(agent, origin, Place::Visit(*vd)))
            .chain(std::iter::once(self.var(agent, origin, Place::Home(agent))))
    }
}

/// The number of variables and constraints in a routing model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModelStats {
    pub variables: usize,
    pub arrival: usize,
    pub continuity: usize,
    pub slot_capacity: usize,
    pub quota: usize,
    pub departure: usize,
    pub return_home: usize,
}

impl ModelStats {
    pub fn constraints(&self) -> usize {
        self.arrival
            + self.continuity
            + self.slot_capacity
            + self.quota
            + self.departure
            + self.return_home
    }
}

pub struct RoutingSolver {}

impl RoutingSolver {
    /// Builds the routing model into `model`.
    pub fn build<M: ModelBuilder>(
        model: &mut M,
        sets: &Sets,
        parameters: &Parameters,
    ) -> Result<(Variables<M::Var>, ModelStats), Error> {
        info!(
            "Building routing model for {} agents and {} visits.",
            sets.A.len(),
            sets.V.len()
        );

        let x = Variables::build(model, sets, parameters)?;

        let stats = ModelStats {
            variables: x.count(),
            arrival: Self::arrival_constraints(model, sets, &x)?,
            continuity: Self::continuity_constraints(model, sets, &x)?,
            slot_capacity: Self::slot_capacity_constraints(model, sets, &x)?,
            quota: Self::quota_constraint(model, sets, parameters, &x)?,
            departure: Self::departure_constraints(model, sets, &x)?,
            return_home: Self::return_constraints(model, sets, &x)?,
        };

        debug!("{:?}", stats);
        info!(
            "Successfully built routing model with {} variables and {} constraints",
            stats.variables,
            stats.constraints()
        );

        Ok((x, stats))
    }

    /// Every visit is either canceled or served by exactly one agent
    fn arrival_constraints<M: ModelBuilder>(
        model: &mut M,
        sets: &Sets,
        x: &Variables<M::Var>,
    ) -> Result<usize, Error> {
        for vd in &sets.V {
            let mut cons = ConstraintBuilder::new(format!("arrival_{}", **vd));
            for a in &sets.A {
                for var in x.inflow(sets, *a, *vd) {
                    cons.add_term(var, 1.0);
                }
            }
            cons.commit(model, 0.0, 1.0)?;
        }

        Ok(sets.V.len())
    }

    /// An agent arriving at a visit must also leave it, possibly straight home
    fn continuity_constraints<M: ModelBuilder>(
        model: &mut M,
        sets: &Sets,
        x: &Variables<M::Var>,
    ) -> Result<usize, Error> {
        for (a, v) in iproduct!(&sets.A, &sets.V) {
            let mut cons = ConstraintBuilder::new(format!("continuity_{}_{}", **a, **v));
            for var in x.inflow(sets, *a, *v) {
                cons.add_term(var, 1.0);
            }
            for var in x.outflow(sets, *a, *v) {
                cons.add_term(var, -1.0);
            }
            cons.commit(model, 0.0, 0.0)?;
        }

        Ok(sets.A.len() * sets.V.len())
    }

    /// No slot serves more visits than there are agents, and a slot serves as many
    /// visits as it can
    fn slot_capacity_constraints<M: ModelBuilder>(
        model: &mut M,
        sets: &Sets,
        x: &Variables<M::Var>,
    ) -> Result<usize, Error> {
        let agents = sets.A.len();

        for (slot, visits) in &sets.S {
            let mut cons = ConstraintBuilder::new(format!("slot_capacity_{slot}"));
            for (vd, a) in iproduct!(visits, &sets.A) {
                for var in x.inflow(sets, *a, *vd) {
                    cons.add_term(var, 1.0);
                }
            }

            let lower = visits.len().min(agents);
            cons.commit(model, lower as f64, agents as f64)?;
        }

        Ok(sets.S.len())
    }

    /// The served visits must cover at least the quota of the total pool
    fn quota_constraint<M: ModelBuilder>(
        model: &mut M,
        sets: &Sets,
        parameters: &Parameters,
        x: &Variables<M::Var>,
    ) -> Result<usize, Error> {
        info!(
            "Served pool must lie between {} and {}",
            parameters.min_served_pool, parameters.total_pool
        );

        let mut cons = ConstraintBuilder::new("quota");
        for (vd, a) in iproduct!(&sets.V, &sets.A) {
            let pool = parameters.pool[*vd] as f64;
            for var in x.inflow(sets, *a, *vd) {
                cons.add_term(var, pool);
            }
        }
        cons.commit(
            model,
            parameters.min_served_pool as f64,
            parameters.total_pool as f64,
        )?;

        Ok(1)
    }

    /// Every agent leaves home at most once
    fn departure_constraints<M: ModelBuilder>(
        model: &mut M,
        sets: &Sets,
        x: &Variables<M::Var>,
    ) -> Result<usize, Error> {
        for a in &sets.A {
            let home = Place::Home(*a);
            let mut cons = ConstraintBuilder::new(format!("departure_{}", **a));
            for v in &sets.V {
                cons.add_term(x.var(*a, home, Place::Visit(*v)), 1.0);
            }
            cons.commit(model, 0.0, 1.0)?;
        }

        Ok(sets.A.len())
    }

    /// Every agent returns home at most once
    fn return_constraints<M: ModelBuilder>(
        model: &mut M,
        sets: &Sets,
        x: &Variables<M::Var>,
    ) -> Result<usize, Error> {
        for a in &sets.A {
            let home = Place::Home(*a);
            let mut cons = ConstraintBuilder::new(format!("return_{}", **a));
            for v in &sets.V {
                cons.add_term(x.var(*a, Place::Visit(*v), home), 1.0);
            }
            cons.commit(model, 0.0, 1.0)?;
        }

        Ok(sets.A.len())
    }

    /// Builds the model for `problem` and solves it once within the configured time limit.
    pub fn solve<M: MipSolver>(
        problem: &Problem,
        config: &Config,
        mut model: M,
    ) -> Result<RoutingResult, Error> {
        let sets = Sets::new(problem);
        let parameters = Parameters::new(problem, &sets, config.quota);
        let (x, stats) = Self::build(&mut model, &sets, &parameters)?;

        model.set_time_limit(config.time_limit())?;
        info!(
            "Solving routing model with a time limit of {} s",
            config.time_limit
        );
        let solution = model.solve()?;

        RoutingResult::new(&x, &solution, stats)
    }
}

#[derive(Debug, Clone)]
pub struct RoutingResult {
    /// Solved value of each variable in the model, `None` for moves that are not in the model
    pub x: Vec<Vec<Vec<Option<f64>>>>,
    /// Total distance of the solution, as reported by the optimizer
    pub objective: f64,
    /// Size of the model that was solved
    pub stats: ModelStats,
}

impl RoutingResult {
    pub fn new<S: MipSolution>(
        variables: &Variables<S::Var>,
        solution: &S,
        stats: ModelStats,
    ) -> Result<RoutingResult, Error>
    where
        S::Var: Copy,
    {
        let x = variables.x.convert(solution)?;
        let objective = solution.objective()?;
        info!("Found solution with total distance {objective}");

        Ok(RoutingResult {
            x,
            objective,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lp_file::LpFile;
    use crate::problem::Point;

    fn build(problem: &Problem) -> (LpFile, Variables<usize>, ModelStats, Parameters) {
        let sets = Sets::new(problem);
        let parameters = Parameters::new(problem, &sets, 0.95);
        let mut model = LpFile::new("test");
        let (x, stats) = RoutingSolver::build(&mut model, &sets, &parameters).unwrap();
        (model, x, stats, parameters)
    }

    fn problem() -> Problem {
        Problem::new(
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)],
            vec![
                (0, Point::new(3.0, 4.0), 10),
                (1, Point::new(6.0, 8.0), 20),
                (1, Point::new(0.0, 1.0), 30),
            ],
        )
        .unwrap()
    }

    #[test]
    fn only_admissible_moves_become_variables() {
        let problem = problem();
        let (model, x, stats, parameters) = build(&problem);
        let agents = problem.agents().len();

        for (a, o, d) in iproduct!(0..agents, 0..problem.places(), 0..problem.places()) {
            let (agent, origin, destination) = (AgentIndex::from(a), problem.place(o), problem.place(d));
            let entry = x.get(agent, origin, destination);
            let expected = match (origin, destination) {
                (Place::Home(h), Place::Visit(_)) => h == agent,
                (Place::Visit(_), Place::Home(h)) => h == agent,
                (Place::Visit(vo), Place::Visit(vd)) => {
                    problem.visits()[vo].slot() < problem.visits()[vd].slot()
                }
                (Place::Home(_), Place::Home(_)) => false,
            };

            assert_eq!(entry.is_travel(), expected, "x_{a}_{o}_{d}");
            assert_eq!(admissible(&parameters, agent, origin, destination), expected);
            if let Move::Travel { distance, .. } = entry {
                assert_eq!(*distance, problem.distance(origin, destination));
            }
        }

        // per agent: 3 departures, 3 returns, and visit 0 precedes visits 1 and 2
        assert_eq!(stats.variables, 2 * (3 + 3 + 2));
        assert_eq!(model.variables().len(), stats.variables);
    }

    #[test]
    fn objective_coefficients_are_distances() {
        let problem = problem();
        let (model, x, _, _) = build(&problem);
        let agent = AgentIndex::from(0);
        let visit = Place::Visit(VisitIndex::from(0));

        let var = x.var(agent, Place::Home(agent), visit).unwrap();
        assert_eq!(model.variables()[var].objective, 5.0);
        let var = x.var(agent, visit, Place::Visit(VisitIndex::from(1))).unwrap();
        assert_eq!(model.variables()[var].objective, 5.0);
    }

    #[test]
    fn constraint_families_have_expected_sizes_and_bounds() {
        let problem = problem();
        let (model, _, stats, _) = build(&problem);

        assert_eq!(stats.arrival, 3);
        assert_eq!(stats.continuity, 6);
        assert_eq!(stats.slot_capacity, 2);
        assert_eq!(stats.quota, 1);
        assert_eq!(stats.departure, 2);
        assert_eq!(stats.return_home, 2);
        assert_eq!(model.constraints().len(), stats.constraints());

        let find = |name: &str| {
            model
                .constraints()
                .iter()
                .find(|c| c.name == name)
                .unwrap_or_else(|| panic!("missing constraint {name}"))
        };

        let arrival = find("arrival_1");
        assert_eq!((arrival.lower, arrival.upper), (0.0, 1.0));
        // each agent: from home, and from visit 0
        assert_eq!(arrival.terms.len(), 4);

        let continuity = find("continuity_1_0");
        assert_eq!((continuity.lower, continuity.upper), (0.0, 0.0));
        // in: home; out: visits 1 and 2, home
        let positive = continuity.terms.iter().filter(|(_, c)| *c > 0.0).count();
        let negative = continuity.terms.iter().filter(|(_, c)| *c < 0.0).count();
        assert_eq!((positive, negative), (1, 3));

        let slot = find("slot_capacity_1");
        assert_eq!((slot.lower, slot.upper), (2.0, 2.0));
        assert_eq!(slot.terms.len(), 8);

        let slot = find("slot_capacity_0");
        assert_eq!((slot.lower, slot.upper), (1.0, 2.0));

        let quota = find("quota");
        assert_eq!((quota.lower, quota.upper), (57.0, 60.0));
        let weights: f64 = quota.terms.iter().map(|(_, c)| c).sum();
        // visit 0: 2 arcs, visits 1 and 2: 4 arcs each
        assert_eq!(weights, 2.0 * 10.0 + 4.0 * 20.0 + 4.0 * 30.0);

        for name in ["departure_0", "departure_1", "return_0", "return_1"] {
            let cons = find(name);
            assert_eq!((cons.lower, cons.upper), (0.0, 1.0));
            assert_eq!(cons.terms.len(), 3);
        }
    }

    #[test]
    fn continuity_never_references_the_same_variable_twice() {
        let problem = problem();
        let (model, _, _, _) = build(&problem);

        for cons in model.constraints() {
            let mut vars: Vec<_> = cons.terms.iter().map(|(v, _)| *v).collect();
            vars.sort_unstable();
            vars.dedup();
            assert_eq!(vars.len(), cons.terms.len(), "{}", cons.name);
        }
    }

    #[test]
    fn no_visits_means_no_variables() {
        let problem = Problem::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)], vec![]).unwrap();
        let (model, _, stats, _) = build(&problem);

        assert_eq!(stats.variables, 0);
        assert_eq!(stats.constraints(), 1 + 2 + 2);
        assert!(model.constraints().iter().all(|c| c.terms.is_empty()));
    }
}
