use std::collections::BTreeMap;
use std::fmt;

use derive_more::{Deref, Display, From, Into};
use serde::{Deserialize, Serialize};
use typed_index_collections::TiVec;

use crate::utils;

/// The type used for distance
pub type Distance = f64;
/// The type used for scheduling slots
pub type Slot = u32;
/// The type used for the demand of a visit
pub type PoolSize = u64;

/// A point in Euclidean 2d-space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }
}

#[derive(
    Deref, Debug, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash, Serialize,
)]
pub struct AgentIndex(usize);

#[derive(
    Deref, Debug, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash, Serialize,
)]
pub struct VisitIndex(usize);

/// A location an agent can be at: either the home of an agent, or one of the visits.
///
/// All places share one flat index space: homes occupy `[0, A)` (agent `i` lives at `i`)
/// and visits occupy `[A, A + V)` in input order. The derived ordering agrees with that
/// projection, so sorting places sorts their flat indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Place {
    Home(AgentIndex),
    Visit(VisitIndex),
}

impl Place {
    /// The flat index of this place, given the number of agents in the problem.
    pub fn index(self, agents: usize) -> usize {
        match self {
            Place::Home(a) => *a,
            Place::Visit(v) => agents + *v,
        }
    }

    /// The place with the given flat index, given the number of agents in the problem.
    pub fn from_index(index: usize, agents: usize) -> Place {
        if index < agents {
            Place::Home(AgentIndex(index))
        } else {
            Place::Visit(VisitIndex(index - agents))
        }
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place::Home(a) => write!(f, "Home {}", **a),
            Place::Visit(v) => write!(f, "Visit {}", **v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Agent {
    /// The index of the agent, which is also the index of its home
    index: AgentIndex,
    /// Where the agent departs from and returns to
    home: Point,
}

impl Agent {
    pub fn index(&self) -> AgentIndex {
        self.index
    }

    pub fn home(&self) -> Point {
        self.home
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visit {
    /// The index of the visit, in input order
    index: VisitIndex,
    /// The scheduling slot of the visit
    slot: Slot,
    /// The location of the visit
    location: Point,
    /// The number of visitors served if the visit happens
    pool_size: PoolSize,
}

impl Visit {
    pub fn index(&self) -> VisitIndex {
        self.index
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn location(&self) -> Point {
        self.location
    }

    pub fn pool_size(&self) -> PoolSize {
        self.pool_size
    }
}

#[derive(Debug, Display, PartialEq)]
pub enum ProblemError {
    /// Visit `visit` has a pool size of zero
    #[display(fmt = "visit {} has an empty pool", visit)]
    EmptyPool { visit: usize },
    /// A coordinate is NaN or infinite
    #[display(fmt = "{} has a non-finite coordinate", place)]
    NonFiniteCoordinate { place: Place },
}

impl std::error::Error for ProblemError {}

#[derive(Debug, Clone)]
pub struct Problem {
    /// The agents of the problem, ordered by index
    agents: TiVec<AgentIndex, Agent>,
    /// The visits of the problem, ordered by index
    visits: TiVec<VisitIndex, Visit>,
    /// The visits grouped by their scheduling slot
    slots: BTreeMap<Slot, Vec<VisitIndex>>,
}

impl Problem {
    /// Construct a problem from the agents' homes and the visits given as `(slot, location, pool_size)`.
    pub fn new(
        homes: Vec<Point>,
        visits: Vec<(Slot, Point, PoolSize)>,
    ) -> Result<Problem, ProblemError> {
        let agents: TiVec<AgentIndex, Agent> = homes
            .into_iter()
            .enumerate()
            .map(|(i, home)| Agent {
                index: AgentIndex(i),
                home,
            })
            .collect();

        let visits: TiVec<VisitIndex, Visit> = visits
            .into_iter()
            .enumerate()
            .map(|(i, (slot, location, pool_size))| Visit {
                index: VisitIndex(i),
                slot,
                location,
                pool_size,
            })
            .collect();

        for agent in &agents {
            if !(agent.home.x.is_finite() && agent.home.y.is_finite()) {
                return Err(ProblemError::NonFiniteCoordinate {
                    place: Place::Home(agent.index),
                });
            }
        }

        for visit in &visits {
            if visit.pool_size == 0 {
                return Err(ProblemError::EmptyPool {
                    visit: *visit.index,
                });
            }
            if !(visit.location.x.is_finite() && visit.location.y.is_finite()) {
                return Err(ProblemError::NonFiniteCoordinate {
                    place: Place::Visit(visit.index),
                });
            }
        }

        let mut slots: BTreeMap<Slot, Vec<VisitIndex>> = BTreeMap::new();
        for visit in &visits {
            slots.entry(visit.slot).or_default().push(visit.index);
        }

        Ok(Problem {
            agents,
            visits,
            slots,
        })
    }

    /// The agents of the problem. Ordered by index (continuous, starting at 0)
    pub fn agents(&self) -> &TiVec<AgentIndex, Agent> {
        &self.agents
    }

    /// The visits of the problem. Ordered by index (continuous, starting at 0)
    pub fn visits(&self) -> &TiVec<VisitIndex, Visit> {
        &self.visits
    }

    /// The visits occupying each scheduling slot, in input order within a slot
    pub fn slots(&self) -> &BTreeMap<Slot, Vec<VisitIndex>> {
        &self.slots
    }

    /// The number of places, i.e. homes plus visits
    pub fn places(&self) -> usize {
        self.agents.len() + self.visits.len()
    }

    /// The flat index of `place`
    pub fn place_index(&self, place: Place) -> usize {
        place.index(self.agents.len())
    }

    /// The place with flat index `index`
    pub fn place(&self, index: usize) -> Place {
        Place::from_index(index, self.agents.len())
    }

    /// The coordinates of a place
    pub fn location(&self, place: Place) -> Point {
        match place {
            Place::Home(a) => self.agents[a].home,
            Place::Visit(v) => self.visits[v].location,
        }
    }

    /// The Euclidean distance between two places
    pub fn distance(&self, from: Place, to: Place) -> Distance {
        utils::distance(self.location(from), self.location(to))
    }

    /// The sum of the pool sizes over all visits
    pub fn total_pool(&self) -> PoolSize {
        self.visits.iter().map(|v| v.pool_size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem() -> Problem {
        Problem::new(
            vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)],
            vec![
                (2, Point::new(3.0, 4.0), 10),
                (0, Point::new(0.0, 4.0), 5),
                (2, Point::new(1.0, 2.0), 7),
            ],
        )
        .unwrap()
    }

    #[test]
    fn places_project_homes_before_visits() {
        let problem = problem();
        assert_eq!(problem.places(), 5);
        assert_eq!(problem.place(1), Place::Home(AgentIndex(1)));
        assert_eq!(problem.place(2), Place::Visit(VisitIndex(0)));
        assert_eq!(problem.place(4), Place::Visit(VisitIndex(2)));

        for index in 0..problem.places() {
            assert_eq!(problem.place_index(problem.place(index)), index);
        }

        let mut places: Vec<_> = (0..problem.places()).rev().map(|i| problem.place(i)).collect();
        places.sort();
        let indices: Vec<_> = places.iter().map(|p| problem.place_index(*p)).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn slot_index_groups_visits_in_input_order() {
        let problem = problem();
        let slots: Vec<_> = problem.slots().iter().collect();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0], (&0, &vec![VisitIndex(1)]));
        assert_eq!(slots[1], (&2, &vec![VisitIndex(0), VisitIndex(2)]));
    }

    #[test]
    fn distance_between_places() {
        let problem = problem();
        let home = Place::Home(AgentIndex(0));
        let visit = Place::Visit(VisitIndex(0));
        assert_eq!(problem.distance(home, visit), 5.0);
        assert_eq!(problem.distance(visit, home), 5.0);
        assert_eq!(problem.total_pool(), 22);
    }

    #[test]
    fn place_display() {
        assert_eq!(Place::Home(AgentIndex(3)).to_string(), "Home 3");
        assert_eq!(Place::Visit(VisitIndex(0)).to_string(), "Visit 0");
    }

    #[test]
    fn rejects_empty_pools() {
        let err = Problem::new(vec![Point::new(0.0, 0.0)], vec![(0, Point::new(1.0, 1.0), 0)])
            .unwrap_err();
        assert_eq!(err, ProblemError::EmptyPool { visit: 0 });
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        let err = Problem::new(vec![Point::new(f64::NAN, 0.0)], vec![]).unwrap_err();
        assert_eq!(
            err,
            ProblemError::NonFiniteCoordinate {
                place: Place::Home(AgentIndex(0))
            }
        );
    }
}
