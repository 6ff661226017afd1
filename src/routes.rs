use std::fmt;

use log::{debug, info};
use serde::Serialize;

use crate::models::routing::{ModelStats, RoutingResult};
use crate::problem::{AgentIndex, Distance, Place, PoolSize, Problem, VisitIndex};

/// A direct move of an agent between two places.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Leg {
    pub from: Place,
    pub to: Place,
    pub distance: Distance,
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "went from {} to {}", self.from, self.to)
    }
}

/// The legs travelled by one agent, in scan order of (origin, destination).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Itinerary {
    pub agent: AgentIndex,
    pub legs: Vec<Leg>,
}

impl Itinerary {
    /// Total distance travelled by the agent
    pub fn distance(&self) -> Distance {
        self.legs.iter().map(|leg| leg.distance).sum()
    }

    /// The visits served by the agent
    pub fn visits(&self) -> impl Iterator<Item = VisitIndex> + '_ {
        self.legs.iter().filter_map(|leg| match leg.to {
            Place::Visit(v) => Some(v),
            Place::Home(_) => None,
        })
    }

    /// Chains the legs into the sequence of places starting and ending at home.
    ///
    /// Returns `None` if the legs do not form exactly one such path. An idle agent stays home.
    pub fn path(&self) -> Option<Vec<Place>> {
        let home = Place::Home(self.agent);
        let mut path = vec![home];
        let mut remaining = self.legs.clone();

        let mut current = home;
        while !remaining.is_empty() {
            let next = remaining.iter().position(|leg| leg.from == current)?;
            current = remaining.swap_remove(next).to;
            path.push(current);

            if current == home && !remaining.is_empty() {
                return None;
            }
        }

        if current != home {
            return None;
        }

        Some(path)
    }
}

impl fmt::Display for Itinerary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Agent {} ({})", *self.agent, Place::Home(self.agent))?;
        for leg in &self.legs {
            writeln!(f, "{}", leg)?;
        }
        Ok(())
    }
}

/// The decoded routes of all agents.
#[derive(Debug, Clone, Serialize)]
pub struct Routes {
    pub itineraries: Vec<Itinerary>,
    /// Objective value reported by the optimizer
    pub objective: f64,
    /// Sum of the distances of all decoded legs
    pub distance: Distance,
    pub served_visits: usize,
    pub served_pool: PoolSize,
    pub stats: ModelStats,
}

impl fmt::Display for Routes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for itinerary in &self.itineraries {
            writeln!(f, "{}", itinerary)?;
        }
        Ok(())
    }
}

/// Reads the travel decisions out of a solved model.
///
/// A move is taken iff its solved value exceeds `threshold`. Moves that were never part of
/// the model are skipped without being looked at.
pub fn decode(problem: &Problem, result: &RoutingResult, threshold: f64) -> Routes {
    let places = problem.places();

    let itineraries: Vec<Itinerary> = problem
        .agents()
        .iter()
        .map(|agent| {
            let a = agent.index();
            let mut legs = Vec::new();
            for o in 0..places {
                for d in 0..places {
                    let taken = matches!(result.x[*a][o][d], Some(value) if value > threshold);
                    if taken {
                        let (from, to) = (problem.place(o), problem.place(d));
                        legs.push(Leg {
                            from,
                            to,
                            distance: problem.distance(from, to),
                        });
                    }
                }
            }
            debug!("Agent {} travels {} legs", *a, legs.len());
            Itinerary { agent: a, legs }
        })
        .collect();

    let distance: Distance = itineraries.iter().map(|i| i.distance()).sum();
    let served: Vec<VisitIndex> = itineraries.iter().flat_map(|i| i.visits()).collect();
    let served_pool: PoolSize = served
        .iter()
        .map(|v| problem.visits()[*v].pool_size())
        .sum();

    info!(
        "Decoded routes: distance {}, {} of {} visits served, pool {} of {}",
        distance,
        served.len(),
        problem.visits().len(),
        served_pool,
        problem.total_pool()
    );

    Routes {
        itineraries,
        objective: result.objective,
        distance,
        served_visits: served.len(),
        served_pool,
        stats: result.stats,
    }
}
