use std::collections::BTreeMap;

use typed_index_collections::TiVec;

use crate::problem::{AgentIndex, Distance, Place, PoolSize, Problem, Slot, VisitIndex};

#[derive(Debug)]
#[allow(non_snake_case)]
pub struct Sets {
    /// Set of agents
    pub A: Vec<AgentIndex>,
    /// Set of visits
    pub V: Vec<VisitIndex>,
    /// Set of places, homes followed by visits
    pub P: Vec<Place>,
    /// Set of visits occupying each scheduling slot
    pub S: BTreeMap<Slot, Vec<VisitIndex>>,
    /// Visits whose slot is strictly earlier than the slot of visit v
    pub before: TiVec<VisitIndex, Vec<VisitIndex>>,
    /// Visits whose slot is strictly later than the slot of visit v
    pub after: TiVec<VisitIndex, Vec<VisitIndex>>,
}

#[allow(non_snake_case)]
impl Sets {
    pub fn new(problem: &Problem) -> Sets {
        let A: Vec<AgentIndex> = problem.agents().iter().map(|a| a.index()).collect();
        let V: Vec<VisitIndex> = problem.visits().iter().map(|v| v.index()).collect();
        let P = A
            .iter()
            .map(|a| Place::Home(*a))
            .chain(V.iter().map(|v| Place::Visit(*v)))
            .collect();

        let slot = |v: VisitIndex| problem.visits()[v].slot();
        let before = V
            .iter()
            .map(|vd| V.iter().filter(|vo| slot(**vo) < slot(*vd)).copied().collect())
            .collect();
        let after = V
            .iter()
            .map(|vo| V.iter().filter(|vd| slot(*vo) < slot(**vd)).copied().collect())
            .collect();

        Sets {
            A,
            V,
            P,
            S: problem.slots().clone(),
            before,
            after,
        }
    }
}

pub struct Parameters {
    /// Euclidean distance between each pair of places, indexed by flat place index
    pub distance: Vec<Vec<Distance>>,
    /// Scheduling slot of visit v
    pub slot: TiVec<VisitIndex, Slot>,
    /// Pool size of visit v
    pub pool: TiVec<VisitIndex, PoolSize>,
    /// Sum of all pool sizes
    pub total_pool: PoolSize,
    /// Smallest pool that must be served, `floor(quota * total_pool)`
    pub min_served_pool: PoolSize,
}

impl Parameters {
    pub fn new(problem: &Problem, sets: &Sets, quota: f64) -> Parameters {
        let distance = sets
            .P
            .iter()
            .map(|o| sets.P.iter().map(|d| problem.distance(*o, *d)).collect())
            .collect();
        let slot = problem.visits().iter().map(|v| v.slot()).collect();
        let pool = problem.visits().iter().map(|v| v.pool_size()).collect();
        let total_pool = problem.total_pool();

        Parameters {
            distance,
            slot,
            pool,
            total_pool,
            min_served_pool: min_served_pool(total_pool, quota),
        }
    }

    /// The distance between two places
    pub fn distance(&self, agents: usize, from: Place, to: Place) -> Distance {
        self.distance[from.index(agents)][to.index(agents)]
    }
}

/// The served pool required by the quota, truncated towards zero.
pub fn min_served_pool(total_pool: PoolSize, quota: f64) -> PoolSize {
    (total_pool as f64 * quota).floor() as PoolSize
}
