pub mod model;
pub mod sets_and_parameters;

pub use model::{ModelStats, Move, RoutingResult, RoutingSolver, Variables};
pub use sets_and_parameters::{Parameters, Sets};
