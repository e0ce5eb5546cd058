//! route-planner core
//!
//! Turns a list of addresses into multi-vehicle route plans: stops are
//! measured in quota-sized batches, the raw distances are normalized into a
//! symmetric kilometer cost matrix, and a routing model with a per-vehicle
//! distance cap is solved by a pluggable search engine.

pub mod config;
pub mod error;
pub mod google;
pub mod haversine;
pub mod matrix;
pub mod model;
pub mod osrm;
pub mod search;
pub mod service;
pub mod solver;
pub mod stop;
pub mod traits;

pub use config::{FleetConfig, MatrixConfig, PlannerConfig};
pub use error::PlannerError;
pub use matrix::{CostMatrix, RawCell, RawMatrix, build_cost_matrix, build_raw_matrix, normalize};
pub use model::RoutingModel;
pub use search::{FirstSolutionStrategy, LocalSearchMetaheuristic, RoutingEngine, SearchEngine, SearchParameters};
pub use solver::{InfeasibleReason, Solution, SolveOutcome, solve, solve_with};
pub use stop::Stop;
