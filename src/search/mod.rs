//! Search-engine capability.
//!
//! The routing model describes a problem as node/vehicle counts, a depot,
//! an arc-cost callback, one cumulative dimension and a global span
//! coefficient. Any engine implementing [`SearchEngine`] can answer it with
//! an [`Assignment`]. [`RoutingEngine`] is the built-in implementation.

pub mod construction;
pub mod local_search;

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::matrix::CostMatrix;
use crate::model::Dimension;

/// Heuristic used to build the first assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FirstSolutionStrategy {
    /// Fill one vehicle at a time, always following the cheapest arc out of
    /// the route's last node.
    #[default]
    PathCheapestArc,
    /// Grow all vehicles together, inserting the node whose placement raises
    /// the objective least.
    ParallelCheapestInsertion,
}

/// Improvement phase run after the first assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocalSearchMetaheuristic {
    /// Keep the first assignment as is.
    #[default]
    None,
    /// Apply improving 2-opt and relocate moves until none is left.
    GreedyDescent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParameters {
    pub first_solution_strategy: FirstSolutionStrategy,
    pub local_search: LocalSearchMetaheuristic,
    /// Maximum improvement rounds for local search.
    pub local_search_iterations: usize,
    /// Wall-clock budget for the whole search.
    pub time_limit: Option<Duration>,
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            first_solution_strategy: FirstSolutionStrategy::PathCheapestArc,
            local_search: LocalSearchMetaheuristic::None,
            local_search_iterations: 100,
            time_limit: None,
        }
    }
}

impl SearchParameters {
    pub fn with_first_solution_strategy(mut self, strategy: FirstSolutionStrategy) -> Self {
        self.first_solution_strategy = strategy;
        self
    }

    pub fn with_local_search(mut self, local_search: LocalSearchMetaheuristic) -> Self {
        self.local_search = local_search;
        self
    }

    pub fn with_local_search_iterations(mut self, iterations: usize) -> Self {
        self.local_search_iterations = iterations;
        self
    }

    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = Some(time_limit);
        self
    }
}

/// Arc-cost callback registered with the engine.
pub type ArcCostFn<'a> = Box<dyn Fn(usize, usize) -> i64 + Sync + 'a>;

/// A routing problem as seen by a search engine.
pub struct SearchProblem<'a> {
    pub node_count: usize,
    pub vehicle_count: usize,
    pub depot: usize,
    /// Returns [`CostMatrix::UNREACHABLE`] for arcs that must not be used.
    pub arc_cost: ArcCostFn<'a>,
    pub dimension: &'a Dimension,
    pub span_coefficient: i64,
}

impl SearchProblem<'_> {
    /// At least one node and a depot inside the node range.
    pub fn is_well_formed(&self) -> bool {
        self.depot < self.node_count
    }

    /// Cost of an arc, or `None` when the arc cannot be travelled.
    pub fn arc(&self, from: usize, to: usize) -> Option<i64> {
        let cost = (self.arc_cost)(from, to);
        (cost != CostMatrix::UNREACHABLE).then_some(cost)
    }

    /// Length of a closed route through `visits` (depot excluded).
    pub fn route_distance(&self, visits: &[usize]) -> Option<i64> {
        let mut distance: i64 = 0;
        let mut previous = self.depot;
        for &node in visits.iter().chain(std::iter::once(&self.depot)) {
            distance = distance.saturating_add(self.arc(previous, node)?);
            previous = node;
        }
        Some(distance)
    }

    /// Whether a route distance fits the dimension capacity.
    pub fn within_capacity(&self, distance: i64) -> bool {
        distance <= self.dimension.capacity
    }

    /// Arc cost of all routes plus span coefficient times the longest route.
    pub fn objective(&self, route_distances: &[i64]) -> i64 {
        let total = route_distances.iter().fold(0i64, |acc, &d| acc.saturating_add(d));
        let span = route_distances.iter().copied().max().unwrap_or(0);
        total.saturating_add(self.span_coefficient.saturating_mul(span))
    }
}

/// Successor assignment produced by a search engine.
///
/// Each vehicle leaves the depot towards [`Assignment::first`] and follows
/// [`Assignment::next`] until it reaches the depot again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    depot: usize,
    first: Vec<usize>,
    next: Vec<Option<usize>>,
}

impl Assignment {
    /// Builds an assignment from per-vehicle visit sequences (depot excluded).
    pub fn from_routes(node_count: usize, depot: usize, routes: &[Vec<usize>]) -> Self {
        let mut first = Vec::with_capacity(routes.len());
        let mut next = vec![None; node_count];
        for route in routes {
            first.push(route.first().copied().unwrap_or(depot));
            for pair in route.windows(2) {
                next[pair[0]] = Some(pair[1]);
            }
            if let Some(&last) = route.last() {
                next[last] = Some(depot);
            }
        }
        Self { depot, first, next }
    }

    pub fn depot(&self) -> usize {
        self.depot
    }

    pub fn vehicle_count(&self) -> usize {
        self.first.len()
    }

    /// First node after the depot for `vehicle`; the depot itself if unused.
    pub fn first(&self, vehicle: usize) -> usize {
        self.first[vehicle]
    }

    /// Successor of a visited node.
    pub fn next(&self, node: usize) -> Option<usize> {
        self.next.get(node).copied().flatten()
    }
}

/// Outcome of one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStatus {
    Success(Assignment),
    NoSolutionFound,
    TimeLimitReached,
}

/// Anything able to solve a [`SearchProblem`].
pub trait SearchEngine {
    fn search(&self, problem: &SearchProblem<'_>, parameters: &SearchParameters) -> SearchStatus;
}

/// Wall-clock budget shared by construction and local search.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    pub fn after(limit: Option<Duration>) -> Self {
        Self(limit.map(|limit| Instant::now() + limit))
    }

    pub fn expired(&self) -> bool {
        self.0.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Built-in engine: a first-solution heuristic optionally followed by
/// greedy local search.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutingEngine;

impl SearchEngine for RoutingEngine {
    fn search(&self, problem: &SearchProblem<'_>, parameters: &SearchParameters) -> SearchStatus {
        let deadline = Deadline::after(parameters.time_limit);

        let first = match parameters.first_solution_strategy {
            FirstSolutionStrategy::PathCheapestArc => construction::path_cheapest_arc(problem, &deadline),
            FirstSolutionStrategy::ParallelCheapestInsertion => {
                construction::parallel_cheapest_insertion(problem, &deadline)
            }
        };
        let mut routes = match first {
            Ok(routes) => routes,
            Err(status) => return status,
        };

        if parameters.local_search == LocalSearchMetaheuristic::GreedyDescent {
            let rounds = local_search::greedy_descent(
                problem,
                &mut routes,
                parameters.local_search_iterations,
                &deadline,
            );
            debug!(rounds, "local search finished");
        }

        SearchStatus::Success(Assignment::from_routes(problem.node_count, problem.depot, &routes))
    }
}
