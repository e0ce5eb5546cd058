//! Solver driver.
//!
//! Runs a search engine on a [`RoutingModel`] and turns the resulting
//! successor assignment into per-vehicle routes with their distances.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::PlannerError;
use crate::matrix::CostMatrix;
use crate::model::RoutingModel;
use crate::search::{Assignment, RoutingEngine, SearchEngine, SearchParameters, SearchProblem, SearchStatus};

/// A complete route plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    /// One node sequence per vehicle, starting and ending at the depot.
    pub routes: Vec<Vec<usize>>,
    pub route_distances: Vec<i64>,
    pub total_distance: i64,
    /// Longest single route.
    pub max_route_distance: i64,
    /// Total distance plus span cost, as minimized by the engine.
    pub objective: i64,
}

impl Solution {
    /// Routes that leave the depot.
    pub fn used_routes(&self) -> impl Iterator<Item = &Vec<usize>> {
        self.routes.iter().filter(|route| route.len() > 2)
    }
}

/// Why no plan was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfeasibleReason {
    /// No assignment satisfies the distance cap with the available vehicles.
    NoFeasibleAssignment,
    /// The search budget ran out before an assignment was complete.
    TimeLimitReached,
}

/// Result of a solve: a full plan or an explicit infeasibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    Solved(Solution),
    Infeasible(InfeasibleReason),
}

impl SolveOutcome {
    pub fn solution(&self) -> Option<&Solution> {
        match self {
            SolveOutcome::Solved(solution) => Some(solution),
            SolveOutcome::Infeasible(_) => None,
        }
    }

    pub fn into_solution(self) -> Option<Solution> {
        match self {
            SolveOutcome::Solved(solution) => Some(solution),
            SolveOutcome::Infeasible(_) => None,
        }
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, SolveOutcome::Infeasible(_))
    }
}

/// Solves `model` with the built-in [`RoutingEngine`].
pub fn solve(model: &RoutingModel, parameters: &SearchParameters) -> Result<SolveOutcome, PlannerError> {
    solve_with(model, parameters, &RoutingEngine)
}

/// Solves `model` with any search engine.
///
/// Errors only when the engine hands back an assignment that does not form
/// valid routes; running out of options is [`SolveOutcome::Infeasible`].
pub fn solve_with<E>(
    model: &RoutingModel,
    parameters: &SearchParameters,
    engine: &E,
) -> Result<SolveOutcome, PlannerError>
where
    E: SearchEngine + ?Sized,
{
    let problem = model.search_problem();
    let started_at = Instant::now();
    let status = engine.search(&problem, parameters);
    let elapsed_ms = started_at.elapsed().as_millis() as u64;

    match status {
        SearchStatus::Success(assignment) => {
            let solution = extract_solution(model, &problem, &assignment)?;
            info!(
                total_distance = solution.total_distance,
                routes_used = solution.used_routes().count(),
                elapsed_ms,
                "routes computed"
            );
            Ok(SolveOutcome::Solved(solution))
        }
        SearchStatus::NoSolutionFound => {
            warn!(elapsed_ms, "no feasible assignment");
            Ok(SolveOutcome::Infeasible(InfeasibleReason::NoFeasibleAssignment))
        }
        SearchStatus::TimeLimitReached => {
            warn!(elapsed_ms, "search time limit reached before a complete assignment");
            Ok(SolveOutcome::Infeasible(InfeasibleReason::TimeLimitReached))
        }
    }
}

/// Walks every vehicle from the depot back to the depot, summing arc costs.
fn extract_solution(
    model: &RoutingModel,
    problem: &SearchProblem<'_>,
    assignment: &Assignment,
) -> Result<Solution, PlannerError> {
    if assignment.vehicle_count() != model.vehicle_count() {
        return Err(PlannerError::InvalidAssignment(format!(
            "{} routes for {} vehicles",
            assignment.vehicle_count(),
            model.vehicle_count()
        )));
    }

    let node_count = model.node_count();
    let depot = model.depot_index();
    let capacity = model.distance_dimension().capacity;
    let mut visited = vec![false; node_count];
    let mut routes = Vec::with_capacity(model.vehicle_count());
    let mut route_distances = Vec::with_capacity(model.vehicle_count());

    for vehicle in 0..model.vehicle_count() {
        let mut route = vec![depot];
        let mut route_distance: i64 = 0;
        let mut index = depot;
        let mut next = assignment.first(vehicle);

        loop {
            if next >= node_count {
                return Err(PlannerError::InvalidAssignment(format!(
                    "vehicle {} moves to unknown node {}",
                    vehicle, next
                )));
            }
            let cost = model.arc_cost(index, next);
            if cost == CostMatrix::UNREACHABLE {
                return Err(PlannerError::InvalidAssignment(format!(
                    "vehicle {} uses unreachable arc {} -> {}",
                    vehicle, index, next
                )));
            }
            route_distance = route_distance.saturating_add(cost);
            route.push(next);

            if next == depot {
                break;
            }
            if visited[next] {
                return Err(PlannerError::InvalidAssignment(format!("node {} is visited twice", next)));
            }
            visited[next] = true;
            index = next;
            next = assignment.next(index).ok_or_else(|| {
                PlannerError::InvalidAssignment(format!("node {} has no successor", index))
            })?;
        }

        if route_distance > capacity {
            return Err(PlannerError::InvalidAssignment(format!(
                "vehicle {} travels {} over a cap of {}",
                vehicle, route_distance, capacity
            )));
        }
        routes.push(route);
        route_distances.push(route_distance);
    }

    if let Some(missed) = (0..node_count).find(|&node| node != depot && !visited[node]) {
        return Err(PlannerError::InvalidAssignment(format!("node {} is not on any route", missed)));
    }

    let total_distance = route_distances.iter().fold(0i64, |acc, &d| acc.saturating_add(d));
    let max_route_distance = route_distances.iter().copied().max().unwrap_or(0);
    let objective = problem.objective(&route_distances);

    Ok(Solution {
        routes,
        route_distances,
        total_distance,
        max_route_distance,
        objective,
    })
}
