//! First-solution heuristics.
//!
//! Both return per-vehicle visit sequences with the depot left out, or the
//! [`SearchStatus`] explaining why no complete assignment was built.

use tracing::debug;

use super::{Deadline, SearchProblem, SearchStatus};

/// Builds routes one vehicle at a time.
///
/// The current vehicle keeps following the cheapest arc from its last node
/// to an unvisited node, provided the route can still return to the depot
/// within capacity, either directly or through one more unvisited node.
/// Ties go to the lowest node index. When no extension fits, the vehicle
/// closes its route and the next one starts.
pub fn path_cheapest_arc(
    problem: &SearchProblem<'_>,
    deadline: &Deadline,
) -> Result<Vec<Vec<usize>>, SearchStatus> {
    if !problem.is_well_formed() {
        return Err(SearchStatus::NoSolutionFound);
    }

    let mut visited = vec![false; problem.node_count];
    visited[problem.depot] = true;
    let mut remaining = problem.node_count - 1;
    let mut routes = vec![Vec::new(); problem.vehicle_count];

    for route in routes.iter_mut() {
        if remaining == 0 {
            break;
        }

        let mut current = problem.depot;
        let mut cumul: i64 = 0;
        loop {
            if deadline.expired() {
                return Err(SearchStatus::TimeLimitReached);
            }

            let mut best: Option<(i64, usize)> = None;
            for node in 0..problem.node_count {
                if visited[node] {
                    continue;
                }
                let Some(arc) = problem.arc(current, node) else {
                    continue;
                };
                if !can_return(problem, &visited, node, cumul.saturating_add(arc)) {
                    continue;
                }
                if best.is_none_or(|(best_arc, _)| arc < best_arc) {
                    best = Some((arc, node));
                }
            }

            let Some((arc, node)) = best else {
                if current != problem.depot && problem.arc(current, problem.depot).is_none() {
                    return Err(SearchStatus::NoSolutionFound);
                }
                break;
            };
            route.push(node);
            visited[node] = true;
            remaining -= 1;
            cumul = cumul.saturating_add(arc);
            current = node;
        }
    }

    if remaining > 0 {
        debug!(remaining, "path cheapest arc left nodes unvisited");
        return Err(SearchStatus::NoSolutionFound);
    }
    Ok(routes)
}

/// Whether a route standing at `node` with distance `cumul` can still reach
/// the depot within capacity, directly or via one unvisited node.
fn can_return(problem: &SearchProblem<'_>, visited: &[bool], node: usize, cumul: i64) -> bool {
    let fits = |via: usize, cost: i64| {
        problem
            .arc(via, problem.depot)
            .is_some_and(|back| problem.within_capacity(cost.saturating_add(back)))
    };
    if fits(node, cumul) {
        return true;
    }
    (0..problem.node_count)
        .filter(|&other| other != node && !visited[other])
        .any(|other| problem.arc(node, other).is_some_and(|hop| fits(other, cumul.saturating_add(hop))))
}

/// Builds all routes together by cheapest insertion.
///
/// Every step evaluates each unassigned node at each position of each
/// route and applies the feasible insertion with the smallest objective
/// increase (added distance plus span coefficient times growth of the
/// longest route). If insertion gets stuck, for instance on a stop that can
/// only be reached between two others already placed on different
/// vehicles, the routes are rebuilt with [`path_cheapest_arc`].
pub fn parallel_cheapest_insertion(
    problem: &SearchProblem<'_>,
    deadline: &Deadline,
) -> Result<Vec<Vec<usize>>, SearchStatus> {
    if !problem.is_well_formed() {
        return Err(SearchStatus::NoSolutionFound);
    }

    let mut routes: Vec<Vec<usize>> = vec![Vec::new(); problem.vehicle_count];
    let mut lengths: Vec<i64> = Vec::with_capacity(problem.vehicle_count);
    for _ in 0..problem.vehicle_count {
        let empty = problem.route_distance(&[]).unwrap_or(0);
        lengths.push(empty);
    }
    let mut unassigned: Vec<usize> = (0..problem.node_count).filter(|&node| node != problem.depot).collect();

    while !unassigned.is_empty() {
        if deadline.expired() {
            return Err(SearchStatus::TimeLimitReached);
        }

        let current_objective = problem.objective(&lengths);
        // (delta, slot in unassigned, vehicle, position, new length)
        let mut best: Option<(i64, usize, usize, usize, i64)> = None;

        for (slot, &node) in unassigned.iter().enumerate() {
            for (vehicle, route) in routes.iter().enumerate() {
                for position in 0..=route.len() {
                    let prev = if position == 0 { problem.depot } else { route[position - 1] };
                    let next = if position == route.len() { problem.depot } else { route[position] };

                    let (Some(into), Some(out)) = (problem.arc(prev, node), problem.arc(node, next)) else {
                        continue;
                    };
                    let removed = problem.arc(prev, next).unwrap_or(0);
                    let new_length = lengths[vehicle]
                        .saturating_sub(removed)
                        .saturating_add(into)
                        .saturating_add(out);
                    if !problem.within_capacity(new_length) {
                        continue;
                    }

                    let mut candidate = lengths.clone();
                    candidate[vehicle] = new_length;
                    let delta = problem.objective(&candidate).saturating_sub(current_objective);
                    if best.is_none_or(|(best_delta, ..)| delta < best_delta) {
                        best = Some((delta, slot, vehicle, position, new_length));
                    }
                }
            }
        }

        let Some((_, slot, vehicle, position, new_length)) = best else {
            debug!(remaining = unassigned.len(), "insertion stuck, rebuilding with path cheapest arc");
            return path_cheapest_arc(problem, deadline);
        };
        let node = unassigned.remove(slot);
        routes[vehicle].insert(position, node);
        lengths[vehicle] = new_length;
    }

    Ok(routes)
}
