//! Local search operators for the built-in engine.

use super::{Deadline, SearchProblem};

/// 2-opt: reverse a segment within one route.
/// Returns true if an improvement was made.
fn two_opt_improve(
    problem: &SearchProblem<'_>,
    routes: &mut [Vec<usize>],
    lengths: &mut [i64],
    vehicle: usize,
) -> bool {
    let n = routes[vehicle].len();
    if n < 2 {
        return false;
    }

    let current = problem.objective(lengths);
    for i in 0..n - 1 {
        for j in i + 1..n {
            let mut candidate = routes[vehicle].clone();
            candidate[i..=j].reverse();

            let Some(length) = problem.route_distance(&candidate) else {
                continue;
            };
            if !problem.within_capacity(length) {
                continue;
            }

            let mut candidate_lengths = lengths.to_vec();
            candidate_lengths[vehicle] = length;
            if problem.objective(&candidate_lengths) < current {
                routes[vehicle] = candidate;
                lengths[vehicle] = length;
                return true;
            }
        }
    }

    false
}

/// Relocate: move a visit to another position, in the same route or another one.
/// Returns true if an improvement was made.
fn relocate_improve(problem: &SearchProblem<'_>, routes: &mut [Vec<usize>], lengths: &mut [i64]) -> bool {
    let current = problem.objective(lengths);

    for from_route in 0..routes.len() {
        for visit_idx in 0..routes[from_route].len() {
            let visit = routes[from_route][visit_idx];

            for to_route in 0..routes.len() {
                let mut from_candidate = routes[from_route].clone();
                from_candidate.remove(visit_idx);

                let insert_positions = if from_route == to_route {
                    from_candidate.len() + 1
                } else {
                    routes[to_route].len() + 1
                };

                for insert_pos in 0..insert_positions {
                    // Same slot it came from
                    if from_route == to_route && insert_pos == visit_idx {
                        continue;
                    }

                    let mut to_candidate = if from_route == to_route {
                        from_candidate.clone()
                    } else {
                        routes[to_route].clone()
                    };
                    to_candidate.insert(insert_pos, visit);

                    let Some(to_length) = problem.route_distance(&to_candidate) else {
                        continue;
                    };
                    if !problem.within_capacity(to_length) {
                        continue;
                    }

                    let mut candidate_lengths = lengths.to_vec();
                    candidate_lengths[to_route] = to_length;

                    if from_route != to_route {
                        let Some(from_length) = problem.route_distance(&from_candidate) else {
                            continue;
                        };
                        if !problem.within_capacity(from_length) {
                            continue;
                        }
                        candidate_lengths[from_route] = from_length;
                    }

                    if problem.objective(&candidate_lengths) < current {
                        if from_route != to_route {
                            routes[from_route] = from_candidate;
                        }
                        routes[to_route] = to_candidate;
                        lengths.copy_from_slice(&candidate_lengths);
                        return true;
                    }
                }
            }
        }
    }

    false
}

/// Run local search improvement until no more improvements, the round limit
/// or the deadline. Returns the number of rounds run.
///
/// Only moves keeping every route within capacity and lowering the
/// objective are applied, so a feasible input stays feasible.
pub fn greedy_descent(
    problem: &SearchProblem<'_>,
    routes: &mut [Vec<usize>],
    max_rounds: usize,
    deadline: &Deadline,
) -> usize {
    let mut lengths: Vec<i64> = routes
        .iter()
        .map(|route| problem.route_distance(route).unwrap_or(i64::MAX))
        .collect();

    let mut rounds = 0;
    while rounds < max_rounds && !deadline.expired() {
        rounds += 1;
        let mut improved = false;

        // Try 2-opt on each route
        for vehicle in 0..routes.len() {
            if two_opt_improve(problem, routes, &mut lengths, vehicle) {
                improved = true;
            }
        }

        // Try relocate moves between routes
        if relocate_improve(problem, routes, &mut lengths) {
            improved = true;
        }

        if !improved {
            break;
        }
    }

    rounds
}
