//! Request/response operations, end to end with fixture collaborators.

mod fixtures;

use route_planner::config::{FleetConfig, PlannerConfig};
use route_planner::haversine::HaversineMeasurer;
use route_planner::search::{Assignment, SearchEngine, SearchParameters, SearchProblem, SearchStatus};
use route_planner::service::{
    ADDRESS_NOT_VALIDATED, CalculateRoutesRequest, CalculateRoutesResponse, Planner, ROUTES_NOT_CALCULATED,
    UpdateDistanceMatrixRequest, UpdateDistanceMatrixResponse, ValidateAddressRequest, ValidateAddressResponse,
    directions_for_route,
};
use route_planner::solver::SolveOutcome;

use fixtures::{FailingMeasurer, FixtureGeocoder, TableMeasurer, las_vegas_stops};

fn planner() -> Planner<FixtureGeocoder, HaversineMeasurer> {
    Planner::new(FixtureGeocoder::las_vegas(), HaversineMeasurer::default(), PlannerConfig::default())
}

#[test]
fn test_validate_known_address() {
    let response = planner().validate_address(&ValidateAddressRequest {
        address: "Bellagio".to_string(),
    });

    match response {
        ValidateAddressResponse::Success { validated_address } => {
            assert!(validated_address.formatted_address.starts_with("3600 S Las Vegas Blvd"));
            assert_eq!(validated_address.location(), (36.1126, -115.1767));
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[test]
fn test_validate_unknown_address() {
    let response = planner().validate_address(&ValidateAddressRequest {
        address: "1 Nowhere Lane".to_string(),
    });
    assert_eq!(
        response,
        ValidateAddressResponse::Error {
            message: ADDRESS_NOT_VALIDATED.to_string()
        }
    );
}

#[test]
fn test_update_distance_matrix_appends_stop() {
    let stops = las_vegas_stops(4);
    let request = UpdateDistanceMatrixRequest {
        new_address: stops[3].clone(),
        addresses: stops[..3].to_vec(),
    };

    match planner().update_distance_matrix(request) {
        UpdateDistanceMatrixResponse::Success {
            distance_matrix,
            addresses,
        } => {
            assert_eq!(addresses, stops);
            assert_eq!(distance_matrix.size(), 4);
            assert!(distance_matrix.is_symmetric());
            assert!(distance_matrix.get(0, 1) > 0);
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[test]
fn test_update_distance_matrix_reports_measurement_failure() {
    let planner = Planner::new(FixtureGeocoder::las_vegas(), FailingMeasurer, PlannerConfig::default());
    let stops = las_vegas_stops(2);
    let response = planner.update_distance_matrix(UpdateDistanceMatrixRequest {
        new_address: stops[1].clone(),
        addresses: vec![stops[0].clone()],
    });
    assert!(matches!(response, UpdateDistanceMatrixResponse::Error { .. }));
}

#[test]
fn test_calculate_routes_json_round_trip() {
    let request: CalculateRoutesRequest = serde_json::from_str(
        r#"{"distance_matrix": [[0,10,15,20,25],[10,0,35,25,30],[15,35,0,30,20],[20,25,30,0,15],[25,30,20,15,0]]}"#,
    )
    .unwrap();

    let response = planner().calculate_routes(request);
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["status"], "success");
    assert_eq!(json["routes"].as_array().unwrap().len(), 4);
    let per_route: i64 = json["route_distances"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d.as_i64().unwrap())
        .sum();
    assert_eq!(json["total_distance"].as_i64().unwrap(), per_route);
}

#[test]
fn test_calculate_routes_infeasible_is_error_status() {
    let config = PlannerConfig {
        fleet: FleetConfig::default().with_max_route_distance(1),
        ..PlannerConfig::default()
    };
    let planner = Planner::new(FixtureGeocoder::las_vegas(), HaversineMeasurer::default(), config);

    let response = planner.calculate_routes(CalculateRoutesRequest {
        distance_matrix: vec![vec![Some(0), Some(5)], vec![Some(5), Some(0)]],
    });

    assert_eq!(
        response,
        CalculateRoutesResponse::Error {
            message: ROUTES_NOT_CALCULATED.to_string()
        }
    );
}

#[test]
fn test_calculate_routes_rejects_non_square_matrix() {
    let response = planner().calculate_routes(CalculateRoutesRequest {
        distance_matrix: vec![vec![Some(0), Some(5)], vec![Some(5)]],
    });
    assert!(matches!(response, CalculateRoutesResponse::Error { .. }));
}

#[test]
fn test_calculate_routes_rejects_non_zero_diagonal() {
    for diagonal in [Some(7), None] {
        let response = planner().calculate_routes(CalculateRoutesRequest {
            distance_matrix: vec![vec![diagonal, Some(5)], vec![Some(5), diagonal]],
        });
        assert_eq!(
            response,
            CalculateRoutesResponse::Error {
                message: ROUTES_NOT_CALCULATED.to_string()
            },
            "diagonal {:?}",
            diagonal
        );
    }
}

#[test]
fn test_plan_end_to_end() {
    let planner = planner();
    let plan = planner
        .plan(&["wynn", "mgm grand", "bellagio", "caesars", "longhorn", "brooklyn bowl"])
        .unwrap();

    assert_eq!(plan.stops.len(), 6);
    assert_eq!(plan.cost_matrix.size(), 6);
    let solution = match &plan.outcome {
        SolveOutcome::Solved(solution) => solution,
        SolveOutcome::Infeasible(reason) => panic!("unexpected {:?}", reason),
    };
    assert_eq!(solution.routes.len(), planner.config().fleet.vehicle_count);

    for route in solution.used_routes() {
        let directions = directions_for_route(&plan.stops, route).unwrap();
        assert_eq!(directions.origin, plan.stops[0].formatted_address);
        assert_eq!(directions.destination, plan.stops[0].formatted_address);
        assert_eq!(directions.waypoints.len(), route.len() - 2);
    }
}

#[test]
fn test_plan_stops_on_unknown_address() {
    let err = planner().plan(&["wynn", "atlantis"]).unwrap_err();
    assert!(matches!(err, route_planner::PlannerError::AddressNotFound(address) if address == "atlantis"));
}

#[test]
fn test_plan_uses_measured_table() {
    let stops = las_vegas_stops(3);
    let measurer = TableMeasurer::new(
        &stops,
        vec![
            vec![Some(0), Some(4000), Some(6000)],
            vec![Some(4000), Some(0), Some(3000)],
            vec![Some(6000), Some(3000), Some(0)],
        ],
    );
    let config = PlannerConfig {
        fleet: FleetConfig::default().with_vehicle_count(1),
        ..PlannerConfig::default()
    };
    let planner = Planner::new(FixtureGeocoder::las_vegas(), &measurer, config);

    let plan = planner.plan(&["wynn", "mgm grand", "bellagio"]).unwrap();

    assert_eq!(measurer.calls(), 1);
    let solution = plan.outcome.solution().unwrap();
    assert_eq!(solution.routes, vec![vec![0, 1, 2, 0]]);
    assert_eq!(solution.total_distance, 4 + 3 + 6);
}

/// Sends every stop on its own vehicle trip, in index order.
struct RoundRobinEngine;

impl SearchEngine for RoundRobinEngine {
    fn search(&self, problem: &SearchProblem<'_>, _parameters: &SearchParameters) -> SearchStatus {
        let mut routes = vec![Vec::new(); problem.vehicle_count];
        let nodes = (0..problem.node_count).filter(|&node| node != problem.depot);
        for (i, node) in nodes.enumerate() {
            routes[i % problem.vehicle_count].push(node);
        }
        SearchStatus::Success(Assignment::from_routes(problem.node_count, problem.depot, &routes))
    }
}

#[test]
fn test_custom_engine_is_pluggable() {
    let planner = planner().with_engine(RoundRobinEngine);
    let response = planner.calculate_routes(CalculateRoutesRequest {
        distance_matrix: vec![
            vec![Some(0), Some(1), Some(1)],
            vec![Some(1), Some(0), Some(1)],
            vec![Some(1), Some(1), Some(0)],
        ],
    });

    assert_eq!(
        response,
        CalculateRoutesResponse::Success {
            routes: vec![vec![0, 1, 0], vec![0, 2, 0], vec![0, 0], vec![0, 0]],
            route_distances: vec![2, 2, 0, 0],
            total_distance: 4,
        }
    );
}
