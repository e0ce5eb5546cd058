//! Request/response operations of the planner.
//!
//! Transport-agnostic: each operation takes a deserialized request and
//! returns a serializable response whose `status` field is either
//! `"success"` or `"error"`. An HTTP layer only has to route bodies here.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::google::{GoogleMapsClient, GoogleMapsConfig};
use crate::matrix::{CostMatrix, build_cost_matrix};
use crate::model::RoutingModel;
use crate::search::{RoutingEngine, SearchEngine};
use crate::solver::{SolveOutcome, solve_with};
use crate::stop::Stop;
use crate::traits::{DistanceMeasurer, Geocoder};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateAddressRequest {
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ValidateAddressResponse {
    Success { validated_address: Stop },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateDistanceMatrixRequest {
    pub new_address: Stop,
    #[serde(default)]
    pub addresses: Vec<Stop>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UpdateDistanceMatrixResponse {
    Success {
        distance_matrix: CostMatrix,
        addresses: Vec<Stop>,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculateRoutesRequest {
    /// Rows of kilometer costs; `null` marks an unreachable pair.
    pub distance_matrix: Vec<Vec<Option<i64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CalculateRoutesResponse {
    Success {
        routes: Vec<Vec<usize>>,
        route_distances: Vec<i64>,
        total_distance: i64,
    },
    Error {
        message: String,
    },
}

/// Origin, destination and intermediate stops of one route, in travel order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDirections {
    pub origin: String,
    pub destination: String,
    pub waypoints: Vec<String>,
}

/// Everything produced by [`Planner::plan`].
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub stops: Vec<Stop>,
    pub cost_matrix: CostMatrix,
    pub outcome: SolveOutcome,
}

pub const ADDRESS_NOT_VALIDATED: &str = "Address could not be validated.";
pub const ROUTES_NOT_CALCULATED: &str = "Could not calculate routes.";

/// The planning pipeline wired to its collaborators.
#[derive(Debug, Clone)]
pub struct Planner<G, M, E = RoutingEngine> {
    geocoder: G,
    measurer: M,
    engine: E,
    config: PlannerConfig,
}

impl<G, M> Planner<G, M, RoutingEngine>
where
    G: Geocoder,
    M: DistanceMeasurer + Sync,
{
    pub fn new(geocoder: G, measurer: M, config: PlannerConfig) -> Self {
        Self {
            geocoder,
            measurer,
            engine: RoutingEngine,
            config,
        }
    }
}

impl Planner<GoogleMapsClient, GoogleMapsClient, RoutingEngine> {
    /// Uses Google Maps for both geocoding and distance measurement.
    pub fn google(maps: GoogleMapsConfig, config: PlannerConfig) -> Result<Self, PlannerError> {
        config.validate()?;
        let client = GoogleMapsClient::new(maps)?;
        Ok(Self::new(client.clone(), client, config))
    }
}

impl<G, M, E> Planner<G, M, E>
where
    G: Geocoder,
    M: DistanceMeasurer + Sync,
    E: SearchEngine,
{
    /// Swaps the search engine.
    pub fn with_engine<F: SearchEngine>(self, engine: F) -> Planner<G, M, F> {
        Planner {
            geocoder: self.geocoder,
            measurer: self.measurer,
            engine,
            config: self.config,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Resolves one free-text address.
    pub fn validate_address(&self, request: &ValidateAddressRequest) -> ValidateAddressResponse {
        match self.geocoder.resolve(&request.address) {
            Ok(stop) => ValidateAddressResponse::Success { validated_address: stop },
            Err(err) => {
                warn!(address = %request.address, error = %err, "address validation failed");
                ValidateAddressResponse::Error {
                    message: ADDRESS_NOT_VALIDATED.to_string(),
                }
            }
        }
    }

    /// Appends a stop and rebuilds the full cost matrix.
    pub fn update_distance_matrix(&self, request: UpdateDistanceMatrixRequest) -> UpdateDistanceMatrixResponse {
        let mut addresses = request.addresses;
        addresses.push(request.new_address);

        match build_cost_matrix(&addresses, &self.config.matrix, &self.measurer) {
            Ok(distance_matrix) => UpdateDistanceMatrixResponse::Success {
                distance_matrix,
                addresses,
            },
            Err(err) => {
                warn!(stops = addresses.len(), error = %err, "distance matrix update failed");
                UpdateDistanceMatrixResponse::Error {
                    message: err.to_string(),
                }
            }
        }
    }

    /// Solves the routing problem for a given cost matrix.
    pub fn calculate_routes(&self, request: CalculateRoutesRequest) -> CalculateRoutesResponse {
        let outcome = CostMatrix::try_from(request.distance_matrix).and_then(|matrix| self.solve(matrix));

        match outcome {
            Ok(SolveOutcome::Solved(solution)) => CalculateRoutesResponse::Success {
                routes: solution.routes,
                route_distances: solution.route_distances,
                total_distance: solution.total_distance,
            },
            Ok(SolveOutcome::Infeasible(reason)) => {
                info!(?reason, "no route plan");
                CalculateRoutesResponse::Error {
                    message: ROUTES_NOT_CALCULATED.to_string(),
                }
            }
            Err(err) => {
                warn!(error = %err, "route calculation failed");
                CalculateRoutesResponse::Error {
                    message: ROUTES_NOT_CALCULATED.to_string(),
                }
            }
        }
    }

    /// Runs the whole pipeline for free-text addresses; the first one is the depot
    /// unless the fleet config says otherwise.
    pub fn plan<S: AsRef<str>>(&self, addresses: &[S]) -> Result<Plan, PlannerError> {
        let stops = addresses
            .iter()
            .map(|address| self.geocoder.resolve(address.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let cost_matrix = build_cost_matrix(&stops, &self.config.matrix, &self.measurer)?;
        let outcome = self.solve(cost_matrix.clone())?;

        Ok(Plan {
            stops,
            cost_matrix,
            outcome,
        })
    }

    fn solve(&self, matrix: CostMatrix) -> Result<SolveOutcome, PlannerError> {
        let model = RoutingModel::new(matrix, &self.config.fleet)?;
        solve_with(&model, &self.config.search, &self.engine)
    }
}

/// Directions for one solved route over the stop list it was planned from.
///
/// Returns `None` for a route that never leaves the depot or references an
/// unknown stop.
pub fn directions_for_route(stops: &[Stop], route: &[usize]) -> Option<RouteDirections> {
    if route.len() <= 2 {
        return None;
    }
    let addresses = route
        .iter()
        .map(|&node| stops.get(node).map(|stop| stop.formatted_address.clone()))
        .collect::<Option<Vec<_>>>()?;

    let (origin, rest) = addresses.split_first()?;
    let (destination, waypoints) = rest.split_last()?;
    Some(RouteDirections {
        origin: origin.clone(),
        destination: destination.clone(),
        waypoints: waypoints.to_vec(),
    })
}
