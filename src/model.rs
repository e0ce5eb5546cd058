//! Routing model construction.
//!
//! Wraps a normalized cost matrix with the fleet parameters and exposes it
//! to a search engine as a [`SearchProblem`].

use tracing::debug;

use crate::config::FleetConfig;
use crate::error::PlannerError;
use crate::matrix::CostMatrix;
use crate::search::SearchProblem;

/// Name of the cumulative distance dimension.
pub const DISTANCE_DIMENSION: &str = "distance";

/// A cumulative resource accumulated along each route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    /// Maximum waiting allowed between consecutive stops.
    pub slack_max: i64,
    /// Per-vehicle upper bound on the cumulative value.
    pub capacity: i64,
    pub fix_start_cumul_to_zero: bool,
}

impl Dimension {
    /// Distance dimension: no slack, starts at zero, capped per vehicle.
    pub fn distance(capacity: i64) -> Self {
        Self {
            name: DISTANCE_DIMENSION.to_string(),
            slack_max: 0,
            capacity,
            fix_start_cumul_to_zero: true,
        }
    }
}

/// A multi-vehicle routing problem over a cost matrix.
#[derive(Debug, Clone)]
pub struct RoutingModel {
    cost_matrix: CostMatrix,
    vehicle_count: usize,
    depot_index: usize,
    distance: Dimension,
    span_coefficient: i64,
}

impl RoutingModel {
    /// Builds the model, rejecting fleets that cannot start at the depot.
    pub fn new(cost_matrix: CostMatrix, fleet: &FleetConfig) -> Result<Self, PlannerError> {
        if cost_matrix.is_empty() {
            return Err(PlannerError::InvalidModel("cost matrix has no nodes".to_string()));
        }
        if fleet.vehicle_count == 0 {
            return Err(PlannerError::InvalidModel("at least one vehicle is required".to_string()));
        }
        if fleet.depot_index >= cost_matrix.size() {
            return Err(PlannerError::InvalidModel(format!(
                "depot {} is outside a {}-node matrix",
                fleet.depot_index,
                cost_matrix.size()
            )));
        }
        if fleet.max_route_distance < 0 {
            return Err(PlannerError::InvalidModel(format!(
                "max route distance {} is negative",
                fleet.max_route_distance
            )));
        }
        if fleet.span_coefficient < 0 {
            return Err(PlannerError::InvalidModel(format!(
                "span coefficient {} is negative",
                fleet.span_coefficient
            )));
        }

        debug!(
            nodes = cost_matrix.size(),
            vehicles = fleet.vehicle_count,
            depot = fleet.depot_index,
            max_route_distance = fleet.max_route_distance,
            span_coefficient = fleet.span_coefficient,
            "built routing model"
        );

        Ok(Self {
            cost_matrix,
            vehicle_count: fleet.vehicle_count,
            depot_index: fleet.depot_index,
            distance: Dimension::distance(fleet.max_route_distance),
            span_coefficient: fleet.span_coefficient,
        })
    }

    /// Validates raw rows into a [`CostMatrix`] first.
    pub fn from_rows(rows: Vec<Vec<i64>>, fleet: &FleetConfig) -> Result<Self, PlannerError> {
        Self::new(CostMatrix::from_rows(rows)?, fleet)
    }

    pub fn node_count(&self) -> usize {
        self.cost_matrix.size()
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicle_count
    }

    pub fn depot_index(&self) -> usize {
        self.depot_index
    }

    pub fn cost_matrix(&self) -> &CostMatrix {
        &self.cost_matrix
    }

    pub fn distance_dimension(&self) -> &Dimension {
        &self.distance
    }

    pub fn span_coefficient(&self) -> i64 {
        self.span_coefficient
    }

    /// Cost of travelling directly from one node to another.
    pub fn arc_cost(&self, from: usize, to: usize) -> i64 {
        self.cost_matrix.get(from, to)
    }

    /// Declares the problem to a search engine.
    pub fn search_problem(&self) -> SearchProblem<'_> {
        SearchProblem {
            node_count: self.node_count(),
            vehicle_count: self.vehicle_count,
            depot: self.depot_index,
            arc_cost: Box::new(move |from, to| self.arc_cost(from, to)),
            dimension: &self.distance,
            span_coefficient: self.span_coefficient,
        }
    }
}
