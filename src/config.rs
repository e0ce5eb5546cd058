//! Planner configuration.
//!
//! Every component receives its settings explicitly; nothing is read from
//! process state except through [`crate::google::GoogleMapsConfig::from_env`].

use serde::{Deserialize, Serialize};

use crate::error::PlannerError;
use crate::search::SearchParameters;

/// Default element quota of one distance-matrix query.
pub const DEFAULT_MAX_ELEMENTS: usize = 100;

/// Settings for the Measurement Batcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    /// Maximum origins × destinations elements per measurement call.
    pub max_elements_per_query: usize,
    /// Dispatch batches concurrently instead of one after another.
    pub parallel: bool,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            max_elements_per_query: DEFAULT_MAX_ELEMENTS,
            parallel: false,
        }
    }
}

impl MatrixConfig {
    pub fn with_max_elements(mut self, max_elements: usize) -> Self {
        self.max_elements_per_query = max_elements;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Fleet parameters of the routing model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    pub vehicle_count: usize,
    pub depot_index: usize,
    /// Per-vehicle cap on cumulative route distance (km).
    pub max_route_distance: i64,
    /// Weight of the global span cost (longest route length).
    pub span_coefficient: i64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            vehicle_count: 4,
            depot_index: 0,
            max_route_distance: 3000,
            span_coefficient: 100,
        }
    }
}

impl FleetConfig {
    pub fn with_vehicle_count(mut self, vehicle_count: usize) -> Self {
        self.vehicle_count = vehicle_count;
        self
    }

    pub fn with_depot_index(mut self, depot_index: usize) -> Self {
        self.depot_index = depot_index;
        self
    }

    pub fn with_max_route_distance(mut self, max_route_distance: i64) -> Self {
        self.max_route_distance = max_route_distance;
        self
    }

    pub fn with_span_coefficient(mut self, span_coefficient: i64) -> Self {
        self.span_coefficient = span_coefficient;
        self
    }
}

/// Complete configuration of a [`crate::service::Planner`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub matrix: MatrixConfig,
    pub fleet: FleetConfig,
    pub search: SearchParameters,
}

impl PlannerConfig {
    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, PlannerError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.matrix.max_elements_per_query == 0 {
            return Err(PlannerError::Config(
                "max_elements_per_query must be positive".to_string(),
            ));
        }
        if self.fleet.vehicle_count == 0 {
            return Err(PlannerError::Config("vehicle_count must be at least 1".to_string()));
        }
        if self.fleet.max_route_distance < 0 {
            return Err(PlannerError::Config(
                "max_route_distance must not be negative".to_string(),
            ));
        }
        if self.fleet.span_coefficient < 0 {
            return Err(PlannerError::Config(
                "span_coefficient must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
