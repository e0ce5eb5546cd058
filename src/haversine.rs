//! Haversine distance measurer (offline fallback when no routing service is
//! reachable).
//!
//! Uses great-circle distance scaled by a detour factor to approximate road
//! distance. Less accurate than a road network but never fails.

use crate::error::PlannerError;
use crate::stop::Stop;
use crate::traits::{DistanceMeasurer, MeasuredRow};

/// Road distance is typically 20-40% longer than the straight line.
const DEFAULT_DETOUR_FACTOR: f64 = 1.3;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two (lat, lng) pairs.
pub fn great_circle_meters((from_lat, from_lng): (f64, f64), (to_lat, to_lng): (f64, f64)) -> f64 {
    let phi_from = from_lat.to_radians();
    let phi_to = to_lat.to_radians();
    let half_dphi = (to_lat - from_lat).to_radians() / 2.0;
    let half_dlambda = (to_lng - from_lng).to_radians() / 2.0;

    let h = half_dphi.sin().powi(2) + phi_from.cos() * phi_to.cos() * half_dlambda.sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Straight-line distance stretched by a detour factor to approximate roads.
#[derive(Debug, Clone)]
pub struct HaversineMeasurer {
    pub detour_factor: f64,
}

impl Default for HaversineMeasurer {
    fn default() -> Self {
        Self::new(DEFAULT_DETOUR_FACTOR)
    }
}

impl HaversineMeasurer {
    pub fn new(detour_factor: f64) -> Self {
        Self { detour_factor }
    }

    fn road_meters(&self, from: &Stop, to: &Stop) -> u64 {
        (great_circle_meters(from.location(), to.location()) * self.detour_factor).round() as u64
    }
}

impl DistanceMeasurer for HaversineMeasurer {
    fn measure(&self, origins: &[Stop], destinations: &[Stop]) -> Result<Vec<MeasuredRow>, PlannerError> {
        Ok(origins
            .iter()
            .map(|from| {
                destinations
                    .iter()
                    .map(|to| Some(self.road_meters(from, to)))
                    .collect()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(lat: f64, lng: f64) -> Stop {
        Stop::new(format!("{},{}", lat, lng), lat, lng)
    }

    #[test]
    fn test_great_circle_zero_for_same_stop() {
        assert_eq!(great_circle_meters((36.1126, -115.1767), (36.1126, -115.1767)), 0.0);
    }

    #[test]
    fn test_great_circle_one_degree_of_latitude() {
        // A degree of latitude is about 111.2 km anywhere on the sphere.
        let meters = great_circle_meters((36.0, -115.0), (37.0, -115.0));
        assert!((meters - 111_195.0).abs() < 100.0, "got {}", meters);
    }

    #[test]
    fn test_measure_shape_and_diagonal() {
        let measurer = HaversineMeasurer::default();
        let stops = vec![stop(36.1, -115.1), stop(36.2, -115.2), stop(36.3, -115.3)];
        let rows = measurer.measure(&stops[..2], &stops).unwrap();

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.len() == 3));
        assert_eq!(rows[0][0], Some(0));
        assert_eq!(rows[1][1], Some(0));
        assert_eq!(rows[0][1], rows[1][0]);
    }

    #[test]
    fn test_detour_factor_scales_distance() {
        let a = stop(36.1, -115.1);
        let b = stop(36.2, -115.2);
        let straight = HaversineMeasurer::new(1.0).road_meters(&a, &b);
        let detoured = HaversineMeasurer::new(2.0).road_meters(&a, &b);
        assert!(detoured.abs_diff(straight * 2) <= 1);
    }
}
