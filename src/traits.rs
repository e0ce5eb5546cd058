//! Collaborator traits for the planning pipeline.
//!
//! These sit at the edges of the core: the planner only needs an address
//! resolver and something that measures travel distances between stops.
//! Concrete adapters live in `google`, `osrm` and `haversine`.

use crate::error::PlannerError;
use crate::stop::Stop;

/// Resolves free-text addresses into stops.
pub trait Geocoder {
    /// Returns [`PlannerError::AddressNotFound`] when nothing matches.
    fn resolve(&self, address: &str) -> Result<Stop, PlannerError>;
}

/// Distances in meters for one origin, in destination order.
///
/// `None` means the service had no usable distance for that pair.
pub type MeasuredRow = Vec<Option<u64>>;

/// Measures travel distances between origin and destination stops.
///
/// One call returns one row per origin, each row holding one element per
/// destination. Callers keep `origins.len() * destinations.len()` within the
/// service quota; see [`crate::matrix::build_raw_matrix`].
pub trait DistanceMeasurer {
    fn measure(&self, origins: &[Stop], destinations: &[Stop]) -> Result<Vec<MeasuredRow>, PlannerError>;
}

impl<T: Geocoder + ?Sized> Geocoder for &T {
    fn resolve(&self, address: &str) -> Result<Stop, PlannerError> {
        (**self).resolve(address)
    }
}

impl<T: DistanceMeasurer + ?Sized> DistanceMeasurer for &T {
    fn measure(&self, origins: &[Stop], destinations: &[Stop]) -> Result<Vec<MeasuredRow>, PlannerError> {
        (**self).measure(origins, destinations)
    }
}
