//! Resolved stop type.

use serde::{Deserialize, Serialize};

/// A geocoded address. Its position in a stop list is its node index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub formatted_address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Stop {
    pub fn new(formatted_address: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            formatted_address: formatted_address.into(),
            latitude,
            longitude,
        }
    }

    /// Location as (lat, lng).
    pub fn location(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}
