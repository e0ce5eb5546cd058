//! Google Maps adapter: geocoding and the distance-matrix service.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::PlannerError;
use crate::stop::Stop;
use crate::traits::{DistanceMeasurer, Geocoder, MeasuredRow};

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "API_KEY";

#[derive(Debug, Clone)]
pub struct GoogleMapsConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for GoogleMapsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://maps.googleapis.com/maps/api".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
        }
    }
}

impl GoogleMapsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Reads the API key from [`API_KEY_VAR`].
    pub fn from_env() -> Result<Self, PlannerError> {
        let api_key = std::env::var(API_KEY_VAR)
            .map_err(|_| PlannerError::Config(format!("{} is not set", API_KEY_VAR)))?;
        Ok(Self::new(api_key))
    }
}

#[derive(Debug, Clone)]
pub struct GoogleMapsClient {
    config: GoogleMapsConfig,
    client: reqwest::blocking::Client,
}

impl GoogleMapsClient {
    pub fn new(config: GoogleMapsConfig) -> Result<Self, PlannerError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn get<T: DeserializeOwned>(&self, service: &str, query: &[(&str, &str)]) -> Result<T, PlannerError> {
        let url = format!("{}/{}/json", self.config.base_url, service);
        let body = self
            .client
            .get(url)
            .query(query)
            .query(&[("key", self.config.api_key.as_str())])
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<T>())?;
        Ok(body)
    }
}

impl Geocoder for GoogleMapsClient {
    fn resolve(&self, address: &str) -> Result<Stop, PlannerError> {
        debug!(address, "geocoding address");
        let body: GeocodeResponse = self.get("geocode", &[("address", address)])?;
        parse_geocode(address, body)
    }
}

impl DistanceMeasurer for GoogleMapsClient {
    fn measure(&self, origins: &[Stop], destinations: &[Stop]) -> Result<Vec<MeasuredRow>, PlannerError> {
        if origins.is_empty() || destinations.is_empty() {
            return Ok(vec![Vec::new(); origins.len()]);
        }

        let origins_param = join_addresses(origins);
        let destinations_param = join_addresses(destinations);
        debug!(origins = origins.len(), destinations = destinations.len(), "requesting distance matrix");

        let body: DistanceMatrixResponse = self.get(
            "distancematrix",
            &[
                ("units", "imperial"),
                ("origins", origins_param.as_str()),
                ("destinations", destinations_param.as_str()),
            ],
        )?;
        parse_distance_matrix(body)
    }
}

/// Pipe-separated address list used by the distance-matrix service.
fn join_addresses(stops: &[Stop]) -> String {
    stops
        .iter()
        .map(|stop| stop.formatted_address.as_str())
        .collect::<Vec<_>>()
        .join("|")
}

fn parse_geocode(address: &str, body: GeocodeResponse) -> Result<Stop, PlannerError> {
    if body.status != "OK" {
        if body.status != "ZERO_RESULTS" {
            warn!(address, status = %body.status, "geocoding request was not accepted");
        }
        return Err(PlannerError::AddressNotFound(address.to_string()));
    }

    let result = body
        .results
        .into_iter()
        .next()
        .ok_or_else(|| PlannerError::AddressNotFound(address.to_string()))?;

    Ok(Stop::new(
        result.formatted_address,
        result.geometry.location.lat,
        result.geometry.location.lng,
    ))
}

fn parse_distance_matrix(body: DistanceMatrixResponse) -> Result<Vec<MeasuredRow>, PlannerError> {
    if body.status != "OK" {
        return Err(PlannerError::Measurement(format!(
            "distance matrix returned {}: {}",
            body.status,
            body.error_message.unwrap_or_default()
        )));
    }

    Ok(body
        .rows
        .into_iter()
        .map(|row| {
            row.elements
                .into_iter()
                .map(|element| element.distance.map(|distance| distance.value))
                .collect()
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<DistanceMatrixRow>,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixRow {
    elements: Vec<DistanceMatrixElement>,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixElement {
    distance: Option<Distance>,
}

#[derive(Debug, Deserialize)]
struct Distance {
    value: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_geocode_ok() {
        let body: GeocodeResponse = serde_json::from_str(
            r#"{
                "status": "OK",
                "results": [{
                    "formatted_address": "3600 S Las Vegas Blvd, Las Vegas, NV 89109, USA",
                    "geometry": {"location": {"lat": 36.1126, "lng": -115.1767}}
                }]
            }"#,
        )
        .unwrap();
        let stop = parse_geocode("bellagio", body).unwrap();
        assert_eq!(stop.formatted_address, "3600 S Las Vegas Blvd, Las Vegas, NV 89109, USA");
        assert_eq!(stop.location(), (36.1126, -115.1767));
    }

    #[test]
    fn test_parse_geocode_zero_results() {
        let body: GeocodeResponse = serde_json::from_str(r#"{"status": "ZERO_RESULTS", "results": []}"#).unwrap();
        let err = parse_geocode("nowhere", body).unwrap_err();
        assert!(matches!(err, PlannerError::AddressNotFound(address) if address == "nowhere"));
    }

    #[test]
    fn test_parse_distance_matrix_marks_missing_elements() {
        let body: DistanceMatrixResponse = serde_json::from_str(
            r#"{
                "status": "OK",
                "rows": [
                    {"elements": [
                        {"status": "OK", "distance": {"text": "0 ft", "value": 0}},
                        {"status": "ZERO_RESULTS"}
                    ]},
                    {"elements": [
                        {"status": "OK", "distance": {"text": "1.2 mi", "value": 1931}},
                        {"status": "OK", "distance": {"text": "0 ft", "value": 0}}
                    ]}
                ]
            }"#,
        )
        .unwrap();
        let rows = parse_distance_matrix(body).unwrap();
        assert_eq!(rows, vec![vec![Some(0), None], vec![Some(1931), Some(0)]]);
    }

    #[test]
    fn test_parse_distance_matrix_rejected_request() {
        let body: DistanceMatrixResponse = serde_json::from_str(
            r#"{"status": "MAX_ELEMENTS_EXCEEDED", "error_message": "too many elements", "rows": []}"#,
        )
        .unwrap();
        let err = parse_distance_matrix(body).unwrap_err();
        assert!(matches!(err, PlannerError::Measurement(_)));
    }

    #[test]
    fn test_join_addresses() {
        let stops = vec![Stop::new("A St", 0.0, 0.0), Stop::new("B Ave", 0.0, 0.0)];
        assert_eq!(join_addresses(&stops), "A St|B Ave");
    }
}
