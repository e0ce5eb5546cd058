//! OSRM HTTP adapter for distance measurements.

use serde::Deserialize;
use tracing::debug;

use crate::error::PlannerError;
use crate::stop::Stop;
use crate::traits::{DistanceMeasurer, MeasuredRow};

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, PlannerError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Table request URL: origins first, then destinations.
    fn table_url(&self, origins: &[Stop], destinations: &[Stop]) -> String {
        let coords = origins
            .iter()
            .chain(destinations)
            .map(|stop| format!("{:.6},{:.6}", stop.longitude, stop.latitude))
            .collect::<Vec<_>>()
            .join(";");
        let sources = index_list(0..origins.len());
        let targets = index_list(origins.len()..origins.len() + destinations.len());

        format!(
            "{}/table/v1/{}/{}?sources={}&destinations={}&annotations=distance",
            self.config.base_url, self.config.profile, coords, sources, targets
        )
    }
}

fn index_list(range: std::ops::Range<usize>) -> String {
    range.map(|i| i.to_string()).collect::<Vec<_>>().join(";")
}

impl DistanceMeasurer for OsrmClient {
    fn measure(&self, origins: &[Stop], destinations: &[Stop]) -> Result<Vec<MeasuredRow>, PlannerError> {
        if origins.is_empty() || destinations.is_empty() {
            return Ok(vec![Vec::new(); origins.len()]);
        }

        let url = self.table_url(origins, destinations);
        debug!(origins = origins.len(), destinations = destinations.len(), "requesting OSRM table");

        let body = self
            .client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<OsrmTableResponse>())?;

        if body.code != "Ok" {
            return Err(PlannerError::Measurement(format!(
                "OSRM table returned {}: {}",
                body.code,
                body.message.unwrap_or_default()
            )));
        }

        let distances = body
            .distances
            .ok_or_else(|| PlannerError::MalformedResponse("OSRM table has no distances".to_string()))?;

        Ok(into_rows(distances))
    }
}

/// Rounds OSRM meter values; `null` entries have no route.
fn into_rows(distances: Vec<Vec<Option<f64>>>) -> Vec<MeasuredRow> {
    distances
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|value| value.map(|meters| meters.round() as u64))
                .collect()
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct OsrmTableResponse {
    code: String,
    message: Option<String>,
    distances: Option<Vec<Vec<Option<f64>>>>,
}
