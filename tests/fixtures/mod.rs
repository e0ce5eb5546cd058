//! Test fixtures for route-planner.
//!
//! Provides:
//! - Real Las Vegas locations (from OpenStreetMap) as pre-resolved stops
//! - A lookup geocoder and measurers with call accounting

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use route_planner::error::PlannerError;
use route_planner::stop::Stop;
use route_planner::traits::{DistanceMeasurer, Geocoder, MeasuredRow};

/// (query, formatted address, lat, lng)
pub const LAS_VEGAS: &[(&str, &str, f64, f64)] = &[
    ("wynn", "3131 S Las Vegas Blvd, Las Vegas, NV 89109, USA", 36.1263781, -115.1658180),
    ("mgm grand", "3799 S Las Vegas Blvd, Las Vegas, NV 89109, USA", 36.1023654, -115.1688720),
    ("bellagio", "3600 S Las Vegas Blvd, Las Vegas, NV 89109, USA", 36.1126, -115.1767),
    ("caesars", "3570 S Las Vegas Blvd, Las Vegas, NV 89109, USA", 36.1162, -115.1745),
    ("longhorn", "5288 Boulder Hwy, Las Vegas, NV 89122, USA", 36.1070664, -115.0591256),
    ("hard rock cafe", "3771 S Las Vegas Blvd, Las Vegas, NV 89109, USA", 36.1041592, -115.1722166),
    ("brooklyn bowl", "3545 S Las Vegas Blvd, Las Vegas, NV 89109, USA", 36.1175388, -115.1695094),
    ("sinatra", "3131 S Las Vegas Blvd #1, Las Vegas, NV 89109, USA", 36.1300035, -115.1654850),
];

pub fn las_vegas_stops(count: usize) -> Vec<Stop> {
    LAS_VEGAS
        .iter()
        .take(count)
        .map(|(_, address, lat, lng)| Stop::new(*address, *lat, *lng))
        .collect()
}

/// Synthetic stops with unique addresses.
pub fn numbered_stops(count: usize) -> Vec<Stop> {
    (0..count)
        .map(|i| Stop::new(format!("{} Main St", i), 36.0 + i as f64 * 0.01, -115.0))
        .collect()
}

/// Resolves the queries in [`LAS_VEGAS`]; anything else is not found.
pub struct FixtureGeocoder {
    known: HashMap<String, Stop>,
}

impl FixtureGeocoder {
    pub fn las_vegas() -> Self {
        let known = LAS_VEGAS
            .iter()
            .map(|(query, address, lat, lng)| (query.to_string(), Stop::new(*address, *lat, *lng)))
            .collect();
        Self { known }
    }
}

impl Geocoder for FixtureGeocoder {
    fn resolve(&self, address: &str) -> Result<Stop, PlannerError> {
        self.known
            .get(&address.to_lowercase())
            .cloned()
            .ok_or_else(|| PlannerError::AddressNotFound(address.to_string()))
    }
}

/// Measures from a fixed meter table keyed by formatted address.
///
/// `None` cells are reported as absent. Records every call.
pub struct TableMeasurer {
    index: HashMap<String, usize>,
    meters: Vec<Vec<Option<u64>>>,
    calls: AtomicUsize,
    batches: Mutex<Vec<(String, usize, usize)>>,
}

impl TableMeasurer {
    pub fn new(stops: &[Stop], meters: Vec<Vec<Option<u64>>>) -> Self {
        let index = stops
            .iter()
            .enumerate()
            .map(|(i, stop)| (stop.formatted_address.clone(), i))
            .collect();
        Self {
            index,
            meters,
            calls: AtomicUsize::new(0),
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Every pair `i -> j` is `|i - j| * step` meters.
    pub fn linear(stops: &[Stop], step: u64) -> Self {
        let n = stops.len();
        let meters = (0..n)
            .map(|i| (0..n).map(|j| Some(i.abs_diff(j) as u64 * step)).collect())
            .collect();
        Self::new(stops, meters)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// (first origin address, origin count, destination count) per call.
    pub fn batches(&self) -> Vec<(String, usize, usize)> {
        self.batches.lock().unwrap().clone()
    }
}

impl DistanceMeasurer for TableMeasurer {
    fn measure(&self, origins: &[Stop], destinations: &[Stop]) -> Result<Vec<MeasuredRow>, PlannerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batches.lock().unwrap().push((
            origins.first().map(|stop| stop.formatted_address.clone()).unwrap_or_default(),
            origins.len(),
            destinations.len(),
        ));

        let lookup = |stop: &Stop| {
            self.index
                .get(&stop.formatted_address)
                .copied()
                .ok_or_else(|| PlannerError::Measurement(format!("unknown stop {}", stop.formatted_address)))
        };

        origins
            .iter()
            .map(|origin| {
                let i = lookup(origin)?;
                destinations
                    .iter()
                    .map(|destination| Ok(self.meters[i][lookup(destination)?]))
                    .collect::<Result<MeasuredRow, PlannerError>>()
            })
            .collect()
    }
}

/// Fails every call.
pub struct FailingMeasurer;

impl DistanceMeasurer for FailingMeasurer {
    fn measure(&self, _origins: &[Stop], _destinations: &[Stop]) -> Result<Vec<MeasuredRow>, PlannerError> {
        Err(PlannerError::Measurement("service unavailable".to_string()))
    }
}

/// Drops the last row of every batch.
pub struct ShortMeasurer;

impl DistanceMeasurer for ShortMeasurer {
    fn measure(&self, origins: &[Stop], destinations: &[Stop]) -> Result<Vec<MeasuredRow>, PlannerError> {
        let rows = origins.len().saturating_sub(1);
        Ok(vec![vec![Some(1); destinations.len()]; rows])
    }
}
