//! Distance-matrix construction.
//!
//! Raw distances are collected in origin batches that respect the
//! measurement service's element quota, then normalized into a symmetric
//! integer kilometer matrix that the routing model consumes.

use std::ops::Range;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::MatrixConfig;
use crate::error::PlannerError;
use crate::stop::Stop;
use crate::traits::{DistanceMeasurer, MeasuredRow};

/// One raw origin → destination measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawCell {
    /// Not written by any batch yet.
    Unknown,
    Meters(u64),
    /// The service had no usable distance for the pair.
    Unreachable,
}

impl From<Option<u64>> for RawCell {
    fn from(value: Option<u64>) -> Self {
        match value {
            Some(meters) => RawCell::Meters(meters),
            None => RawCell::Unreachable,
        }
    }
}

/// Square matrix of raw measurements, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMatrix {
    cells: Vec<RawCell>,
    size: usize,
}

impl RawMatrix {
    /// Creates a matrix with every cell [`RawCell::Unknown`].
    pub fn new(size: usize) -> Self {
        Self {
            cells: vec![RawCell::Unknown; size * size],
            size,
        }
    }

    /// Builds a fully written matrix from measured rows (`None` is unreachable).
    pub fn from_rows(rows: Vec<MeasuredRow>) -> Result<Self, PlannerError> {
        let size = rows.len();
        let mut matrix = Self::new(size);
        matrix.write_rows(0, rows)?;
        Ok(matrix)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, origin: usize, destination: usize) -> RawCell {
        self.cells[origin * self.size + destination]
    }

    pub fn set(&mut self, origin: usize, destination: usize, cell: RawCell) {
        self.cells[origin * self.size + destination] = cell;
    }

    /// First off-diagonal cell that was never written, in row-major order.
    pub fn first_unknown(&self) -> Option<(usize, usize)> {
        (0..self.size)
            .flat_map(|i| (0..self.size).map(move |j| (i, j)))
            .find(|&(i, j)| i != j && self.get(i, j) == RawCell::Unknown)
    }

    /// Writes one batch of rows starting at origin row `offset`.
    ///
    /// Returns the number of unreachable cells written.
    fn write_rows(&mut self, offset: usize, rows: Vec<MeasuredRow>) -> Result<usize, PlannerError> {
        if offset + rows.len() > self.size {
            return Err(PlannerError::MalformedResponse(format!(
                "{} rows at offset {} overflow a {}x{} matrix",
                rows.len(),
                offset,
                self.size,
                self.size
            )));
        }

        let mut unreachable = 0;
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != self.size {
                return Err(PlannerError::MalformedResponse(format!(
                    "row for origin {} has {} elements, expected {}",
                    offset + i,
                    row.len(),
                    self.size
                )));
            }
            for (j, element) in row.into_iter().enumerate() {
                let cell = RawCell::from(element);
                if cell == RawCell::Unreachable {
                    debug!(origin = offset + i, destination = j, "no usable distance, marking unreachable");
                    unreachable += 1;
                }
                self.set(offset + i, j, cell);
            }
        }
        Ok(unreachable)
    }
}

/// Number of origin rows that fit in one query.
///
/// Fails when a single row of `stop_count` destinations already exceeds
/// the quota.
pub fn batch_rows(stop_count: usize, max_elements: usize) -> Result<usize, PlannerError> {
    if stop_count == 0 {
        return Ok(0);
    }
    let max_rows = max_elements / stop_count;
    if max_rows == 0 {
        return Err(PlannerError::BatchSize {
            stops: stop_count,
            max_elements,
        });
    }
    Ok(max_rows)
}

/// Consecutive origin ranges of at most `max_rows` rows covering `[0, stop_count)`.
pub fn batch_ranges(stop_count: usize, max_rows: usize) -> Vec<Range<usize>> {
    if stop_count == 0 || max_rows == 0 {
        return Vec::new();
    }
    (0..stop_count)
        .step_by(max_rows)
        .map(|start| start..(start + max_rows).min(stop_count))
        .collect()
}

/// Measures every stop against every other stop, one query per origin batch.
///
/// Performs exactly `ceil(N / max_rows)` measurement calls. Pairs the
/// service cannot measure become [`RawCell::Unreachable`]; a failing call
/// aborts the build.
pub fn build_raw_matrix<M>(
    stops: &[Stop],
    config: &MatrixConfig,
    measurer: &M,
) -> Result<RawMatrix, PlannerError>
where
    M: DistanceMeasurer + Sync,
{
    let mut matrix = RawMatrix::new(stops.len());
    if stops.is_empty() {
        return Ok(matrix);
    }

    let max_rows = batch_rows(stops.len(), config.max_elements_per_query)?;
    let batches = batch_ranges(stops.len(), max_rows);
    info!(
        stops = stops.len(),
        max_rows,
        batches = batches.len(),
        parallel = config.parallel,
        "building distance matrix"
    );

    let measure_batch = |(index, range): (usize, &Range<usize>)| -> Result<(usize, Vec<MeasuredRow>), PlannerError> {
        debug!(batch = index, offset = range.start, rows = range.len(), "measuring batch");
        let rows = measurer.measure(&stops[range.clone()], stops)?;
        if rows.len() != range.len() {
            return Err(PlannerError::MalformedResponse(format!(
                "batch {} returned {} rows for {} origins",
                index,
                rows.len(),
                range.len()
            )));
        }
        Ok((range.start, rows))
    };

    let measured: Vec<(usize, Vec<MeasuredRow>)> = if config.parallel {
        batches.par_iter().enumerate().map(&measure_batch).collect::<Result<_, _>>()?
    } else {
        batches.iter().enumerate().map(&measure_batch).collect::<Result<_, _>>()?
    };

    let mut unreachable = 0;
    for (offset, rows) in measured {
        unreachable += matrix.write_rows(offset, rows)?;
    }
    if unreachable > 0 {
        warn!(unreachable, "some stop pairs have no usable distance");
    }

    Ok(matrix)
}

/// Rounds to the nearest integer, halves always away from the floor.
pub fn round_half_up(value: f64) -> i64 {
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor as i64 + 1
    } else {
        floor as i64
    }
}

/// Converts meters to whole kilometers with [`round_half_up`].
pub fn meters_to_km(meters: f64) -> i64 {
    round_half_up(meters / 1000.0)
}

/// Reconciles asymmetric raw distances into a symmetric kilometer matrix.
///
/// Each pair takes the average of both directions; if either direction is
/// unreachable the pair is unreachable both ways. The diagonal is zero.
/// Fails if any off-diagonal cell was never measured.
pub fn normalize(raw: &RawMatrix) -> Result<CostMatrix, PlannerError> {
    if let Some((origin, destination)) = raw.first_unknown() {
        return Err(PlannerError::IncompleteMatrix { origin, destination });
    }

    let size = raw.size();
    let mut costs = CostMatrix::zeros(size);
    for i in 0..size {
        for j in (i + 1)..size {
            let cost = match (raw.get(i, j), raw.get(j, i)) {
                (RawCell::Meters(there), RawCell::Meters(back)) => {
                    meters_to_km((there as f64 + back as f64) / 2.0)
                }
                _ => CostMatrix::UNREACHABLE,
            };
            costs.set(i, j, cost);
            costs.set(j, i, cost);
        }
    }

    debug!(size, "normalized distance matrix");
    Ok(costs)
}

/// Batches, measures and normalizes in one step.
pub fn build_cost_matrix<M>(
    stops: &[Stop],
    config: &MatrixConfig,
    measurer: &M,
) -> Result<CostMatrix, PlannerError>
where
    M: DistanceMeasurer + Sync,
{
    let raw = build_raw_matrix(stops, config, measurer)?;
    normalize(&raw)
}

/// Square non-negative integer cost matrix (kilometers), stored row-major.
///
/// Serialized as rows of numbers where `null` marks an unreachable pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Option<i64>>>", into = "Vec<Vec<Option<i64>>>")]
pub struct CostMatrix {
    data: Vec<i64>,
    size: usize,
}

impl CostMatrix {
    /// Cost of a pair that cannot be travelled.
    pub const UNREACHABLE: i64 = i64::MAX;

    pub fn zeros(size: usize) -> Self {
        Self {
            data: vec![0; size * size],
            size,
        }
    }

    /// Validates that `rows` is square, free of negative costs and zero on
    /// the diagonal.
    pub fn from_rows(rows: Vec<Vec<i64>>) -> Result<Self, PlannerError> {
        let size = rows.len();
        let mut data = Vec::with_capacity(size * size);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(PlannerError::MalformedMatrix(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    size
                )));
            }
            if let Some(j) = row.iter().position(|&cost| cost < 0) {
                return Err(PlannerError::MalformedMatrix(format!(
                    "negative cost {} at [{}][{}]",
                    row[j], i, j
                )));
            }
            if row[i] != 0 {
                return Err(PlannerError::MalformedMatrix(format!(
                    "diagonal cost at [{}][{}] must be 0",
                    i, i
                )));
            }
            data.extend(row);
        }
        Ok(Self { data, size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn get(&self, from: usize, to: usize) -> i64 {
        self.data[from * self.size + to]
    }

    pub fn is_reachable(&self, from: usize, to: usize) -> bool {
        self.get(from, to) != Self::UNREACHABLE
    }

    pub(crate) fn set(&mut self, from: usize, to: usize, cost: i64) {
        self.data[from * self.size + to] = cost;
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.size).all(|i| ((i + 1)..self.size).all(|j| self.get(i, j) == self.get(j, i)))
    }

    pub fn to_rows(&self) -> Vec<Vec<i64>> {
        self.data.chunks(self.size.max(1)).take(self.size).map(<[i64]>::to_vec).collect()
    }
}

impl TryFrom<Vec<Vec<Option<i64>>>> for CostMatrix {
    type Error = PlannerError;

    fn try_from(rows: Vec<Vec<Option<i64>>>) -> Result<Self, Self::Error> {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|cost| cost.unwrap_or(Self::UNREACHABLE)).collect())
            .collect();
        Self::from_rows(rows)
    }
}

impl From<CostMatrix> for Vec<Vec<Option<i64>>> {
    fn from(matrix: CostMatrix) -> Self {
        matrix
            .to_rows()
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cost| (cost != CostMatrix::UNREACHABLE).then_some(cost))
                    .collect()
            })
            .collect()
    }
}
