//! Error type shared by the planning pipeline.

use thiserror::Error;

/// Errors produced while resolving stops, building matrices or solving.
///
/// An infeasible plan is not an error; see [`crate::solver::SolveOutcome`].
#[derive(Debug, Error)]
pub enum PlannerError {
    /// The geocoder found no match for the address.
    #[error("address could not be validated: {0}")]
    AddressNotFound(String),

    /// The element quota is too small to fit a single origin row.
    #[error("batch size is zero: {stops} stops do not fit a quota of {max_elements} elements")]
    BatchSize { stops: usize, max_elements: usize },

    /// A whole measurement call failed.
    #[error("distance measurement failed: {0}")]
    Measurement(String),

    /// A collaborator answered with a payload of the wrong shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A raw matrix cell was never written by any batch.
    #[error("distance from stop {origin} to stop {destination} was never measured")]
    IncompleteMatrix { origin: usize, destination: usize },

    /// The cost matrix is not square or holds a negative cost.
    #[error("malformed cost matrix: {0}")]
    MalformedMatrix(String),

    /// Vehicle count or depot index do not describe a valid model.
    #[error("invalid routing model: {0}")]
    InvalidModel(String),

    /// The search engine returned an assignment that does not form valid routes.
    #[error("invalid assignment: {0}")]
    InvalidAssignment(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
