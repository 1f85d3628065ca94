//! Error types for fieldgrad-engine.

use thiserror::Error;

use crate::driver::SimulationError;
use crate::recorder::RunKind;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid problem specification: {0}")]
    Specification(String),

    #[error("exactly one of {0} must be supplied")]
    UpdateConflict(&'static str),

    #[error("invalid dimensions: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("coefficient index {index} out of range for dimension {dimension}")]
    IndexOutOfRange { index: usize, dimension: usize },

    #[error("no {kind} field data recorded for region {region}")]
    MissingFieldData { kind: RunKind, region: String },

    #[error("field data layout mismatch for region {region}: {message}")]
    FieldLayout { region: String, message: String },

    #[error("{kind} run failed")]
    Simulation {
        kind: RunKind,
        #[source]
        source: SimulationError,
    },

    #[error("visualization failed")]
    Visualization(#[source] SimulationError),

    #[error(transparent)]
    Core(#[from] fieldgrad_core::Error),

    #[error(transparent)]
    Expression(#[from] fieldgrad_expr::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
