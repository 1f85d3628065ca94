//! Error types for fieldgrad-core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid dimensions: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("singular projection matrix")]
    SingularMatrix,

    #[error("invalid basis: {0}")]
    InvalidBasis(String),

    #[error("no value supplied for quantity: {0}")]
    MissingQuantity(String),

    #[error("objective evaluation failed: {0}")]
    Evaluation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
