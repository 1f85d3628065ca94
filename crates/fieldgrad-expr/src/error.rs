//! Error types for fieldgrad-expr.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("empty expression")]
    Empty,
}

pub type Result<T> = std::result::Result<T, Error>;
