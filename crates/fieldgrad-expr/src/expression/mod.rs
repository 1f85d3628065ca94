//! Mathematical expression parsing and evaluation.
//!
//! Supports expressions like:
//! - `q1` - a bare quantity reference
//! - `2 * S_0 - S_1` - arithmetic over quantities
//! - `abs(P1)^2 / (P1^2 + P2^2)` - functions and powers
//! - `exp(-q / 10m)` - engineering suffixes on constants

mod ast;
mod eval;
mod functions;
mod parser;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use eval::EvalContext;
pub use parser::parse_expression;
