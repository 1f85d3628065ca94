//! Objective expression language for fieldgrad.
//!
//! Objectives are written as ordinary arithmetic over named quantities,
//! e.g. `abs(P1_east)^2 / (S_west + 1e-9)`. Parsed expressions evaluate to a
//! scalar and supply symbolic partial derivatives with respect to each
//! quantity, which seed the adjoint run.

pub mod error;
pub mod expression;
pub mod objective;

pub use error::{Error, Result};
pub use expression::{BinaryOp, EvalContext, Expr, UnaryOp, parse_expression};
pub use objective::ObjectiveFunction;
