//! Objective evaluation interface.

use indexmap::IndexMap;

use crate::error::Result;

/// Reserved name of the objective value in a [`QuantityVector`].
pub const OBJECTIVE_NAME: &str = "objective";

/// Named numeric values in a fixed order.
///
/// Forward results list the objective value first under [`OBJECTIVE_NAME`],
/// followed by every declared quantity.
pub type QuantityVector = IndexMap<String, f64>;

/// Value of the objective and its partial derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveValue {
    pub value: f64,
    /// Partial derivative with respect to each quantity the objective references.
    pub partials: IndexMap<String, f64>,
}

impl ObjectiveValue {
    /// Partial derivative for `name`, zero when the objective does not reference it.
    pub fn partial(&self, name: &str) -> f64 {
        self.partials.get(name).copied().unwrap_or(0.0)
    }
}

/// Scalar objective of named quantities.
///
/// Implementations must be pure: the same quantity values always give the
/// same result.
pub trait ObjectiveEvaluator {
    /// Names of the quantities the objective references.
    fn quantity_names(&self) -> Vec<String>;

    /// Evaluate the objective and its partials at `quantities`.
    fn evaluate(&self, quantities: &QuantityVector) -> Result<ObjectiveValue>;
}
