//! Objectives written in the expression language.

use indexmap::IndexMap;

use fieldgrad_core::{ObjectiveEvaluator, ObjectiveValue, QuantityVector};

use crate::error::Result;
use crate::expression::{EvalContext, Expr, parse_expression};

/// A parsed objective expression.
#[derive(Debug, Clone)]
pub struct ObjectiveFunction {
    source: String,
    expr: Expr,
    quantities: Vec<String>,
}

impl ObjectiveFunction {
    pub fn parse(source: &str) -> Result<Self> {
        let expr = parse_expression(source)?;
        let quantities = expr.quantities();
        Ok(Self {
            source: source.trim().to_string(),
            expr,
            quantities,
        })
    }

    /// Source text the objective was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expression(&self) -> &Expr {
        &self.expr
    }
}

impl ObjectiveEvaluator for ObjectiveFunction {
    fn quantity_names(&self) -> Vec<String> {
        self.quantities.clone()
    }

    fn evaluate(&self, quantities: &QuantityVector) -> fieldgrad_core::Result<ObjectiveValue> {
        if let Some(missing) = self
            .quantities
            .iter()
            .find(|name| !quantities.contains_key(name.as_str()))
        {
            return Err(fieldgrad_core::Error::MissingQuantity(missing.clone()));
        }

        let ctx = EvalContext::from_quantities(quantities);
        let value = self.expr.eval(&ctx);
        if !value.is_finite() {
            return Err(fieldgrad_core::Error::Evaluation(format!(
                "'{}' evaluated to {}",
                self.source, value
            )));
        }

        let mut partials = IndexMap::with_capacity(self.quantities.len());
        for name in &self.quantities {
            let partial = self.expr.partial(name, &ctx);
            if !partial.is_finite() {
                return Err(fieldgrad_core::Error::Evaluation(format!(
                    "derivative of '{}' with respect to {} is {}",
                    self.source, name, partial
                )));
            }
            partials.insert(name.clone(), partial);
        }

        Ok(ObjectiveValue { value, partials })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quantities(pairs: &[(&str, f64)]) -> QuantityVector {
        pairs.iter().map(|(n, v)| (n.to_string(), *v)).collect()
    }

    #[test]
    fn test_identity_objective() {
        let objective = ObjectiveFunction::parse("q1").unwrap();
        assert_eq!(objective.quantity_names(), vec!["q1"]);

        let result = objective.evaluate(&quantities(&[("q1", 0.4)])).unwrap();
        assert_eq!(result.value, 0.4);
        assert_eq!(result.partial("q1"), 1.0);
    }

    #[test]
    fn test_partials_for_every_referenced_quantity() {
        let objective = ObjectiveFunction::parse("S_0 * S_1 - 2 * P").unwrap();
        let result = objective
            .evaluate(&quantities(&[("S_0", 2.0), ("S_1", 5.0), ("P", 1.0), ("extra", 9.0)]))
            .unwrap();
        assert_eq!(result.value, 8.0);
        assert_eq!(result.partials.len(), 3);
        assert_eq!(result.partial("S_0"), 5.0);
        assert_eq!(result.partial("S_1"), 2.0);
        assert_eq!(result.partial("P"), -2.0);
        assert_eq!(result.partial("extra"), 0.0);
    }

    #[test]
    fn test_missing_quantity() {
        let objective = ObjectiveFunction::parse("a + b").unwrap();
        let err = objective.evaluate(&quantities(&[("a", 1.0)])).unwrap_err();
        assert!(matches!(err, fieldgrad_core::Error::MissingQuantity(name) if name == "b"));
    }

    #[test]
    fn test_non_finite_value_is_an_error() {
        let objective = ObjectiveFunction::parse("exp(q)").unwrap();
        let err = objective.evaluate(&quantities(&[("q", 1e6)])).unwrap_err();
        assert!(matches!(err, fieldgrad_core::Error::Evaluation(_)));
    }

    #[test]
    fn test_non_finite_partial_is_an_error() {
        let objective = ObjectiveFunction::parse("q1^0.5 + q2").unwrap();
        let err = objective
            .evaluate(&quantities(&[("q1", 0.0), ("q2", 1.0)]))
            .unwrap_err();
        assert!(matches!(&err, fieldgrad_core::Error::Evaluation(msg) if msg.contains("q1")));

        let result = objective
            .evaluate(&quantities(&[("q1", 4.0), ("q2", 1.0)]))
            .unwrap();
        assert_eq!(result.value, 3.0);
        assert!((result.partial("q1") - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_source_is_kept() {
        let objective = ObjectiveFunction::parse("  abs(q)^2 ").unwrap();
        assert_eq!(objective.source(), "abs(q)^2");
        assert!(objective.expression().references_quantities());
    }
}
