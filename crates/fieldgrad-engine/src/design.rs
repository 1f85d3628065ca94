//! The current design: a coefficient vector and the function it induces.

use std::sync::Arc;

use nalgebra::DVector;

use fieldgrad_core::{Basis, DesignFunction, SpatialFunction, expand};

use crate::error::{Error, Result};

/// A requested design change.
pub enum DesignUpdate<'a> {
    /// Replace the coefficient vector wholesale.
    Coefficients(DVector<f64>),
    /// Project a function onto the basis to obtain the new coefficients.
    Function(&'a dyn SpatialFunction),
}

impl<'a> DesignUpdate<'a> {
    /// Build an update from a pair of optional arguments, exactly one of
    /// which must be present.
    pub fn from_options(
        coefficients: Option<DVector<f64>>,
        function: Option<&'a dyn SpatialFunction>,
    ) -> Result<Self> {
        match (coefficients, function) {
            (Some(c), None) => Ok(DesignUpdate::Coefficients(c)),
            (None, Some(f)) => Ok(DesignUpdate::Function(f)),
            _ => Err(Error::UpdateConflict("coefficients or design function")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Design {
    function: DesignFunction,
}

impl Design {
    pub fn new(basis: Arc<dyn Basis>, coefficients: DVector<f64>) -> Result<Self> {
        check_length(basis.as_ref(), &coefficients)?;
        Ok(Self {
            function: expand(&basis, coefficients)?,
        })
    }

    pub fn basis(&self) -> &Arc<dyn Basis> {
        self.function.basis()
    }

    pub fn coefficients(&self) -> &DVector<f64> {
        self.function.coefficients()
    }

    pub fn function(&self) -> &DesignFunction {
        &self.function
    }

    /// Function induced by `coefficients` through this design's basis.
    pub fn expand(&self, coefficients: DVector<f64>) -> Result<DesignFunction> {
        check_length(self.basis().as_ref(), &coefficients)?;
        Ok(expand(self.basis(), coefficients)?)
    }

    /// Coefficients of `function` projected onto this design's basis.
    pub fn project(&self, function: &dyn SpatialFunction) -> Result<DVector<f64>> {
        Ok(self.basis().project(function)?)
    }

    /// Apply an update. The stored function is always re-expanded from the
    /// stored coefficients. On error the design is unchanged.
    pub fn update(&mut self, update: DesignUpdate<'_>) -> Result<()> {
        let coefficients = match update {
            DesignUpdate::Coefficients(c) => c,
            DesignUpdate::Function(f) => self.project(f)?,
        };
        self.function = self.expand(coefficients)?;
        Ok(())
    }
}

fn check_length(basis: &dyn Basis, coefficients: &DVector<f64>) -> Result<()> {
    if coefficients.len() != basis.dimension() {
        return Err(Error::DimensionMismatch {
            expected: basis.dimension(),
            actual: coefficients.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldgrad_core::{BoxBasis, ElementType, Point, Region};

    fn design() -> Design {
        let region = Region::new([0.0; 3], [1.0, 1.0, 0.0]);
        let basis = BoxBasis::new(region, ElementType::Linear, 0.5).unwrap();
        Design::new(Arc::new(basis), DVector::zeros(9)).unwrap()
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        let region = Region::new([0.0; 3], [1.0, 0.0, 0.0]);
        let basis = Arc::new(BoxBasis::new(region, ElementType::Constant, 0.5).unwrap());
        assert!(matches!(
            Design::new(basis, DVector::zeros(3)),
            Err(Error::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_update_coefficients() {
        let mut d = design();
        let c = DVector::from_fn(9, |i, _| i as f64);
        d.update(DesignUpdate::Coefficients(c.clone())).unwrap();
        assert_eq!(d.coefficients(), &c);
        let nodes = d.basis().mesh().unwrap().nodes;
        for (k, node) in nodes.iter().enumerate() {
            assert!((d.function().value_at(*node) - c[k]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_update_function_projects() {
        let mut d = design();
        let plane = |p: Point| 1.0 + 2.0 * p[0] - p[1];
        d.update(DesignUpdate::Function(&plane)).unwrap();
        for p in [[0.1, -0.2, 0.0], [0.45, 0.3, 0.0], [-0.4, 0.05, 0.0]] {
            assert!((d.function().value_at(p) - plane(p)).abs() < 1e-10);
        }
    }

    #[test]
    fn test_failed_update_leaves_design() {
        let mut d = design();
        let before = d.coefficients().clone();
        let result = d.update(DesignUpdate::Coefficients(DVector::zeros(4)));
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
        assert_eq!(d.coefficients(), &before);
    }

    #[test]
    fn test_from_options_requires_exactly_one() {
        let f = |_: Point| 0.0;
        assert!(matches!(
            DesignUpdate::from_options(None, None),
            Err(Error::UpdateConflict(_))
        ));
        assert!(matches!(
            DesignUpdate::from_options(Some(DVector::zeros(1)), Some(&f)),
            Err(Error::UpdateConflict(_))
        ));
        assert!(matches!(
            DesignUpdate::from_options(None, Some(&f)),
            Ok(DesignUpdate::Function(_))
        ));
    }
}
