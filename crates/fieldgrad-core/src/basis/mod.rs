//! Design bases and the design function they induce.
//!
//! A basis is a finite set of shape functions `phi_k` over a design region.
//! A coefficient vector `c` induces the design function
//! `f(x) = sum_k c_k phi_k(x)`; projection maps an arbitrary spatial function
//! back onto the coefficient space.

mod box_basis;

use std::fmt;
use std::sync::Arc;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::region::{Point, Region};

pub use box_basis::BoxBasis;

/// A scalar function of position.
pub trait SpatialFunction {
    fn value_at(&self, point: Point) -> f64;
}

impl<F> SpatialFunction for F
where
    F: Fn(Point) -> f64,
{
    fn value_at(&self, point: Point) -> f64 {
        self(point)
    }
}

/// Finite-dimensional function space over a design region.
///
/// Implementations are immutable once built and are shared by reference
/// between the design representation and the gradient assembler.
pub trait Basis: fmt::Debug + Send + Sync {
    /// Spatial extent of the design region.
    fn domain(&self) -> &Region;

    /// Number of shape functions (coefficient count).
    fn dimension(&self) -> usize;

    /// Non-zero shape function values at `point` as `(index, value)` pairs.
    ///
    /// Points outside the domain yield an empty list.
    fn shape_values(&self, point: Point) -> Vec<(usize, f64)>;

    /// Project `function` onto the basis.
    fn project(&self, function: &dyn SpatialFunction) -> Result<DVector<f64>>;

    /// Element mesh for plotting, when the basis has one.
    fn mesh(&self) -> Option<BasisMesh> {
        None
    }

    /// Evaluate `sum_k c_k phi_k(point)`.
    ///
    /// Shape function indices past the end of `coefficients` contribute nothing.
    fn evaluate(&self, coefficients: &DVector<f64>, point: Point) -> f64 {
        self.shape_values(point)
            .into_iter()
            .filter_map(|(k, phi)| coefficients.get(k).map(|c| c * phi))
            .sum()
    }
}

/// Expand `coefficients` through `basis` into a design function.
pub fn expand(basis: &Arc<dyn Basis>, coefficients: DVector<f64>) -> Result<DesignFunction> {
    DesignFunction::new(Arc::clone(basis), coefficients)
}

/// Nodes and element boxes of a basis mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisMesh {
    pub nodes: Vec<Point>,
    /// Element boxes as (lower corner, upper corner).
    pub elements: Vec<(Point, Point)>,
}

/// The continuous function induced by a coefficient vector.
///
/// Only ever built from a basis plus coefficients, so the stored function is
/// always exactly what the basis produces from the stored coefficients.
#[derive(Debug, Clone)]
pub struct DesignFunction {
    basis: Arc<dyn Basis>,
    coefficients: DVector<f64>,
}

impl DesignFunction {
    pub fn new(basis: Arc<dyn Basis>, coefficients: DVector<f64>) -> Result<Self> {
        if coefficients.len() != basis.dimension() {
            return Err(Error::DimensionMismatch {
                expected: basis.dimension(),
                actual: coefficients.len(),
            });
        }
        Ok(Self {
            basis,
            coefficients,
        })
    }

    pub fn basis(&self) -> &Arc<dyn Basis> {
        &self.basis
    }

    pub fn coefficients(&self) -> &DVector<f64> {
        &self.coefficients
    }

    pub fn value_at(&self, point: Point) -> f64 {
        self.basis.evaluate(&self.coefficients, point)
    }

    pub fn sample(&self, points: &[Point]) -> Vec<f64> {
        points.iter().map(|p| self.value_at(*p)).collect()
    }
}

impl SpatialFunction for DesignFunction {
    fn value_at(&self, point: Point) -> f64 {
        DesignFunction::value_at(self, point)
    }
}

/// Shape function family used by [`BoxBasis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// Piecewise constant, one function per element.
    Constant,
    /// Continuous piecewise linear, one hat function per node.
    #[default]
    Linear,
}

/// Defaults used when a basis is built from a bare design region.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BasisDefaults {
    pub element_type: ElementType,
    pub element_length: f64,
}

impl Default for BasisDefaults {
    fn default() -> Self {
        Self {
            element_type: ElementType::Linear,
            element_length: 0.25,
        }
    }
}

/// Either a caller-built basis or a design region to build one over.
#[derive(Debug, Clone)]
pub enum BasisSpec {
    Explicit(Arc<dyn Basis>),
    DesignRegion(Region),
}

impl BasisSpec {
    /// Resolve to a concrete basis. Region specs get a [`BoxBasis`] built from `defaults`.
    pub fn resolve(self, defaults: &BasisDefaults) -> Result<Arc<dyn Basis>> {
        match self {
            BasisSpec::Explicit(basis) => Ok(basis),
            BasisSpec::DesignRegion(region) => {
                let basis =
                    BoxBasis::new(region, defaults.element_type, defaults.element_length)?;
                log::debug!(
                    "built {:?} box basis with {} functions over {}",
                    defaults.element_type,
                    basis.dimension(),
                    basis.domain().label()
                );
                Ok(Arc::new(basis))
            }
        }
    }
}

impl From<Arc<dyn Basis>> for BasisSpec {
    fn from(basis: Arc<dyn Basis>) -> Self {
        BasisSpec::Explicit(basis)
    }
}

impl From<Region> for BasisSpec {
    fn from(region: Region) -> Self {
        BasisSpec::DesignRegion(region)
    }
}
