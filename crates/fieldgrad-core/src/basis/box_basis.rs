//! Tensor-product finite-element basis over a box region.

use nalgebra::{DMatrix, DVector};

use super::{Basis, BasisMesh, ElementType, SpatialFunction};
use crate::error::{Error, Result};
use crate::region::{Point, Region};

/// Two-point Gauss abscissa on [-1, 1].
const GAUSS_ABSCISSA: f64 = 0.577_350_269_189_625_8;

/// One axis of the tensor-product grid.
#[derive(Debug, Clone)]
struct Axis {
    lower: f64,
    width: f64,
    elements: usize,
    active: bool,
    element_type: ElementType,
}

impl Axis {
    fn new(lower: f64, extent: f64, element_length: f64, element_type: ElementType) -> Self {
        if extent <= 0.0 {
            return Self {
                lower,
                width: 0.0,
                elements: 1,
                active: false,
                element_type,
            };
        }
        let elements = ((extent / element_length).round() as usize).max(1);
        Self {
            lower,
            width: extent / elements as f64,
            elements,
            active: true,
            element_type,
        }
    }

    fn functions(&self) -> usize {
        if !self.active {
            return 1;
        }
        match self.element_type {
            ElementType::Constant => self.elements,
            ElementType::Linear => self.elements + 1,
        }
    }

    fn upper(&self) -> f64 {
        self.lower + self.width * self.elements as f64
    }

    /// Non-zero one-dimensional factors at coordinate `x`.
    fn factors(&self, x: f64) -> Vec<(usize, f64)> {
        if !self.active {
            return vec![(0, 1.0)];
        }
        let tol = 1e-12 * (1.0 + self.width * self.elements as f64);
        if x < self.lower - tol || x > self.upper() + tol {
            return Vec::new();
        }
        let t = ((x - self.lower) / self.width).clamp(0.0, self.elements as f64);
        let element = (t.floor() as usize).min(self.elements - 1);
        match self.element_type {
            ElementType::Constant => vec![(element, 1.0)],
            ElementType::Linear => {
                let s = t - element as f64;
                let mut factors = Vec::with_capacity(2);
                if s < 1.0 {
                    factors.push((element, 1.0 - s));
                }
                if s > 0.0 {
                    factors.push((element + 1, s));
                }
                factors
            }
        }
    }

    /// Quadrature nodes `(coordinate, weight)`, two Gauss points per element.
    fn quadrature(&self) -> Vec<(f64, f64)> {
        if !self.active {
            return vec![(self.lower, 1.0)];
        }
        let half = 0.5 * self.width;
        (0..self.elements)
            .flat_map(|e| {
                let mid = self.lower + (e as f64 + 0.5) * self.width;
                [
                    (mid - half * GAUSS_ABSCISSA, half),
                    (mid + half * GAUSS_ABSCISSA, half),
                ]
            })
            .collect()
    }

    fn vertices(&self) -> Vec<f64> {
        if !self.active {
            return vec![self.lower];
        }
        (0..=self.elements)
            .map(|i| self.lower + i as f64 * self.width)
            .collect()
    }
}

/// Finite-element basis on a uniform grid over a box-shaped design region.
///
/// Axes of zero extent carry a single constant factor, so the same type
/// covers 1D, 2D and 3D design regions.
#[derive(Debug, Clone)]
pub struct BoxBasis {
    region: Region,
    element_type: ElementType,
    axes: [Axis; 3],
}

impl BoxBasis {
    pub fn new(region: Region, element_type: ElementType, element_length: f64) -> Result<Self> {
        if !(element_length > 0.0) {
            return Err(Error::InvalidBasis(format!(
                "element length must be positive, got {}",
                element_length
            )));
        }
        let lower = region.lower();
        let axes = [0, 1, 2].map(|axis| {
            Axis::new(
                lower[axis],
                region.size[axis].abs(),
                element_length,
                element_type,
            )
        });
        Ok(Self {
            region,
            element_type,
            axes,
        })
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// Element count along each axis.
    pub fn elements(&self) -> [usize; 3] {
        [0, 1, 2].map(|axis| self.axes[axis].elements)
    }

    fn counts(&self) -> [usize; 3] {
        [0, 1, 2].map(|axis| self.axes[axis].functions())
    }

    fn flat_index(&self, index: [usize; 3]) -> usize {
        let counts = self.counts();
        index[0] + counts[0] * (index[1] + counts[1] * index[2])
    }

    fn quadrature(&self) -> Vec<(Point, f64)> {
        let qx = self.axes[0].quadrature();
        let qy = self.axes[1].quadrature();
        let qz = self.axes[2].quadrature();
        let mut nodes = Vec::with_capacity(qx.len() * qy.len() * qz.len());
        for &(z, wz) in &qz {
            for &(y, wy) in &qy {
                for &(x, wx) in &qx {
                    nodes.push(([x, y, z], wx * wy * wz));
                }
            }
        }
        nodes
    }
}

impl Basis for BoxBasis {
    fn domain(&self) -> &Region {
        &self.region
    }

    fn dimension(&self) -> usize {
        self.counts().iter().product()
    }

    fn shape_values(&self, point: Point) -> Vec<(usize, f64)> {
        let fx = self.axes[0].factors(point[0]);
        let fy = self.axes[1].factors(point[1]);
        let fz = self.axes[2].factors(point[2]);
        let mut values = Vec::with_capacity(fx.len() * fy.len() * fz.len());
        for &(k, vz) in &fz {
            for &(j, vy) in &fy {
                for &(i, vx) in &fx {
                    values.push((self.flat_index([i, j, k]), vx * vy * vz));
                }
            }
        }
        values
    }

    fn project(&self, function: &dyn SpatialFunction) -> Result<DVector<f64>> {
        let n = self.dimension();
        let mut gram = DMatrix::<f64>::zeros(n, n);
        let mut rhs = DVector::<f64>::zeros(n);

        for (point, weight) in self.quadrature() {
            let phi = self.shape_values(point);
            let value = function.value_at(point);
            for &(j, pj) in &phi {
                rhs[j] += weight * value * pj;
                for &(k, pk) in &phi {
                    gram[(j, k)] += weight * pj * pk;
                }
            }
        }

        if let Some(cholesky) = gram.clone().cholesky() {
            return Ok(cholesky.solve(&rhs));
        }
        log::debug!("gram matrix not positive definite, falling back to LU");
        gram.lu().solve(&rhs).ok_or(Error::SingularMatrix)
    }

    fn mesh(&self) -> Option<BasisMesh> {
        let vx = self.axes[0].vertices();
        let vy = self.axes[1].vertices();
        let vz = self.axes[2].vertices();

        let mut nodes = Vec::with_capacity(vx.len() * vy.len() * vz.len());
        for &z in &vz {
            for &y in &vy {
                for &x in &vx {
                    nodes.push([x, y, z]);
                }
            }
        }

        let span = |v: &[f64], i: usize| {
            if v.len() == 1 { (v[0], v[0]) } else { (v[i], v[i + 1]) }
        };
        let [ex, ey, ez] = self.elements();
        let mut elements = Vec::with_capacity(ex * ey * ez);
        for k in 0..ez {
            for j in 0..ey {
                for i in 0..ex {
                    let (x0, x1) = span(&vx, i);
                    let (y0, y1) = span(&vy, j);
                    let (z0, z1) = span(&vz, k);
                    elements.push(([x0, y0, z0], [x1, y1, z1]));
                }
            }
        }

        Some(BasisMesh { nodes, elements })
    }
}
