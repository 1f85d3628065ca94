//! Reciprocal Born-approximation driver shared by the integration tests.
//!
//! Sources radiate through the scalar Green's function
//! `G(x, y) = exp(i 2 pi f |x - y|) / (1 + |x - y|)`, independently per
//! component. In forward runs every design sample scatters the incident
//! field with strength `design(x) * w_x`; fields inside the design region
//! stay unperturbed. Adjoint runs propagate the adjoint sources only. Under
//! these rules the adjoint gradient is exact, so finite differences can
//! check it to round-off for linear quantities.

#![allow(dead_code)]

use std::f64::consts::PI;

use num_complex::Complex64;

use fieldgrad_core::{BasisSpec, DesignFunction, FieldComponent, FieldData, Point, Region};
use fieldgrad_engine::{
    FieldRecorder, ProblemSetup, QuantityKind, QuantitySpec, RunDriver, RunKind,
    SimulationError, Source,
};

pub struct BornDriver {
    /// Sample cells per active axis of every region.
    pub cells: usize,
    pub forward_runs: usize,
    pub adjoint_runs: usize,
    /// Fail every run while set.
    pub fail: bool,
}

impl BornDriver {
    pub fn new(cells: usize) -> Self {
        Self {
            cells,
            forward_runs: 0,
            adjoint_runs: 0,
            fail: false,
        }
    }
}

impl Default for BornDriver {
    fn default() -> Self {
        Self::new(16)
    }
}

/// Cell-midpoint samples of `region` with their cell volumes.
pub fn sample(region: &Region, cells: usize) -> (Vec<Point>, Vec<f64>) {
    let lower = region.lower();
    let axis_points = |axis: usize| -> Vec<f64> {
        let extent = region.size[axis].abs();
        if extent == 0.0 {
            return vec![region.center[axis]];
        }
        let width = extent / cells as f64;
        (0..cells)
            .map(|i| lower[axis] + (i as f64 + 0.5) * width)
            .collect()
    };
    let (xs, ys, zs) = (axis_points(0), axis_points(1), axis_points(2));

    let mut points = Vec::with_capacity(xs.len() * ys.len() * zs.len());
    for &z in &zs {
        for &y in &ys {
            for &x in &xs {
                points.push([x, y, z]);
            }
        }
    }
    let weight = region.volume() / points.len() as f64;
    let weights = vec![weight; points.len()];
    (points, weights)
}

pub fn green(frequency: f64, x: Point, y: Point) -> Complex64 {
    let r = (0..3).map(|i| (x[i] - y[i]).powi(2)).sum::<f64>().sqrt();
    Complex64::from_polar(1.0, 2.0 * PI * frequency * r) / (1.0 + r)
}

impl BornDriver {
    /// Field radiated by `sources` at `x`.
    fn radiate(
        &self,
        sources: &[Source],
        component: FieldComponent,
        frequency: f64,
        x: Point,
    ) -> Result<Complex64, SimulationError> {
        let mut field = Complex64::default();
        for source in sources {
            if source.component != component || !source.covers(frequency) {
                continue;
            }
            let (points, _) = sample(&source.region, self.cells);
            let amplitudes = source.profile.resolve(points.len())?;
            for (y, j) in points.iter().zip(&amplitudes) {
                field += green(frequency, x, *y) * j;
            }
        }
        Ok(field)
    }
}

impl RunDriver for BornDriver {
    fn execute(
        &mut self,
        kind: RunKind,
        design: &DesignFunction,
        sources: &[Source],
        recorders: &mut [FieldRecorder],
    ) -> Result<(), SimulationError> {
        if self.fail {
            return Err("born driver failure".into());
        }
        match kind {
            RunKind::Forward => self.forward_runs += 1,
            RunKind::Adjoint => self.adjoint_runs += 1,
        }

        let domain = design.basis().domain().clone();
        let (scatterers, scatterer_weights) = sample(&domain, self.cells);
        let strengths: Vec<f64> = scatterers
            .iter()
            .zip(&scatterer_weights)
            .map(|(x, w)| design.value_at(*x) * w)
            .collect();

        for recorder in recorders.iter_mut() {
            let (points, weights) = sample(recorder.region(), self.cells);
            let components = recorder.components().to_vec();
            let frequencies = recorder.frequencies().to_vec();

            let mut values =
                Vec::with_capacity(points.len() * components.len() * frequencies.len());
            for &frequency in &frequencies {
                for &component in &components {
                    let incident_at_scatterers = match kind {
                        RunKind::Forward => scatterers
                            .iter()
                            .map(|x| self.radiate(sources, component, frequency, *x))
                            .collect::<Result<Vec<_>, _>>()?,
                        RunKind::Adjoint => Vec::new(),
                    };
                    for &x in &points {
                        let mut field = self.radiate(sources, component, frequency, x)?;
                        if kind == RunKind::Forward && !domain.contains(x) {
                            for ((y, strength), incident) in scatterers
                                .iter()
                                .zip(&strengths)
                                .zip(&incident_at_scatterers)
                            {
                                field += green(frequency, x, *y) * incident * *strength;
                            }
                        }
                        values.push(field);
                    }
                }
            }

            let data = FieldData::from_vec(points, weights, components, frequencies, values);
            recorder.store(kind, data)?;
        }
        Ok(())
    }
}

/// Line design region along x, point source to the left, point port to the
/// upper right, one quantity `q1` of the given kind.
pub fn line_setup(basis: impl Into<BasisSpec>, kind: QuantityKind) -> ProblemSetup {
    let source = Source::uniform(
        Region::named("source", [-1.5, 0.0, 0.0], [0.0, 0.5, 0.0]),
        FieldComponent::Ez,
        1.0,
        0.2,
        Complex64::new(1.0, 0.0),
    );
    ProblemSetup::new(vec![source], basis, "q1")
        .with_objective_region(Region::named("port", [1.5, 0.3, 0.0], [0.0; 3]))
        .with_quantity(QuantitySpec::new("q1", 0, FieldComponent::Ez, kind))
}

pub fn design_region() -> Region {
    Region::named("design", [0.0; 3], [1.0, 0.0, 0.0])
}
