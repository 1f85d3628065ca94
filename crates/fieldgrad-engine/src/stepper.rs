//! Forward/adjoint run sequencing.
//!
//! The stepper owns the field recorders and tracks which runs are valid for
//! the current design:
//!
//! ```text
//! Reset --run_forward--> ForwardComplete --run_adjoint--> AdjointComplete
//!   ^                          |  ^                             |
//!   +--------- reset ----------+  +-------- run_forward --------+
//! ```
//!
//! A run that fails leaves the state, the recorders and every cached result
//! exactly as they were before the call.

use std::fmt;

use nalgebra::DVector;

use fieldgrad_core::{
    DesignFunction, FieldData, OBJECTIVE_NAME, ObjectiveEvaluator, ObjectiveValue, QuantityVector,
};

use crate::driver::RunDriver;
use crate::error::{Error, Result};
use crate::gradient::assemble_gradient;
use crate::quantity::{AdjointSeed, QuantitySpec};
use crate::recorder::{FieldRecorder, RunKind};
use crate::source::Source;

/// Last completed stage for the current design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No run is valid for the current design.
    Reset,
    /// Forward fields and objective values are valid.
    ForwardComplete,
    /// Forward and adjoint results are valid.
    AdjointComplete,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Reset => write!(f, "reset"),
            RunState::ForwardComplete => write!(f, "forward complete"),
            RunState::AdjointComplete => write!(f, "adjoint complete"),
        }
    }
}

/// Non-fatal condition reported alongside a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunWarning {
    /// A gradient was requested with no forward run for the current design,
    /// so one was performed first.
    ImplicitForwardRun,
    /// Mesh plotting was requested but no mesh or mesh-capable plotter exists.
    MeshPlotUnavailable,
    /// The plotter failed to draw the mesh.
    MeshPlotFailed(String),
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunWarning::ImplicitForwardRun => {
                write!(f, "no forward run for the current design; running it first")
            }
            RunWarning::MeshPlotUnavailable => {
                write!(f, "mesh plotting unavailable; omitting mesh plot")
            }
            RunWarning::MeshPlotFailed(reason) => write!(f, "mesh plot failed: {}", reason),
        }
    }
}

/// Number of simulations executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub forward_runs: usize,
    pub adjoint_runs: usize,
}

/// Gradient produced by [`Stepper::run_adjoint`].
#[derive(Debug, Clone, PartialEq)]
pub struct AdjointOutcome {
    pub gradient: DVector<f64>,
    pub warnings: Vec<RunWarning>,
}

#[derive(Debug, Clone)]
struct ForwardResult {
    values: QuantityVector,
    objective: ObjectiveValue,
}

#[derive(Debug, Clone)]
enum Stage {
    Reset,
    Forward(ForwardResult),
    Adjoint {
        forward: ForwardResult,
        gradient: DVector<f64>,
    },
}

/// Drives forward and adjoint runs and caches their results.
///
/// Recorder 0 covers the design region and records all electric components;
/// recorder `i + 1` covers objective region `i`.
pub struct Stepper<D> {
    driver: D,
    sources: Vec<Source>,
    quantities: Vec<QuantitySpec>,
    objective: Box<dyn ObjectiveEvaluator>,
    recorders: Vec<FieldRecorder>,
    stage: Stage,
    stats: RunStats,
}

impl<D: RunDriver> Stepper<D> {
    pub fn new(
        driver: D,
        sources: Vec<Source>,
        quantities: Vec<QuantitySpec>,
        objective: Box<dyn ObjectiveEvaluator>,
        design_recorder: FieldRecorder,
        objective_recorders: Vec<FieldRecorder>,
    ) -> Self {
        let mut recorders = Vec::with_capacity(objective_recorders.len() + 1);
        recorders.push(design_recorder);
        recorders.extend(objective_recorders);
        Self {
            driver,
            sources,
            quantities,
            objective,
            recorders,
            stage: Stage::Reset,
            stats: RunStats::default(),
        }
    }

    pub fn state(&self) -> RunState {
        match self.stage {
            Stage::Reset => RunState::Reset,
            Stage::Forward(_) => RunState::ForwardComplete,
            Stage::Adjoint { .. } => RunState::AdjointComplete,
        }
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn quantities(&self) -> &[QuantitySpec] {
        &self.quantities
    }

    pub fn design_recorder(&self) -> &FieldRecorder {
        &self.recorders[0]
    }

    pub fn objective_recorders(&self) -> &[FieldRecorder] {
        &self.recorders[1..]
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Objective and quantity values of the last forward run, if still valid.
    pub fn values(&self) -> Option<&QuantityVector> {
        match &self.stage {
            Stage::Reset => None,
            Stage::Forward(forward) | Stage::Adjoint { forward, .. } => Some(&forward.values),
        }
    }

    /// Invalidate every result. Called whenever the design changes.
    pub fn reset(&mut self) {
        if self.state() != RunState::Reset {
            log::debug!("resetting from {}", self.state());
        }
        self.stage = Stage::Reset;
        for recorder in &mut self.recorders {
            recorder.clear();
        }
    }

    /// Run the forward simulation for `design`, evaluate every quantity and
    /// the objective.
    ///
    /// Always re-executes. The returned vector lists the objective first,
    /// then each quantity in declaration order.
    pub fn run_forward(&mut self, design: &DesignFunction) -> Result<QuantityVector> {
        log::debug!("starting forward run from state {}", self.state());
        let data = self.execute(RunKind::Forward, design, None)?;

        let mut quantities = QuantityVector::with_capacity(self.quantities.len());
        for quantity in &self.quantities {
            let region_data = data.get(quantity.region + 1).ok_or_else(|| {
                Error::Specification(format!(
                    "quantity {} refers to missing objective region {}",
                    quantity.name, quantity.region
                ))
            })?;
            let overlap = quantity.overlap(region_data)?;
            quantities.insert(quantity.name.clone(), quantity.value(overlap));
        }
        let objective = self.objective.evaluate(&quantities)?;

        let mut values = QuantityVector::with_capacity(quantities.len() + 1);
        values.insert(OBJECTIVE_NAME.to_string(), objective.value);
        values.extend(quantities);

        for (recorder, data) in self.recorders.iter_mut().zip(data) {
            recorder.commit(RunKind::Forward, data);
        }
        self.stats.forward_runs += 1;
        log::debug!("forward run complete: objective = {}", objective.value);

        self.stage = Stage::Forward(ForwardResult {
            values: values.clone(),
            objective,
        });
        Ok(values)
    }

    /// Gradient of the objective with respect to the design coefficients.
    ///
    /// Reuses a cached gradient when the adjoint run already completed for
    /// the current design. From `Reset` a forward run is performed first and
    /// [`RunWarning::ImplicitForwardRun`] is reported.
    pub fn run_adjoint(&mut self, design: &DesignFunction) -> Result<AdjointOutcome> {
        let mut warnings = Vec::new();
        if let Stage::Adjoint { gradient, .. } = &self.stage {
            log::debug!("reusing adjoint result for current design");
            return Ok(AdjointOutcome {
                gradient: gradient.clone(),
                warnings,
            });
        }
        if matches!(self.stage, Stage::Reset) {
            log::warn!("{}", RunWarning::ImplicitForwardRun);
            warnings.push(RunWarning::ImplicitForwardRun);
            self.run_forward(design)?;
        }

        let forward = match &self.stage {
            Stage::Forward(forward) => forward.clone(),
            Stage::Reset | Stage::Adjoint { .. } => {
                return Err(Error::MissingFieldData {
                    kind: RunKind::Forward,
                    region: self.recorders[0].region().label(),
                });
            }
        };

        let gradient = match self.adjoint_gradient(design, &forward) {
            Ok(gradient) => gradient,
            Err(err) => {
                if !warnings.is_empty() {
                    log::warn!(
                        "adjoint run failed after an implicit forward run; forward results kept: {}",
                        err
                    );
                }
                return Err(err);
            }
        };

        self.stage = Stage::Adjoint {
            forward,
            gradient: gradient.clone(),
        };
        Ok(AdjointOutcome { gradient, warnings })
    }

    /// Build the adjoint seed from `forward`, run it and assemble the
    /// gradient. Commits adjoint data only on success.
    fn adjoint_gradient(
        &mut self,
        design: &DesignFunction,
        forward: &ForwardResult,
    ) -> Result<DVector<f64>> {
        let basis = design.basis();
        let seed = AdjointSeed::build(&self.quantities, &forward.objective, &self.recorders[1..])?;
        if seed.is_empty() {
            log::debug!("objective is insensitive to every quantity; gradient is zero");
            return Ok(DVector::zeros(basis.dimension()));
        }

        log::debug!(
            "starting adjoint run with {} sources (scale {:e})",
            seed.sources.len(),
            seed.scale
        );
        let data = self.execute(RunKind::Adjoint, design, Some(seed.sources.as_slice()))?;
        let forward_design = self.recorders[0].readout(RunKind::Forward)?;
        let gradient = assemble_gradient(basis.as_ref(), forward_design, &data[0], seed.scale)?;

        for (recorder, data) in self.recorders.iter_mut().zip(data) {
            recorder.commit(RunKind::Adjoint, data);
        }
        self.stats.adjoint_runs += 1;
        log::debug!("adjoint run complete: |grad| = {:e}", gradient.norm());
        Ok(gradient)
    }

    /// Execute one run into blank recorders and return their data in
    /// recorder order. Nothing is committed here.
    fn execute(
        &mut self,
        kind: RunKind,
        design: &DesignFunction,
        sources: Option<&[Source]>,
    ) -> Result<Vec<FieldData>> {
        let mut scratch: Vec<FieldRecorder> =
            self.recorders.iter().map(FieldRecorder::blank).collect();
        let sources = sources.unwrap_or(self.sources.as_slice());

        self.driver
            .execute(kind, design, sources, &mut scratch)
            .map_err(|source| Error::Simulation { kind, source })?;

        scratch
            .iter_mut()
            .map(|recorder| {
                recorder.take(kind).ok_or_else(|| Error::MissingFieldData {
                    kind,
                    region: recorder.region().label(),
                })
            })
            .collect()
    }
}

impl<D> fmt::Debug for Stepper<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stepper")
            .field("state", &self.stage)
            .field("stats", &self.stats)
            .field("sources", &self.sources.len())
            .field("quantities", &self.quantities.len())
            .field("recorders", &self.recorders.len())
            .finish()
    }
}
