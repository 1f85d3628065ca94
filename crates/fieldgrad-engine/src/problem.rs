//! The optimization facade.
//!
//! [`OptimizationProblem`] ties design updates to the run state machine and
//! exposes a single value/gradient query.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use nalgebra::DVector;

use fieldgrad_core::{
    Basis, BasisSpec, DesignFunction, E_COMPONENTS, FieldComponent, OBJECTIVE_NAME,
    ObjectiveEvaluator, QuantityVector, Region, SpatialFunction,
};
use fieldgrad_expr::ObjectiveFunction;

use crate::config::AdjointConfig;
use crate::design::{Design, DesignUpdate};
use crate::driver::RunDriver;
use crate::error::{Error, Result};
use crate::quantity::QuantitySpec;
use crate::recorder::FieldRecorder;
use crate::source::SourceSpec;
use crate::stepper::{RunState, RunStats, RunWarning, Stepper};
use crate::visualize::Plotter;

/// The objective: an expression over quantity names, or any evaluator.
pub enum ObjectiveSpec {
    Expression(String),
    Evaluator(Box<dyn ObjectiveEvaluator>),
}

impl ObjectiveSpec {
    fn resolve(self) -> Result<Box<dyn ObjectiveEvaluator>> {
        match self {
            ObjectiveSpec::Expression(source) => Ok(Box::new(ObjectiveFunction::parse(&source)?)),
            ObjectiveSpec::Evaluator(evaluator) => Ok(evaluator),
        }
    }
}

impl From<&str> for ObjectiveSpec {
    fn from(source: &str) -> Self {
        ObjectiveSpec::Expression(source.to_string())
    }
}

impl From<String> for ObjectiveSpec {
    fn from(source: String) -> Self {
        ObjectiveSpec::Expression(source)
    }
}

impl fmt::Debug for ObjectiveSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectiveSpec::Expression(source) => f.debug_tuple("Expression").field(source).finish(),
            ObjectiveSpec::Evaluator(_) => f.write_str("Evaluator(..)"),
        }
    }
}

/// Everything needed to build an [`OptimizationProblem`].
#[derive(Debug)]
pub struct ProblemSetup {
    pub sources: SourceSpec,
    pub objective_regions: Vec<Region>,
    pub basis: BasisSpec,
    pub objective: ObjectiveSpec,
    pub quantities: Vec<QuantitySpec>,
    /// Starting coefficients; zeros when absent.
    pub initial_coefficients: Option<DVector<f64>>,
    pub config: AdjointConfig,
}

impl ProblemSetup {
    pub fn new(
        sources: impl Into<SourceSpec>,
        basis: impl Into<BasisSpec>,
        objective: impl Into<ObjectiveSpec>,
    ) -> Self {
        Self {
            sources: sources.into(),
            objective_regions: Vec::new(),
            basis: basis.into(),
            objective: objective.into(),
            quantities: Vec::new(),
            initial_coefficients: None,
            config: AdjointConfig::default(),
        }
    }

    pub fn with_objective_region(mut self, region: Region) -> Self {
        self.objective_regions.push(region);
        self
    }

    pub fn with_quantity(mut self, quantity: QuantitySpec) -> Self {
        self.quantities.push(quantity);
        self
    }

    pub fn with_initial_coefficients(mut self, coefficients: DVector<f64>) -> Self {
        self.initial_coefficients = Some(coefficients);
        self
    }

    pub fn with_config(mut self, config: AdjointConfig) -> Self {
        self.config = config;
        self
    }
}

/// A value/gradient request, optionally preceded by a design update.
pub struct Query<'a> {
    pub coefficients: Option<DVector<f64>>,
    pub function: Option<&'a dyn SpatialFunction>,
    pub need_value: bool,
    pub need_gradient: bool,
}

impl Default for Query<'_> {
    fn default() -> Self {
        Self {
            coefficients: None,
            function: None,
            need_value: true,
            need_gradient: true,
        }
    }
}

impl<'a> Query<'a> {
    /// Value and gradient at the current design.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value_only() -> Self {
        Self {
            need_gradient: false,
            ..Self::default()
        }
    }

    pub fn gradient_only() -> Self {
        Self {
            need_value: false,
            ..Self::default()
        }
    }

    pub fn with_coefficients(mut self, coefficients: DVector<f64>) -> Self {
        self.coefficients = Some(coefficients);
        self
    }

    pub fn with_function(mut self, function: &'a dyn SpatialFunction) -> Self {
        self.function = Some(function);
        self
    }

    pub fn need_value(mut self, need: bool) -> Self {
        self.need_value = need;
        self
    }

    pub fn need_gradient(mut self, need: bool) -> Self {
        self.need_gradient = need;
        self
    }
}

/// Result of a [`Query`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// Objective first, then every declared quantity; `None` unless requested.
    pub values: Option<QuantityVector>,
    /// `None` unless requested.
    pub gradient: Option<DVector<f64>>,
    pub warnings: Vec<RunWarning>,
}

impl Evaluation {
    /// Objective value, when values were requested.
    pub fn objective(&self) -> Option<f64> {
        self.values
            .as_ref()
            .and_then(|values| values.get(OBJECTIVE_NAME).copied())
    }
}

/// An adjoint optimization problem over a basis-expanded design.
#[derive(Debug)]
pub struct OptimizationProblem<D> {
    design: Design,
    objective_regions: Vec<Region>,
    stepper: Stepper<D>,
    config: AdjointConfig,
}

impl<D: RunDriver> OptimizationProblem<D> {
    /// Resolve and validate `setup`. Fails before any run is attempted.
    pub fn new(setup: ProblemSetup, driver: D) -> Result<Self> {
        let ProblemSetup {
            sources,
            objective_regions,
            basis,
            objective,
            quantities,
            initial_coefficients,
            config,
        } = setup;

        let basis = basis.resolve(&config.basis)?;
        let sources = sources.resolve(&config.source)?;
        let objective = objective.resolve()?;
        let frequencies = config.frequencies();

        validate_quantities(&quantities, &objective_regions, frequencies.len())?;
        validate_objective(objective.as_ref(), &quantities)?;

        let coefficients =
            initial_coefficients.unwrap_or_else(|| DVector::zeros(basis.dimension()));
        let design = Design::new(Arc::clone(&basis), coefficients)?;

        let design_recorder = FieldRecorder::new(
            basis.domain().clone(),
            E_COMPONENTS.to_vec(),
            frequencies.clone(),
        );
        let objective_recorders = objective_regions
            .iter()
            .enumerate()
            .map(|(index, region)| {
                FieldRecorder::new(
                    region.clone(),
                    recorded_components(&quantities, index),
                    frequencies.clone(),
                )
            })
            .collect();

        log::info!(
            "adjoint problem: {} coefficients over {}, {} sources, {} objective regions, {} quantities, {} frequencies",
            basis.dimension(),
            basis.domain().label(),
            sources.len(),
            objective_regions.len(),
            quantities.len(),
            frequencies.len()
        );

        let stepper = Stepper::new(
            driver,
            sources,
            quantities,
            objective,
            design_recorder,
            objective_recorders,
        );

        Ok(Self {
            design,
            objective_regions,
            stepper,
            config,
        })
    }

    /// Update the design if requested, then compute what the query asks for.
    ///
    /// A gradient-only query on a design with no forward run performs one
    /// first and reports [`RunWarning::ImplicitForwardRun`]. A query that asks
    /// for neither value nor gradient only applies the update.
    pub fn query(&mut self, query: Query<'_>) -> Result<Evaluation> {
        let Query {
            coefficients,
            function,
            need_value,
            need_gradient,
        } = query;

        if coefficients.is_some() || function.is_some() {
            self.update(coefficients, function)?;
        }

        let mut evaluation = Evaluation::default();
        if need_value {
            evaluation.values = Some(self.stepper.run_forward(self.design.function())?);
        }
        if need_gradient {
            let outcome = self.stepper.run_adjoint(self.design.function())?;
            evaluation.gradient = Some(outcome.gradient);
            evaluation.warnings.extend(outcome.warnings);
        }
        Ok(evaluation)
    }

    /// Replace the design. Exactly one of `coefficients` and `function`
    /// must be given; a function is projected onto the basis.
    pub fn update(
        &mut self,
        coefficients: Option<DVector<f64>>,
        function: Option<&dyn SpatialFunction>,
    ) -> Result<()> {
        let update = DesignUpdate::from_options(coefficients, function)?;
        self.design.update(update)?;
        self.stepper.reset();
        Ok(())
    }

    /// Objective value at `coefficients`.
    pub fn value_at(&mut self, coefficients: DVector<f64>) -> Result<f64> {
        let evaluation = self.query(Query::value_only().with_coefficients(coefficients))?;
        evaluation.objective().ok_or_else(|| {
            Error::Specification(format!("forward run produced no '{}' value", OBJECTIVE_NAME))
        })
    }

    /// Objective gradient at the current design.
    pub fn gradient(&mut self) -> Result<DVector<f64>> {
        let evaluation = self.query(Query::gradient_only())?;
        Ok(evaluation
            .gradient
            .unwrap_or_else(|| DVector::zeros(self.design.basis().dimension())))
    }

    pub fn state(&self) -> RunState {
        self.stepper.state()
    }

    pub fn stats(&self) -> RunStats {
        self.stepper.stats()
    }

    pub fn coefficients(&self) -> &DVector<f64> {
        self.design.coefficients()
    }

    pub fn design_function(&self) -> &DesignFunction {
        self.design.function()
    }

    pub fn basis(&self) -> &Arc<dyn Basis> {
        self.design.basis()
    }

    pub fn design(&self) -> &Design {
        &self.design
    }

    pub fn config(&self) -> &AdjointConfig {
        &self.config
    }

    pub fn objective_regions(&self) -> &[Region] {
        &self.objective_regions
    }

    pub fn stepper(&self) -> &Stepper<D> {
        &self.stepper
    }

    pub fn driver(&self) -> &D {
        self.stepper.driver()
    }

    pub fn driver_mut(&mut self) -> &mut D {
        self.stepper.driver_mut()
    }

    /// Plot the current geometry, and the basis mesh when `with_mesh` is set.
    ///
    /// Never triggers a run. Missing or failing mesh support is reported as
    /// a warning; only a geometry plot failure is an error.
    pub fn visualize(
        &self,
        plotter: &mut dyn Plotter,
        with_mesh: bool,
    ) -> Result<Vec<RunWarning>> {
        plotter
            .plot_geometry(
                self.design.function(),
                self.stepper.sources(),
                &self.objective_regions,
            )
            .map_err(Error::Visualization)?;

        let mut warnings = Vec::new();
        if !with_mesh {
            return Ok(warnings);
        }
        let warning = match self.basis().mesh() {
            Some(mesh) if plotter.supports_mesh() => match plotter.plot_mesh(&mesh) {
                Ok(()) => None,
                Err(err) => Some(RunWarning::MeshPlotFailed(err.to_string())),
            },
            _ => Some(RunWarning::MeshPlotUnavailable),
        };
        if let Some(warning) = warning {
            log::warn!("{}", warning);
            warnings.push(warning);
        }
        Ok(warnings)
    }
}

fn validate_quantities(
    quantities: &[QuantitySpec],
    objective_regions: &[Region],
    nfreq: usize,
) -> Result<()> {
    let mut names = HashSet::new();
    for quantity in quantities {
        if quantity.name == OBJECTIVE_NAME {
            return Err(Error::Specification(format!(
                "'{}' is reserved and cannot name a quantity",
                OBJECTIVE_NAME
            )));
        }
        if !names.insert(quantity.name.as_str()) {
            return Err(Error::Specification(format!(
                "quantity {} declared more than once",
                quantity.name
            )));
        }
        if quantity.region >= objective_regions.len() {
            return Err(Error::Specification(format!(
                "quantity {} refers to objective region {}, but only {} are defined",
                quantity.name,
                quantity.region,
                objective_regions.len()
            )));
        }
        if quantity.frequency >= nfreq {
            return Err(Error::Specification(format!(
                "quantity {} refers to frequency index {}, but only {} are recorded",
                quantity.name, quantity.frequency, nfreq
            )));
        }
    }
    Ok(())
}

fn validate_objective(objective: &dyn ObjectiveEvaluator, quantities: &[QuantitySpec]) -> Result<()> {
    let undeclared: Vec<String> = objective
        .quantity_names()
        .into_iter()
        .filter(|name| !quantities.iter().any(|q| &q.name == name))
        .collect();
    if !undeclared.is_empty() {
        return Err(Error::Specification(format!(
            "objective references undeclared quantities: {}",
            undeclared.join(", ")
        )));
    }
    Ok(())
}

/// Components measured by quantities on objective region `index`.
fn recorded_components(quantities: &[QuantitySpec], index: usize) -> Vec<FieldComponent> {
    FieldComponent::ALL
        .into_iter()
        .filter(|component| {
            quantities
                .iter()
                .any(|q| q.region == index && q.component == *component)
        })
        .collect()
}
