//! Forward/adjoint run management and adjoint gradient assembly.
//!
//! The engine drives an external field simulator through [`RunDriver`],
//! tracks which runs are valid for the current design, and combines forward
//! and adjoint fields into the derivative of an objective with respect to
//! every design coefficient.
//!
//! # Example
//!
//! ```ignore
//! use fieldgrad_engine::{OptimizationProblem, ProblemSetup, Query, QuantitySpec, QuantityKind};
//!
//! let setup = ProblemSetup::new(source_region, design_region, "abs(P)^2")
//!     .with_objective_region(port)
//!     .with_quantity(QuantitySpec::new("P", 0, FieldComponent::Ez, QuantityKind::RealPart));
//! let mut problem = OptimizationProblem::new(setup, driver)?;
//! let evaluation = problem.query(Query::new())?;
//! ```

pub mod check;
pub mod config;
pub mod design;
pub mod driver;
pub mod error;
pub mod gradient;
pub mod problem;
pub mod quantity;
pub mod recorder;
pub mod source;
pub mod stepper;
pub mod visualize;

pub use check::{GradientCheck, check_gradient};
pub use config::{AdjointConfig, FiniteDifferenceConfig, SourceDefaults};
pub use design::{Design, DesignUpdate};
pub use driver::{RunDriver, SimulationError};
pub use error::{Error, Result};
pub use gradient::assemble_gradient;
pub use problem::{Evaluation, ObjectiveSpec, OptimizationProblem, ProblemSetup, Query};
pub use quantity::{AdjointSeed, QuantityKind, QuantitySpec};
pub use recorder::{FieldRecorder, RunKind};
pub use source::{Source, SourceProfile, SourceSpec};
pub use stepper::{AdjointOutcome, RunState, RunStats, RunWarning, Stepper};
pub use visualize::Plotter;
