//! # fieldgrad
//!
//! Adjoint-method sensitivity analysis for designs described by a finite
//! vector of real coefficients.
//!
//! One forward and one adjoint field simulation give the derivative of a
//! scalar objective with respect to every coefficient. fieldgrad provides:
//! - Box-shaped finite-element design bases with L2 projection
//! - An objective expression language with symbolic partial derivatives
//! - A run state machine that sequences and caches forward/adjoint runs
//! - Adjoint gradient assembly and finite-difference verification
//!
//! The field simulator itself is supplied by the caller through
//! [`RunDriver`].
//!
//! ## Quick Start
//!
//! ```rust
//! use fieldgrad::prelude::*;
//!
//! let objective = ObjectiveFunction::parse("abs(P)^2 / (S + 1)").unwrap();
//! assert_eq!(objective.quantity_names(), vec!["P", "S"]);
//! ```
//!
//! ## Running an Optimization Step
//!
//! ```rust,ignore
//! use fieldgrad::prelude::*;
//!
//! let setup = ProblemSetup::new(source_region, design_region, "P")
//!     .with_objective_region(port)
//!     .with_quantity(QuantitySpec::new("P", 0, FieldComponent::Ez, QuantityKind::Power));
//! let mut problem = OptimizationProblem::new(setup, driver)?;
//!
//! // Value and gradient at the initial design
//! let evaluation = problem.query(Query::new())?;
//!
//! // Step and re-evaluate
//! let step = evaluation.gradient.unwrap() * 0.1;
//! let next = problem.coefficients() + step;
//! let value = problem.value_at(next)?;
//! let gradient = problem.gradient()?;
//! ```

// Re-export member crates
pub use fieldgrad_core as core;
pub use fieldgrad_engine as engine;
pub use fieldgrad_expr as expr;

// ============================================================================
// Convenient re-exports from fieldgrad_core
// ============================================================================

pub use fieldgrad_core::{
    // Basis
    Basis,
    BasisDefaults,
    BasisMesh,
    BasisSpec,
    BoxBasis,
    DesignFunction,
    E_COMPONENTS,
    ElementType,
    // Errors
    Error as CoreError,
    FieldComponent,
    // Field data
    FieldData,
    OBJECTIVE_NAME,
    // Objective interface
    ObjectiveEvaluator,
    ObjectiveValue,
    Point,
    QuantityVector,
    // Regions
    Region,
    SpatialFunction,
    expand,
};

// ============================================================================
// Convenient re-exports from fieldgrad_expr
// ============================================================================

pub use fieldgrad_expr::{
    EvalContext,
    // Errors
    Error as ExpressionError,
    Expr,
    ObjectiveFunction,
    parse_expression,
};

// ============================================================================
// Convenient re-exports from fieldgrad_engine
// ============================================================================

pub use fieldgrad_engine::{
    // Configuration
    AdjointConfig,
    AdjointOutcome,
    AdjointSeed,
    Design,
    DesignUpdate,
    // Errors
    Error,
    Evaluation,
    // Recorders
    FieldRecorder,
    FiniteDifferenceConfig,
    GradientCheck,
    ObjectiveSpec,
    // Facade
    OptimizationProblem,
    // Visualization
    Plotter,
    ProblemSetup,
    QuantityKind,
    // Quantities
    QuantitySpec,
    Query,
    Result,
    // Simulator interface
    RunDriver,
    RunKind,
    // State machine
    RunState,
    RunStats,
    RunWarning,
    SimulationError,
    // Sources
    Source,
    SourceDefaults,
    SourceProfile,
    SourceSpec,
    Stepper,
    // Gradient
    assemble_gradient,
    check_gradient,
};

// ============================================================================
// Re-export commonly used external types
// ============================================================================

/// Re-export of nalgebra's dynamic vector type.
pub use nalgebra::DVector;

/// Re-export of num_complex's double-precision complex type.
pub use num_complex::Complex64;

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Prelude module containing commonly used types and traits.
///
/// ```rust
/// use fieldgrad::prelude::*;
/// ```
pub mod prelude {
    // Geometry and design
    pub use crate::{
        Basis, BasisSpec, BoxBasis, DesignFunction, ElementType, FieldComponent, Point, Region,
        SpatialFunction,
    };

    // Objective
    pub use crate::{ObjectiveEvaluator, ObjectiveFunction};

    // Simulator interface
    pub use crate::{FieldData, FieldRecorder, RunDriver, RunKind, SimulationError, Source};

    // Problem
    pub use crate::{
        AdjointConfig, Evaluation, OptimizationProblem, ProblemSetup, QuantityKind, QuantitySpec,
        Query, RunState, RunWarning, check_gradient,
    };

    // Common external types
    pub use crate::{Complex64, DVector};
}
