//! Core data model for fieldgrad.
//!
//! This crate provides the pieces shared by the run engine and its
//! collaborators:
//! - Box-shaped regions and field components
//! - Frequency-domain field data recorded over a region
//! - Design bases and the design function a coefficient vector induces
//! - The objective evaluator interface

pub mod basis;
pub mod error;
pub mod field;
pub mod objective;
pub mod region;

pub use basis::{
    Basis, BasisDefaults, BasisMesh, BasisSpec, BoxBasis, DesignFunction, ElementType,
    SpatialFunction, expand,
};
pub use error::{Error, Result};
pub use field::FieldData;
pub use objective::{OBJECTIVE_NAME, ObjectiveEvaluator, ObjectiveValue, QuantityVector};
pub use region::{E_COMPONENTS, FieldComponent, Point, Region};
