//! Optional plotting capability.

use fieldgrad_core::{BasisMesh, DesignFunction, Region};

use crate::driver::SimulationError;
use crate::source::Source;

/// A geometry plotter. Mesh plotting is an optional capability queried
/// through [`Plotter::supports_mesh`].
pub trait Plotter {
    /// Draw the design function together with sources and objective regions.
    fn plot_geometry(
        &mut self,
        design: &DesignFunction,
        sources: &[Source],
        objective_regions: &[Region],
    ) -> Result<(), SimulationError>;

    fn supports_mesh(&self) -> bool {
        false
    }

    fn plot_mesh(&mut self, _mesh: &BasisMesh) -> Result<(), SimulationError> {
        Err("mesh plotting not supported".into())
    }
}
