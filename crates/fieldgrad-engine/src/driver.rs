//! Interface to the field simulator.

use fieldgrad_core::DesignFunction;

use crate::recorder::{FieldRecorder, RunKind};
use crate::source::Source;

/// Failure reported by a [`RunDriver`].
pub type SimulationError = Box<dyn std::error::Error + Send + Sync>;

/// Executes one blocking simulation run.
///
/// The driver excites the given `sources` in a medium described by `design`
/// over the design region, and stores one dataset of the given `kind` in
/// every recorder. Recorders arrive empty.
///
/// A [`SourceProfile::Sampled`](crate::SourceProfile::Sampled) profile lists
/// amplitudes in the same point order the driver uses when recording the
/// source's region, so a driver must sample any given region identically
/// on every run.
pub trait RunDriver {
    fn execute(
        &mut self,
        kind: RunKind,
        design: &DesignFunction,
        sources: &[Source],
        recorders: &mut [FieldRecorder],
    ) -> Result<(), SimulationError>;
}

impl<D: RunDriver + ?Sized> RunDriver for Box<D> {
    fn execute(
        &mut self,
        kind: RunKind,
        design: &DesignFunction,
        sources: &[Source],
        recorders: &mut [FieldRecorder],
    ) -> Result<(), SimulationError> {
        (**self).execute(kind, design, sources, recorders)
    }
}

impl<D: RunDriver + ?Sized> RunDriver for &mut D {
    fn execute(
        &mut self,
        kind: RunKind,
        design: &DesignFunction,
        sources: &[Source],
        recorders: &mut [FieldRecorder],
    ) -> Result<(), SimulationError> {
        (**self).execute(kind, design, sources, recorders)
    }
}
