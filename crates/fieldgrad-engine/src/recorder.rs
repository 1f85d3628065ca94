//! Frequency-domain field recorders.
//!
//! A recorder is bound to a region, a component list and a frequency list.
//! It holds at most one dataset per run kind; every run of a kind replaces
//! the previous dataset of that kind.

use std::fmt;

use fieldgrad_core::{FieldComponent, FieldData, Region};

use crate::error::{Error, Result};

/// Which simulation a dataset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunKind {
    Forward,
    Adjoint,
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunKind::Forward => write!(f, "forward"),
            RunKind::Adjoint => write!(f, "adjoint"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldRecorder {
    region: Region,
    components: Vec<FieldComponent>,
    frequencies: Vec<f64>,
    forward: Option<FieldData>,
    adjoint: Option<FieldData>,
}

impl FieldRecorder {
    pub fn new(region: Region, components: Vec<FieldComponent>, frequencies: Vec<f64>) -> Self {
        Self {
            region,
            components,
            frequencies,
            forward: None,
            adjoint: None,
        }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn components(&self) -> &[FieldComponent] {
        &self.components
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// A recorder with the same binding and no data.
    pub fn blank(&self) -> Self {
        Self::new(
            self.region.clone(),
            self.components.clone(),
            self.frequencies.clone(),
        )
    }

    /// Store the dataset for `kind`, replacing any previous one.
    ///
    /// The dataset must carry exactly this recorder's components and frequencies.
    pub fn store(&mut self, kind: RunKind, data: FieldData) -> Result<()> {
        if data.components() != self.components.as_slice() {
            return Err(self.layout_error(format!(
                "expected components {:?}, got {:?}",
                self.components,
                data.components()
            )));
        }
        if data.frequencies() != self.frequencies.as_slice() {
            return Err(self.layout_error(format!(
                "expected {} frequencies {:?}, got {:?}",
                self.frequencies.len(),
                self.frequencies,
                data.frequencies()
            )));
        }
        *self.slot_mut(kind) = Some(data);
        Ok(())
    }

    /// Recorded data for `kind`.
    pub fn readout(&self, kind: RunKind) -> Result<&FieldData> {
        self.slot(kind).as_ref().ok_or_else(|| Error::MissingFieldData {
            kind,
            region: self.region.label(),
        })
    }

    pub fn has_data(&self, kind: RunKind) -> bool {
        self.slot(kind).is_some()
    }

    pub fn take(&mut self, kind: RunKind) -> Option<FieldData> {
        self.slot_mut(kind).take()
    }

    /// Drop all recorded data.
    pub fn clear(&mut self) {
        self.forward = None;
        self.adjoint = None;
    }

    /// Install already validated data. A new forward dataset invalidates
    /// the adjoint one.
    pub(crate) fn commit(&mut self, kind: RunKind, data: FieldData) {
        if kind == RunKind::Forward {
            self.adjoint = None;
        }
        *self.slot_mut(kind) = Some(data);
    }

    fn slot(&self, kind: RunKind) -> &Option<FieldData> {
        match kind {
            RunKind::Forward => &self.forward,
            RunKind::Adjoint => &self.adjoint,
        }
    }

    fn slot_mut(&mut self, kind: RunKind) -> &mut Option<FieldData> {
        match kind {
            RunKind::Forward => &mut self.forward,
            RunKind::Adjoint => &mut self.adjoint,
        }
    }

    fn layout_error(&self, message: String) -> Error {
        Error::FieldLayout {
            region: self.region.label(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldgrad_core::E_COMPONENTS;
    use num_complex::Complex64;

    fn recorder() -> FieldRecorder {
        FieldRecorder::new(
            Region::named("design", [0.0; 3], [1.0, 0.0, 0.0]),
            E_COMPONENTS.to_vec(),
            vec![1.0],
        )
    }

    fn data(value: f64) -> FieldData {
        FieldData::from_fn(
            vec![[0.0; 3], [0.5, 0.0, 0.0]],
            vec![0.5, 0.5],
            E_COMPONENTS.to_vec(),
            vec![1.0],
            |_, _, _| Complex64::new(value, 0.0),
        )
    }

    #[test]
    fn test_readout_before_run() {
        let rec = recorder();
        assert!(!rec.has_data(RunKind::Forward));
        assert!(matches!(
            rec.readout(RunKind::Adjoint),
            Err(Error::MissingFieldData {
                kind: RunKind::Adjoint,
                ..
            })
        ));
    }

    #[test]
    fn test_store_overwrites() {
        let mut rec = recorder();
        rec.store(RunKind::Forward, data(1.0)).unwrap();
        rec.store(RunKind::Forward, data(2.0)).unwrap();
        let out = rec.readout(RunKind::Forward).unwrap();
        assert_eq!(out.as_slice()[0], Complex64::new(2.0, 0.0));
    }

    #[test]
    fn test_store_rejects_wrong_layout() {
        let mut rec = recorder();
        let wrong = FieldData::zeros(
            vec![[0.0; 3]],
            vec![1.0],
            vec![FieldComponent::Hz],
            vec![1.0],
        );
        assert!(matches!(
            rec.store(RunKind::Forward, wrong),
            Err(Error::FieldLayout { .. })
        ));
        assert!(!rec.has_data(RunKind::Forward));
    }

    #[test]
    fn test_forward_commit_invalidates_adjoint() {
        let mut rec = recorder();
        rec.commit(RunKind::Forward, data(1.0));
        rec.commit(RunKind::Adjoint, data(3.0));
        assert!(rec.has_data(RunKind::Adjoint));

        rec.commit(RunKind::Forward, data(2.0));
        assert!(rec.has_data(RunKind::Forward));
        assert!(!rec.has_data(RunKind::Adjoint));
    }

    #[test]
    fn test_blank_keeps_binding() {
        let mut rec = recorder();
        rec.commit(RunKind::Forward, data(1.0));
        let blank = rec.blank();
        assert_eq!(blank.region(), rec.region());
        assert_eq!(blank.components(), rec.components());
        assert!(!blank.has_data(RunKind::Forward));
    }
}
