//! Objective quantities and the adjoint sources they induce.
//!
//! Every quantity is a function of one complex overlap over an objective
//! region,
//!
//! ```text
//! a = sum_p w_p E_c(p) dV_p
//! ```
//!
//! where `w_p` is the quantity's weight profile, `E_c` the recorded
//! component at the quantity's frequency and `dV_p` the sample weight.
//! The derivative of the quantity is `dq = Re(c da)` for an adjoint
//! coefficient `c`, so an objective `F` is seeded into the adjoint run by a
//! current `dF/dq * c * w_p * dV_p` at every sample point.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use fieldgrad_core::{FieldComponent, FieldData, ObjectiveValue};

use crate::error::{Error, Result};
use crate::recorder::{FieldRecorder, RunKind};
use crate::source::{Source, SourceProfile};

/// How a quantity is derived from its overlap `a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityKind {
    /// `Re a`
    RealPart,
    /// `Im a`
    ImagPart,
    /// `|a|^2`
    Power,
}

impl QuantityKind {
    pub fn value(self, overlap: Complex64) -> f64 {
        match self {
            QuantityKind::RealPart => overlap.re,
            QuantityKind::ImagPart => overlap.im,
            QuantityKind::Power => overlap.norm_sqr(),
        }
    }

    /// The `c` with `dq = Re(c da)` at `overlap`.
    pub fn adjoint_coefficient(self, overlap: Complex64) -> Complex64 {
        match self {
            QuantityKind::RealPart => Complex64::new(1.0, 0.0),
            QuantityKind::ImagPart => Complex64::new(0.0, -1.0),
            QuantityKind::Power => 2.0 * overlap.conj(),
        }
    }
}

/// A named quantity measured on one objective region.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantitySpec {
    pub name: String,
    /// Index into the objective region list.
    pub region: usize,
    pub component: FieldComponent,
    /// Index into the recorded frequency list.
    pub frequency: usize,
    /// Weight profile `w_p`.
    pub profile: SourceProfile,
    pub kind: QuantityKind,
}

impl QuantitySpec {
    /// Uniform-weight quantity at the first recorded frequency.
    pub fn new(
        name: impl Into<String>,
        region: usize,
        component: FieldComponent,
        kind: QuantityKind,
    ) -> Self {
        Self {
            name: name.into(),
            region,
            component,
            frequency: 0,
            profile: SourceProfile::default(),
            kind,
        }
    }

    pub fn at_frequency(mut self, frequency: usize) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_profile(mut self, profile: SourceProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Overlap `a` of the recorded field with this quantity's profile.
    pub fn overlap(&self, data: &FieldData) -> Result<Complex64> {
        let field = self.field(data)?;
        let profile = self.profile.resolve(data.len())?;
        Ok(field
            .iter()
            .zip(&profile)
            .zip(data.weights())
            .map(|((e, w), dv)| w * e * *dv)
            .sum())
    }

    pub fn value(&self, overlap: Complex64) -> f64 {
        self.kind.value(overlap)
    }

    pub fn adjoint_coefficient(&self, overlap: Complex64) -> Complex64 {
        self.kind.adjoint_coefficient(overlap)
    }

    fn field<'a>(&self, data: &'a FieldData) -> Result<&'a [Complex64]> {
        data.values(self.frequency, self.component)
            .ok_or_else(|| Error::FieldLayout {
                region: format!("of quantity {}", self.name),
                message: format!(
                    "no {} data at frequency index {}",
                    self.component, self.frequency
                ),
            })
    }
}

/// Adjoint sources derived from one forward result.
///
/// Amplitudes are normalised so the largest has unit magnitude; `scale`
/// is the factor that was divided out.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjointSeed {
    pub sources: Vec<Source>,
    pub scale: f64,
}

impl AdjointSeed {
    /// Build adjoint sources for `objective` from the forward data held by
    /// the objective recorders.
    pub fn build(
        quantities: &[QuantitySpec],
        objective: &ObjectiveValue,
        recorders: &[FieldRecorder],
    ) -> Result<Self> {
        let mut sources = Vec::new();
        for quantity in quantities {
            let partial = objective.partial(&quantity.name);
            if partial == 0.0 {
                continue;
            }
            if !partial.is_finite() {
                return Err(non_finite_seed(&quantity.name, "objective derivative", partial));
            }
            let recorder = recorders.get(quantity.region).ok_or_else(|| {
                Error::Specification(format!(
                    "quantity {} refers to missing objective region {}",
                    quantity.name, quantity.region
                ))
            })?;
            let data = recorder.readout(RunKind::Forward)?;
            // Fails unless the component and frequency index exist in `data`.
            let overlap = quantity.overlap(data)?;
            let coefficient = partial * quantity.adjoint_coefficient(overlap);

            let profile = quantity.profile.resolve(data.len())?;
            let amplitudes: Vec<Complex64> = profile
                .iter()
                .zip(data.weights())
                .map(|(w, dv)| coefficient * w * *dv)
                .collect();
            if let Some(bad) = amplitudes.iter().find(|a| !a.is_finite()) {
                return Err(non_finite_seed(&quantity.name, "adjoint amplitude", bad));
            }

            let frequency = data.frequencies()[quantity.frequency];
            sources.push(Source {
                region: recorder.region().clone(),
                component: quantity.component,
                frequency,
                bandwidth: 0.0,
                profile: SourceProfile::Sampled(amplitudes),
            });
        }

        let scale = sources
            .iter()
            .map(|s| s.profile.max_magnitude())
            .fold(0.0, f64::max);
        if scale == 0.0 {
            return Ok(Self {
                sources: Vec::new(),
                scale,
            });
        }
        for source in &mut sources {
            source.profile.scale(1.0 / scale);
        }
        Ok(Self { sources, scale })
    }

    /// True when the objective is insensitive to every quantity.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

fn non_finite_seed(name: &str, what: &str, value: impl std::fmt::Display) -> Error {
    Error::Core(fieldgrad_core::Error::Evaluation(format!(
        "{} for quantity {} is {}",
        what, name, value
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldgrad_core::Region;
    use indexmap::IndexMap;

    fn line_data(values: &[Complex64]) -> FieldData {
        let n = values.len();
        let points = (0..n).map(|i| [i as f64, 0.0, 0.0]).collect();
        FieldData::from_vec(
            points,
            vec![0.5; n],
            vec![FieldComponent::Ez],
            vec![1.0],
            values.to_vec(),
        )
    }

    fn objective(pairs: &[(&str, f64)]) -> ObjectiveValue {
        let partials: IndexMap<String, f64> =
            pairs.iter().map(|(n, v)| (n.to_string(), *v)).collect();
        ObjectiveValue {
            value: 0.0,
            partials,
        }
    }

    fn recorder_with(values: &[Complex64]) -> FieldRecorder {
        let mut rec = FieldRecorder::new(
            Region::named("port", [2.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            vec![FieldComponent::Ez],
            vec![1.0],
        );
        rec.commit(RunKind::Forward, line_data(values));
        rec
    }

    #[test]
    fn test_overlap_uses_weights_and_profile() {
        let data = line_data(&[Complex64::new(1.0, 1.0), Complex64::new(2.0, 0.0)]);
        let uniform = QuantitySpec::new("q", 0, FieldComponent::Ez, QuantityKind::RealPart);
        assert_eq!(uniform.overlap(&data).unwrap(), Complex64::new(1.5, 0.5));

        let weighted = uniform.clone().with_profile(SourceProfile::Sampled(vec![
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 2.0),
        ]));
        assert_eq!(weighted.overlap(&data).unwrap(), Complex64::new(0.0, 2.0));
    }

    #[test]
    fn test_quantity_values() {
        let a = Complex64::new(3.0, -4.0);
        assert_eq!(QuantityKind::RealPart.value(a), 3.0);
        assert_eq!(QuantityKind::ImagPart.value(a), -4.0);
        assert_eq!(QuantityKind::Power.value(a), 25.0);
    }

    #[test]
    fn test_adjoint_coefficients_linearise_quantities() {
        let a = Complex64::new(0.3, -1.2);
        let da = Complex64::new(1e-7, 2e-7);
        for kind in [QuantityKind::RealPart, QuantityKind::ImagPart, QuantityKind::Power] {
            let exact = kind.value(a + da) - kind.value(a);
            let linear = (kind.adjoint_coefficient(a) * da).re;
            assert!(
                (exact - linear).abs() < 1e-12,
                "{:?}: {} vs {}",
                kind,
                exact,
                linear
            );
        }
    }

    #[test]
    fn test_missing_component_is_layout_error() {
        let data = line_data(&[Complex64::new(1.0, 0.0)]);
        let q = QuantitySpec::new("q", 0, FieldComponent::Hx, QuantityKind::Power);
        assert!(matches!(q.overlap(&data), Err(Error::FieldLayout { .. })));
    }

    #[test]
    fn test_seed_normalised() {
        let rec = recorder_with(&[Complex64::new(1.0, 0.0), Complex64::new(2.0, 0.0)]);
        let q = QuantitySpec::new("q", 0, FieldComponent::Ez, QuantityKind::RealPart);
        let seed = AdjointSeed::build(&[q], &objective(&[("q", 4.0)]), &[rec]).unwrap();

        // raw amplitudes: 4 * 1 * 1 * 0.5 = 2 at both points
        assert_eq!(seed.scale, 2.0);
        assert_eq!(seed.sources.len(), 1);
        assert_eq!(seed.sources[0].frequency, 1.0);
        assert_eq!(
            seed.sources[0].profile,
            SourceProfile::Sampled(vec![Complex64::new(1.0, 0.0); 2])
        );
    }

    #[test]
    fn test_seed_skips_insensitive_quantities() {
        let rec = recorder_with(&[Complex64::new(1.0, 0.0)]);
        let q1 = QuantitySpec::new("q1", 0, FieldComponent::Ez, QuantityKind::Power);
        let q2 = QuantitySpec::new("q2", 0, FieldComponent::Ez, QuantityKind::ImagPart);
        let seed = AdjointSeed::build(&[q1, q2], &objective(&[("q2", -1.0)]), &[rec]).unwrap();
        assert_eq!(seed.sources.len(), 1);
        // -1 * (-i) * 0.5 = 0.5i
        assert_eq!(seed.scale, 0.5);
        assert_eq!(
            seed.sources[0].profile,
            SourceProfile::Sampled(vec![Complex64::new(0.0, 1.0)])
        );
    }

    #[test]
    fn test_seed_empty_when_objective_constant() {
        let rec = recorder_with(&[Complex64::new(1.0, 0.0)]);
        let q = QuantitySpec::new("q", 0, FieldComponent::Ez, QuantityKind::Power);
        let seed = AdjointSeed::build(&[q], &objective(&[]), &[rec]).unwrap();
        assert!(seed.is_empty());
        assert_eq!(seed.scale, 0.0);
    }

    #[test]
    fn test_seed_rejects_non_finite_derivatives() {
        let rec = recorder_with(&[Complex64::new(0.0, 0.0)]);
        for kind in [QuantityKind::RealPart, QuantityKind::Power] {
            let q = QuantitySpec::new("q1", 0, FieldComponent::Ez, kind);
            for partial in [f64::INFINITY, f64::NAN] {
                let err = AdjointSeed::build(
                    std::slice::from_ref(&q),
                    &objective(&[("q1", partial)]),
                    std::slice::from_ref(&rec),
                )
                .unwrap_err();
                assert!(matches!(
                    err,
                    Error::Core(fieldgrad_core::Error::Evaluation(_))
                ));
            }
        }
    }

    #[test]
    fn test_seed_rejects_non_finite_field_data() {
        let rec = recorder_with(&[Complex64::new(f64::NAN, 0.0)]);
        let q = QuantitySpec::new("q1", 0, FieldComponent::Ez, QuantityKind::Power);
        let err = AdjointSeed::build(&[q], &objective(&[("q1", 1.0)]), &[rec]).unwrap_err();
        assert!(matches!(err, Error::Core(fieldgrad_core::Error::Evaluation(_))));
    }
}
