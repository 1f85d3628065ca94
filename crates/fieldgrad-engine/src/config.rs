//! Configuration for adjoint problems.
//!
//! Every default used to resolve convenience arguments lives here and is
//! passed explicitly into construction.

use serde::{Deserialize, Serialize};

use fieldgrad_core::{BasisDefaults, FieldComponent};

/// Settings used when building an [`OptimizationProblem`](crate::OptimizationProblem).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjointConfig {
    /// Basis construction for bare design regions.
    pub basis: BasisDefaults,
    /// Source construction for bare source regions.
    pub source: SourceDefaults,
    /// Number of frequencies recorded across `fcen ± df/2`.
    pub nfreq: usize,
    /// Step selection for finite-difference gradient checks.
    pub finite_difference: FiniteDifferenceConfig,
}

impl Default for AdjointConfig {
    fn default() -> Self {
        Self {
            basis: BasisDefaults::default(),
            source: SourceDefaults::default(),
            nfreq: 1,
            finite_difference: FiniteDifferenceConfig::default(),
        }
    }
}

impl AdjointConfig {
    /// Recorded frequencies: `fcen` alone, or `nfreq` evenly spaced points
    /// spanning `[fcen - df/2, fcen + df/2]`.
    pub fn frequencies(&self) -> Vec<f64> {
        let SourceDefaults { fcen, df, .. } = self.source;
        if self.nfreq <= 1 {
            return vec![fcen];
        }
        let start = fcen - 0.5 * df;
        let step = df / (self.nfreq - 1) as f64;
        (0..self.nfreq).map(|i| start + step * i as f64).collect()
    }
}

/// Defaults for a source built from a bare region.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceDefaults {
    /// Center frequency.
    pub fcen: f64,
    /// Frequency width.
    pub df: f64,
    pub component: FieldComponent,
    pub amplitude: f64,
}

impl Default for SourceDefaults {
    fn default() -> Self {
        Self {
            fcen: 1.0,
            df: 0.2,
            component: FieldComponent::Ez,
            amplitude: 1.0,
        }
    }
}

/// Perturbation sizes for finite-difference checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FiniteDifferenceConfig {
    /// Relative perturbation.
    pub delta_ratio: f64,
    /// Minimum absolute perturbation (used when the coefficient is near zero).
    pub delta_min: f64,
}

impl Default for FiniteDifferenceConfig {
    fn default() -> Self {
        Self {
            delta_ratio: 1e-4,
            delta_min: 1e-6,
        }
    }
}

impl FiniteDifferenceConfig {
    /// Compute the perturbation delta for a given coefficient value.
    pub fn compute_delta(&self, value: f64) -> f64 {
        let abs_delta = (value.abs() * self.delta_ratio).max(self.delta_min);
        if value >= 0.0 { abs_delta } else { -abs_delta }
    }
}
