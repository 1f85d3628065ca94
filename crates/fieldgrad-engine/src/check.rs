//! Finite-difference verification of adjoint gradients.

use nalgebra::DVector;

use crate::config::FiniteDifferenceConfig;
use crate::driver::RunDriver;
use crate::error::{Error, Result};
use crate::problem::{OptimizationProblem, Query};

/// Adjoint and finite-difference derivative for one coefficient.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientCheck {
    pub index: usize,
    pub adjoint: f64,
    pub finite_difference: f64,
    /// `|adjoint - fd| / max(|adjoint|, |fd|)`, zero when both vanish.
    pub relative_error: f64,
}

/// Compare the adjoint gradient with forward differences at the current
/// design for each coefficient in `indices`.
///
/// Each finite difference costs one forward run. The original coefficients
/// are restored afterwards, also when a run fails.
pub fn check_gradient<D: RunDriver>(
    problem: &mut OptimizationProblem<D>,
    config: &FiniteDifferenceConfig,
    indices: &[usize],
) -> Result<Vec<GradientCheck>> {
    let dimension = problem.basis().dimension();
    if let Some(&index) = indices.iter().find(|&&index| index >= dimension) {
        return Err(Error::IndexOutOfRange { index, dimension });
    }

    let original = problem.coefficients().clone();
    let evaluation = problem.query(Query::new())?;
    let (Some(base), Some(gradient)) = (evaluation.objective(), evaluation.gradient) else {
        return Ok(Vec::new());
    };

    let result = finite_differences(problem, config, indices, &original, base, &gradient);
    problem.update(Some(original), None)?;
    result
}

fn finite_differences<D: RunDriver>(
    problem: &mut OptimizationProblem<D>,
    config: &FiniteDifferenceConfig,
    indices: &[usize],
    original: &DVector<f64>,
    base: f64,
    gradient: &DVector<f64>,
) -> Result<Vec<GradientCheck>> {
    let mut checks = Vec::with_capacity(indices.len());
    for &index in indices {
        let delta = config.compute_delta(original[index]);
        let mut perturbed = original.clone();
        perturbed[index] += delta;
        let value = problem.value_at(perturbed)?;

        let finite_difference = (value - base) / delta;
        let adjoint = gradient[index];
        let scale = adjoint.abs().max(finite_difference.abs());
        let relative_error = if scale == 0.0 {
            0.0
        } else {
            (adjoint - finite_difference).abs() / scale
        };
        log::debug!(
            "coefficient {}: adjoint {:e}, finite difference {:e}, relative error {:e}",
            index,
            adjoint,
            finite_difference,
            relative_error
        );
        checks.push(GradientCheck {
            index,
            adjoint,
            finite_difference,
            relative_error,
        });
    }
    Ok(checks)
}
