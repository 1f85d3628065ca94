//! Adjoint gradient assembly.

use nalgebra::DVector;
use num_complex::Complex64;

use fieldgrad_core::{Basis, FieldData};

use crate::error::{Error, Result};

/// Assemble `df/dc_k` from forward and adjoint fields over the design region.
///
/// For each sample point the overlap `sum_f sum_c E_fwd E_adj` is formed
/// first, then
///
/// ```text
/// grad_k = scale * sum_p Re(overlap_p) w_p phi_k(p)
/// ```
///
/// with `w_p` the sample weight and `scale` the adjoint source
/// normalisation. The result always has `basis.dimension()` entries.
pub fn assemble_gradient(
    basis: &dyn Basis,
    forward: &FieldData,
    adjoint: &FieldData,
    scale: f64,
) -> Result<DVector<f64>> {
    if !forward.same_layout(adjoint) {
        return Err(Error::FieldLayout {
            region: basis.domain().label(),
            message: "forward and adjoint data sample different points, components or frequencies"
                .to_string(),
        });
    }

    let mut gradient = DVector::zeros(basis.dimension());
    let n = forward.len();
    if n == 0 {
        return Ok(gradient);
    }

    let mut overlap = vec![Complex64::default(); n];
    for (fwd, adj) in forward
        .as_slice()
        .chunks_exact(n)
        .zip(adjoint.as_slice().chunks_exact(n))
    {
        for ((acc, e_fwd), e_adj) in overlap.iter_mut().zip(fwd).zip(adj) {
            *acc += e_fwd * e_adj;
        }
    }

    for ((point, weight), value) in forward.points().iter().zip(forward.weights()).zip(&overlap) {
        let contribution = value.re * weight;
        if contribution == 0.0 {
            continue;
        }
        for (k, phi) in basis.shape_values(*point) {
            let entry = gradient.get_mut(k).ok_or(Error::IndexOutOfRange {
                index: k,
                dimension: basis.dimension(),
            })?;
            *entry += contribution * phi;
        }
    }

    gradient *= scale;
    Ok(gradient)
}
