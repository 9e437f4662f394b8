//! Box-Cox variance-stabilizing transform.
//!
//! - `w = (y^λ - 1) / λ` for `λ != 0`
//! - `w = ln(y)` for `λ = 0`
//!
//! Defined for `y > 0` only. The inverse clamps to 0 where `λ w + 1 <= 0`
//! (the transformed value has no real preimage there).

const LAMBDA_EPS: f64 = 1e-9;

pub fn box_cox(y: f64, lambda: f64) -> f64 {
    if lambda.abs() < LAMBDA_EPS {
        y.ln()
    } else {
        (y.powf(lambda) - 1.0) / lambda
    }
}

pub fn inv_box_cox(w: f64, lambda: f64) -> f64 {
    if lambda.abs() < LAMBDA_EPS {
        return w.exp();
    }
    let base = lambda * w + 1.0;
    if base <= 0.0 {
        0.0
    } else {
        base.powf(1.0 / lambda)
    }
}

/// Log-Jacobian term of the transform, `(λ - 1) Σ ln y`.
///
/// Likelihoods computed on transformed data must include it so that fits with
/// different `λ` (and untransformed fits, `λ = 1`) stay comparable.
pub fn log_jacobian(values: &[f64], lambda: f64) -> f64 {
    (lambda - 1.0) * values.iter().map(|y| y.ln()).sum::<f64>()
}
