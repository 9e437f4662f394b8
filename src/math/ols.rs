//! Least squares helpers used to seed the smoothing state.
//!
//! The state-space model needs an initial level (and trend) before it can
//! filter the series. We estimate them by regressing the first few
//! observations on `[1, t]` (or on `[1]` for level-only models).
//!
//! Implementation choices:
//! - SVD solves the tall design robustly; nalgebra's `QR::solve` is meant for
//!   square systems and panics on non-square ones.
//! - The systems are tiny (a handful of rows, at most 2 columns).

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit `y_t = a + b t` for `t = 1..=n` and return `(a, b)`.
///
/// `a` is the extrapolated value at `t = 0`, i.e. the state just before the
/// first observation.
pub fn fit_line(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len();
    let x = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { (i + 1) as f64 });
    let y = DVector::from_column_slice(values);
    let beta = solve_least_squares(&x, &y)?;
    Some((beta[0], beta[1]))
}

/// Fit `y_t = a` and return `a`.
pub fn fit_level(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let x = DMatrix::from_element(values.len(), 1, 1.0);
    let y = DVector::from_column_slice(values);
    solve_least_squares(&x, &y).map(|beta| beta[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn line_intercept_is_the_value_before_the_first_point() {
        // y_t = 1.0 + 0.5 t  ->  1.5, 2.0, 2.5, 3.0
        let (a, b) = fit_line(&[1.5, 2.0, 2.5, 3.0]).unwrap();
        assert!((a - 1.0).abs() < 1e-10);
        assert!((b - 0.5).abs() < 1e-10);
    }

    #[test]
    fn level_is_the_mean() {
        let a = fit_level(&[1.0, 2.0, 6.0]).unwrap();
        assert!((a - 3.0).abs() < 1e-10);
        assert!(fit_level(&[]).is_none());
    }
}
