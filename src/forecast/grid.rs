//! Smoothing parameter grids.
//!
//! Parameters are estimated by a deterministic grid search rather than a
//! nonlinear optimizer:
//! - it cannot get stuck in local minima of the one-step error surface
//! - the same input always yields the same fit
//! - series are short (decades of annual data), so a few thousand filter
//!   passes cost milliseconds

/// Level smoothing values: 0.05, 0.10, ..., 0.95.
const ALPHA_GRID: [f64; 19] = [
    0.05, 0.1, 0.15, 0.2, 0.25, 0.3, 0.35, 0.4, 0.45, 0.5, 0.55, 0.6, 0.65, 0.7, 0.75, 0.8, 0.85, 0.9, 0.95,
];

/// Box-Cox exponents tried when the transform is enabled.
pub const LAMBDA_GRID: [f64; 4] = [0.0, 0.25, 0.5, 0.75];

/// Damping factors tried for damped-trend configurations.
pub const PHI_GRID: [f64; 5] = [0.8, 0.85, 0.9, 0.95, 0.98];

/// Trend smoothing values (filtered to `beta <= alpha`).
const BETA_GRID: [f64; 9] = [0.0, 0.01, 0.02, 0.05, 0.1, 0.15, 0.2, 0.3, 0.4];

/// Smoothing parameters for one candidate filter run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingParams {
    /// Level smoothing.
    pub alpha: f64,
    /// Trend smoothing (0 when the configuration has no trend).
    pub beta: f64,
    /// Trend damping (1 when undamped).
    pub phi: f64,
}

/// Parameter grid for a configuration with the given components.
pub fn param_grid(trend: bool, damped: bool) -> Vec<SmoothingParams> {
    if !trend {
        return ALPHA_GRID
            .into_iter()
            .map(|alpha| SmoothingParams { alpha, beta: 0.0, phi: 1.0 })
            .collect();
    }

    let phis: &[f64] = if damped { &PHI_GRID } else { &[1.0] };
    let mut out = Vec::new();
    for alpha in ALPHA_GRID {
        for &beta in BETA_GRID.iter().filter(|b| **b <= alpha) {
            for &phi in phis {
                out.push(SmoothingParams { alpha, beta, phi });
            }
        }
    }
    out
}
