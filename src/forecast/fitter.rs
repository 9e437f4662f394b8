//! Fitting routine for a single model configuration.
//!
//! Given:
//! - observations `y_t` (already validated: finite, and positive when a
//!   Box-Cox exponent is set)
//! - a configuration (Box-Cox exponent, trend, damping)
//!
//! we:
//! - transform the series (`w_t`)
//! - seed the initial level/trend by least squares on the first observations
//! - run the error-correction filter for every grid candidate (parallel)
//! - keep the candidate with the lowest one-step SSE
//!
//! The filter (additive errors, transformed scale):
//!
//! ```text
//! ŵ_t = l_{t-1} + φ b_{t-1}
//! e_t = w_t - ŵ_t
//! l_t = ŵ_t + α e_t
//! b_t = φ b_{t-1} + β e_t
//! ```

use rayon::prelude::*;

use crate::forecast::grid::{SmoothingParams, param_grid};
use crate::math::{box_cox, fit_level, fit_line, inv_box_cox, log_jacobian};

/// Observations used to seed the initial state.
const INIT_WINDOW: usize = 5;

/// Which components a candidate model has.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentSpec {
    /// Box-Cox exponent; `None` fits the raw values.
    pub lambda: Option<f64>,
    pub trend: bool,
    /// Only meaningful with `trend`.
    pub damped: bool,
}

impl ComponentSpec {
    /// Number of estimated parameters (for information criteria).
    ///
    /// Level: `α`, `l0`. Trend: `β`, `b0`. Damping: `φ`. Transform: `λ`.
    pub fn param_count(&self) -> usize {
        let mut k = 2;
        if self.trend {
            k += 2;
            if self.damped {
                k += 1;
            }
        }
        if self.lambda.is_some() {
            k += 1;
        }
        k
    }

    /// Human-readable label for logs and reports.
    pub fn describe(&self) -> String {
        let components = match (self.trend, self.damped) {
            (false, _) => "level",
            (true, false) => "level+trend",
            (true, true) => "level+damped trend",
        };
        match self.lambda {
            Some(lambda) => format!("{components}, Box-Cox λ={lambda:.2}"),
            None => components.to_string(),
        }
    }

    pub fn transform(&self, y: f64) -> f64 {
        match self.lambda {
            Some(lambda) => box_cox(y, lambda),
            None => y,
        }
    }

    pub fn inverse(&self, w: f64) -> f64 {
        match self.lambda {
            Some(lambda) => inv_box_cox(w, lambda),
            None => w,
        }
    }
}

/// Filter state (transformed scale).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State {
    pub level: f64,
    pub trend: f64,
}

/// Best fit for a single configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecFit {
    pub spec: ComponentSpec,
    pub params: SmoothingParams,
    pub initial: State,
    /// State after the last observation; forecasts start here.
    pub last: State,
    pub n: usize,
    pub sse: f64,
    /// One-step RMSE in the original scale.
    pub rmse: f64,
    pub aic: f64,
}

impl SpecFit {
    /// Innovation variance estimate (transformed scale).
    pub fn sigma2(&self) -> f64 {
        self.sse / self.n as f64
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    idx: usize,
    params: SmoothingParams,
    sse: f64,
}

/// Fit one configuration by grid search. Returns `None` when no grid
/// candidate yields a finite filter run.
pub fn fit_spec(spec: ComponentSpec, values: &[f64]) -> Option<SpecFit> {
    let n = values.len();
    if n == 0 {
        return None;
    }

    let w: Vec<f64> = values.iter().map(|&y| spec.transform(y)).collect();
    if w.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let initial = initial_state(&w, spec.trend)?;
    let grid = param_grid(spec.trend, spec.damped);

    // Evaluate each parameter tuple independently (parallel).
    let candidates: Vec<Candidate> = grid
        .par_iter()
        .enumerate()
        .filter_map(|(idx, params)| {
            run_filter(&w, initial, params, spec.trend)
                .map(|(sse, _)| Candidate { idx, params: *params, sse })
        })
        .collect();

    // Deterministic selection: pick the minimum SSE; break ties by grid index.
    let best = candidates.iter().min_by(|a, b| {
        a.sse
            .partial_cmp(&b.sse)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.idx.cmp(&b.idx))
    })?;

    let (sse, last) = run_filter(&w, initial, &best.params, spec.trend)?;
    let rmse = original_scale_rmse(values, &w, initial, &best.params, spec);
    let aic = aic(n, sse, spec.param_count(), spec.lambda.map(|l| log_jacobian(values, l)));

    Some(SpecFit {
        spec,
        params: best.params,
        initial,
        last,
        n,
        sse,
        rmse,
        aic,
    })
}

/// AIC of a Gaussian one-step error model, corrected for the Box-Cox Jacobian.
///
/// `AIC = n ln(SSE/n) - 2 (λ-1) Σ ln y + 2k`
pub fn aic(n: usize, sse: f64, k: usize, log_jacobian: Option<f64>) -> f64 {
    let n_f = n as f64;
    let sse_per = (sse / n_f).max(1e-12);
    n_f * sse_per.ln() - 2.0 * log_jacobian.unwrap_or(0.0) + 2.0 * k as f64
}

fn initial_state(w: &[f64], trend: bool) -> Option<State> {
    let window = &w[..w.len().min(INIT_WINDOW)];
    if trend {
        let (level, slope) = fit_line(window)?;
        Some(State { level, trend: slope })
    } else {
        let level = fit_level(window)?;
        Some(State { level, trend: 0.0 })
    }
}

/// Run the filter; returns `(SSE, final state)` or `None` on numerical failure.
fn run_filter(w: &[f64], initial: State, params: &SmoothingParams, trend: bool) -> Option<(f64, State)> {
    let mut state = initial;
    if !trend {
        state.trend = 0.0;
    }

    let mut sse = 0.0;
    for &wt in w {
        let fitted = state.level + params.phi * state.trend;
        let err = wt - fitted;
        sse += err * err;
        state.level = fitted + params.alpha * err;
        if trend {
            state.trend = params.phi * state.trend + params.beta * err;
        }
    }

    if sse.is_finite() && state.level.is_finite() && state.trend.is_finite() {
        Some((sse, state))
    } else {
        None
    }
}

fn original_scale_rmse(
    values: &[f64],
    w: &[f64],
    initial: State,
    params: &SmoothingParams,
    spec: ComponentSpec,
) -> f64 {
    let mut state = initial;
    let mut sse = 0.0;
    for (&y, &wt) in values.iter().zip(w) {
        let fitted = state.level + params.phi * state.trend;
        let err = y - spec.inverse(fitted);
        sse += err * err;
        let e = wt - fitted;
        state.level = fitted + params.alpha * e;
        if spec.trend {
            state.trend = params.phi * state.trend + params.beta * e;
        }
    }
    (sse / values.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(lambda: Option<f64>, trend: bool, damped: bool) -> ComponentSpec {
        ComponentSpec { lambda, trend, damped }
    }

    #[test]
    fn param_counts() {
        assert_eq!(spec(None, false, false).param_count(), 2);
        assert_eq!(spec(None, true, false).param_count(), 4);
        assert_eq!(spec(None, true, true).param_count(), 5);
        assert_eq!(spec(Some(0.5), true, true).param_count(), 6);
        // Damping without trend adds nothing.
        assert_eq!(spec(None, false, true).param_count(), 2);
    }

    #[test]
    fn linear_series_is_fit_exactly_by_trend_model() {
        let values: Vec<f64> = (0..20).map(|i| 1.0 + 0.1 * i as f64).collect();
        let fit = fit_spec(spec(None, true, false), &values).unwrap();
        assert!(fit.sse < 1e-18, "sse={}", fit.sse);
        // Final state sits on the line: level = last value, slope = 0.1.
        assert!((fit.last.level - 2.9).abs() < 1e-9);
        assert!((fit.last.trend - 0.1).abs() < 1e-9);
    }

    #[test]
    fn constant_series_has_zero_error() {
        let values = vec![1.5; 8];
        let fit = fit_spec(spec(None, false, false), &values).unwrap();
        assert!(fit.sse < 1e-20);
        assert!(fit.aic.is_finite());
        assert!((fit.last.level - 1.5).abs() < 1e-12);
    }

    #[test]
    fn trend_model_beats_level_model_on_trending_data() {
        let values: Vec<f64> = (0..30)
            .map(|i| 2.5 - 0.03 * i as f64 + if i % 2 == 0 { 0.01 } else { -0.01 })
            .collect();
        let level = fit_spec(spec(None, false, false), &values).unwrap();
        let trend = fit_spec(spec(None, true, false), &values).unwrap();
        assert!(trend.aic < level.aic, "trend={} level={}", trend.aic, level.aic);
    }

    #[test]
    fn box_cox_fit_reports_original_scale_rmse() {
        let values: Vec<f64> = (0..15).map(|i| (0.2 + 0.05 * i as f64).exp()).collect();
        let fit = fit_spec(spec(Some(0.0), true, false), &values).unwrap();
        // Log of an exponential is linear: exact in the transformed scale.
        assert!(fit.sse < 1e-18);
        assert!(fit.rmse < 1e-8);
    }

    #[test]
    fn aic_penalizes_parameters() {
        assert!(aic(20, 1.0, 4, None) > aic(20, 1.0, 2, None));
        assert!((aic(10, 10.0, 2, None) - 4.0).abs() < 1e-12);
    }
}
