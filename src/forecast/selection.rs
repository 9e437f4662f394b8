//! Model configuration selection using AIC with guardrails.
//!
//! Each enabled configuration (Box-Cox exponent × trend × damping) is fit and
//! scored by AIC. Selection rules:
//! 1. Exclude underdetermined configurations: require `n >= k + 1`
//! 2. Choose the configuration with minimum AIC
//! 3. If another configuration with fewer parameters is within 2 AIC points of
//!    the best, pick the simplest such configuration

use tracing::debug;

use crate::domain::{ModelOptions, Toggle};
use crate::error::{AppError, ErrorKind};
use crate::forecast::fitter::{ComponentSpec, SpecFit, fit_spec};
use crate::forecast::grid::LAMBDA_GRID;

/// Shortest series any configuration can be fit to.
pub const MIN_OBSERVATIONS: usize = 3;

/// Minimum number of extra observations beyond parameter count.
const MIN_N_BUFFER: usize = 1;

/// AIC difference under which the simpler configuration wins.
const SIMPLICITY_MARGIN: f64 = 2.0;

/// Output of fitting + selection.
#[derive(Debug, Clone)]
pub struct Selection {
    pub best: SpecFit,
    /// Fits for all attempted configurations (after guardrails).
    pub fits: Vec<SpecFit>,
    /// Configurations that were skipped and why (for diagnostics).
    pub skipped: Vec<String>,
}

/// Fit every configuration allowed by `options` and select the best one.
pub fn fit_and_select(values: &[f64], options: &ModelOptions) -> Result<Selection, AppError> {
    let n = values.len();
    if n < MIN_OBSERVATIONS {
        return Err(AppError::new(
            ErrorKind::ModelFitting,
            format!("Series too short: need at least {MIN_OBSERVATIONS} observations, got {n}"),
        ));
    }
    if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
        return Err(AppError::new(
            ErrorKind::ModelFitting,
            format!("Series contains a non-finite value at position {idx}"),
        ));
    }

    let mut skipped = Vec::new();
    let lambdas = lambda_candidates(values, options, &mut skipped)?;

    let mut fits = Vec::new();
    for spec in enumerate_specs(&lambdas, options) {
        let k = spec.param_count();
        if n < k + MIN_N_BUFFER {
            skipped.push(format!(
                "{}: underdetermined (n={n} < k+{MIN_N_BUFFER}={})",
                spec.describe(),
                k + MIN_N_BUFFER
            ));
            continue;
        }

        match fit_spec(spec, values) {
            Some(fit) => {
                debug!(config = %spec.describe(), aic = fit.aic, sse = fit.sse, "fitted configuration");
                fits.push(fit);
            }
            None => skipped.push(format!("{}: numerical failure", spec.describe())),
        }
    }

    if fits.is_empty() {
        let detail = if skipped.is_empty() {
            String::new()
        } else {
            format!(" ({})", skipped.join("; "))
        };
        return Err(AppError::new(
            ErrorKind::ModelFitting,
            format!("Insufficient data to fit any model configuration (n={n}){detail}"),
        ));
    }

    let best = select_by_aic(&fits);
    Ok(Selection { best, fits, skipped })
}

fn lambda_candidates(
    values: &[f64],
    options: &ModelOptions,
    skipped: &mut Vec<String>,
) -> Result<Vec<Option<f64>>, AppError> {
    let positive = values.iter().all(|&v| v > 0.0);
    let mut out = Vec::new();

    for &enabled in options.seasonal_transform.candidates() {
        if !enabled {
            out.push(None);
            continue;
        }
        if !positive {
            if options.seasonal_transform == Toggle::On {
                return Err(AppError::new(
                    ErrorKind::ModelFitting,
                    "Box-Cox transform requires strictly positive values",
                ));
            }
            skipped.push("Box-Cox: series has non-positive values".to_string());
            continue;
        }
        out.extend(LAMBDA_GRID.iter().map(|&l| Some(l)));
    }

    Ok(out)
}

fn enumerate_specs(lambdas: &[Option<f64>], options: &ModelOptions) -> Vec<ComponentSpec> {
    let mut specs = Vec::new();
    for &lambda in lambdas {
        for &trend in options.trend.candidates() {
            let damping: &[bool] = if trend { options.damped_trend.candidates() } else { &[false] };
            for &damped in damping {
                specs.push(ComponentSpec { lambda, trend, damped });
            }
        }
    }
    specs
}

fn select_by_aic(fits: &[SpecFit]) -> SpecFit {
    // Find minimum AIC (first wins on ties).
    let mut best = &fits[0];
    for f in &fits[1..] {
        if f.aic < best.aic {
            best = f;
        }
    }

    let best_aic = best.aic;

    // Prefer simplicity if within the margin: scan in order of increasing
    // parameter count (stable, so enumeration order breaks ties).
    let mut by_complexity: Vec<&SpecFit> = fits.iter().collect();
    by_complexity.sort_by_key(|f| f.spec.param_count());
    for f in by_complexity {
        if f.aic <= best_aic + SIMPLICITY_MARGIN {
            return f.clone();
        }
    }

    best.clone()
}
