//! Built-in BATS-style forecaster.
//!
//! Box-Cox transform, ARMA-free errors, Trend (optionally damped) on top of an
//! exponentially smoothed level. Annual demographic series carry no
//! seasonality, so no seasonal states are modelled.
//!
//! Options set to `auto` are resolved by AIC over all candidate configurations
//! (see `selection`).

use tracing::info;

use crate::domain::{Interval, ModelOptions};
use crate::error::AppError;
use crate::forecast::fitter::SpecFit;
use crate::forecast::model::{FitDiagnostics, FittedModel, Forecaster, ModelSummary};
use crate::forecast::selection::fit_and_select;
use crate::math::two_sided_z;

#[derive(Debug, Clone, Default)]
pub struct Bats {
    options: ModelOptions,
}

impl Bats {
    pub fn new(options: ModelOptions) -> Self {
        Self { options }
    }
}

impl Forecaster for Bats {
    fn name(&self) -> &'static str {
        "BATS"
    }

    fn fit(&self, values: &[f64]) -> Result<Box<dyn FittedModel>, AppError> {
        let selection = fit_and_select(values, &self.options)?;
        info!(
            model = %selection.best.spec.describe(),
            alpha = selection.best.params.alpha,
            beta = selection.best.params.beta,
            phi = selection.best.params.phi,
            aic = selection.best.aic,
            candidates = selection.fits.len(),
            "selected model configuration"
        );

        Ok(Box::new(FittedBats {
            best: selection.best,
            candidates: selection.fits,
            skipped: selection.skipped,
        }))
    }
}

/// Fitted BATS model; forecasts start from the state after the last observation.
#[derive(Debug, Clone)]
pub struct FittedBats {
    best: SpecFit,
    candidates: Vec<SpecFit>,
    skipped: Vec<String>,
}

impl FittedBats {
    /// Transformed-scale point forecasts `l + (φ + ... + φ^h) b`.
    fn transformed_path(&self, horizon: usize) -> Vec<f64> {
        let phi = self.best.params.phi;
        let mut phi_sum = 0.0;
        let mut phi_pow = 1.0;
        (0..horizon)
            .map(|_| {
                phi_pow *= phi;
                phi_sum += phi_pow;
                self.best.last.level + phi_sum * self.best.last.trend
            })
            .collect()
    }

    /// h-step forecast variance `σ² (1 + Σ_{j<h} c_j²)` with
    /// `c_j = α + β (φ + ... + φ^j)`.
    fn variances(&self, horizon: usize) -> Vec<f64> {
        let sigma2 = self.best.sigma2();
        let params = self.best.params;
        let trend = self.best.spec.trend;

        let mut out = Vec::with_capacity(horizon);
        let mut acc = 1.0;
        let mut phi_sum = 0.0;
        let mut phi_pow = 1.0;
        for _ in 0..horizon {
            out.push(sigma2 * acc);
            phi_pow *= params.phi;
            phi_sum += phi_pow;
            let c = if trend {
                params.alpha + params.beta * phi_sum
            } else {
                params.alpha
            };
            acc += c * c;
        }
        out
    }
}

impl FittedModel for FittedBats {
    fn forecast(&self, horizon: usize) -> Vec<f64> {
        self.transformed_path(horizon)
            .into_iter()
            .map(|w| self.best.spec.inverse(w))
            .collect()
    }

    fn forecast_intervals(&self, horizon: usize, level: f64) -> Vec<Interval> {
        let z = two_sided_z(level);
        self.transformed_path(horizon)
            .into_iter()
            .zip(self.variances(horizon))
            .map(|(w, var)| {
                let half = z * var.sqrt();
                // The inverse transform is monotone, so bounds map to bounds.
                Interval {
                    lower: self.best.spec.inverse(w - half),
                    upper: self.best.spec.inverse(w + half),
                }
            })
            .collect()
    }

    fn summary(&self) -> ModelSummary {
        ModelSummary {
            model: "BATS".to_string(),
            chosen: diagnostics(&self.best),
            candidates: self.candidates.iter().map(diagnostics).collect(),
            skipped: self.skipped.clone(),
        }
    }
}

fn diagnostics(fit: &SpecFit) -> FitDiagnostics {
    FitDiagnostics {
        description: format!(
            "{} (α={:.2}, β={:.2}, φ={:.2})",
            fit.spec.describe(),
            fit.params.alpha,
            fit.params.beta,
            fit.params.phi
        ),
        n: fit.n,
        sse: fit.sse,
        rmse: fit.rmse,
        aic: fit.aic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Toggle;

    fn linear(n: usize, start: f64, slope: f64) -> Vec<f64> {
        (0..n).map(|i| start + slope * i as f64).collect()
    }

    #[test]
    fn linear_series_extrapolates_linearly() {
        let options = ModelOptions {
            seasonal_transform: Toggle::Off,
            trend: Toggle::On,
            damped_trend: Toggle::Off,
        };
        let fitted = Bats::new(options).fit(&linear(20, 1.0, 0.1)).unwrap();
        let forecast = fitted.forecast(3);
        let expected = [3.0, 3.1, 3.2];
        for (got, want) in forecast.iter().zip(expected) {
            assert!((got - want).abs() < 1e-8, "got {got}, want {want}");
        }
    }

    #[test]
    fn damped_trend_flattens() {
        let options = ModelOptions {
            seasonal_transform: Toggle::Off,
            trend: Toggle::On,
            damped_trend: Toggle::On,
        };
        let values: Vec<f64> = (0..30)
            .map(|i| 2.0 - 0.02 * i as f64 + if i % 3 == 0 { 0.015 } else { -0.005 })
            .collect();
        let fitted = Bats::new(options).fit(&values).unwrap();
        let forecast = fitted.forecast(50);
        let early_step = forecast[1] - forecast[0];
        let late_step = forecast[49] - forecast[48];
        assert!(late_step.abs() < early_step.abs());
    }

    #[test]
    fn forecast_has_requested_length() {
        let fitted = Bats::default().fit(&[1.4, 1.42, 1.38]).unwrap();
        assert_eq!(fitted.forecast(2).len(), 2);
        assert_eq!(fitted.forecast_intervals(7, 0.95).len(), 7);
        assert!(fitted.forecast(0).is_empty());
    }

    #[test]
    fn intervals_bracket_and_widen() {
        let values: Vec<f64> = (0..25)
            .map(|i| 1.8 - 0.01 * i as f64 + if i % 2 == 0 { 0.03 } else { -0.03 })
            .collect();
        let fitted = Bats::default().fit(&values).unwrap();
        let points = fitted.forecast(5);
        let intervals = fitted.forecast_intervals(5, 0.95);

        for (p, iv) in points.iter().zip(&intervals) {
            assert!(iv.lower <= *p && *p <= iv.upper, "{iv:?} vs {p}");
        }
        let first = intervals[0].upper - intervals[0].lower;
        let last = intervals[4].upper - intervals[4].lower;
        assert!(last > first);
    }

    #[test]
    fn summary_lists_candidates() {
        let values = linear(12, 2.0, -0.05);
        let summary = Bats::default().fit(&values).unwrap().summary();
        assert_eq!(summary.model, "BATS");
        assert!(summary.candidates.len() > 1);
        assert!(summary.candidates.iter().any(|c| c.description == summary.chosen.description));
    }
}
