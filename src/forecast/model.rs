//! Forecasting model capability interface.
//!
//! The pipeline only needs two operations from a model:
//!
//! - `fit(values) -> handle` on a chronologically ordered series of values
//! - `handle.forecast(horizon) -> values` (optionally with interval bounds)
//!
//! Any implementation of these traits can replace the built-in BATS model
//! without touching normalization or assembly.

use std::fmt::Debug;

use crate::domain::Interval;
use crate::error::AppError;

/// A model family that can be fit to a series.
pub trait Forecaster: Send + Sync {
    /// Short model name for logs and reports.
    fn name(&self) -> &'static str;

    /// Fit to `values` (oldest first). Years are not passed: consecutive
    /// values are one time step apart.
    fn fit(&self, values: &[f64]) -> Result<Box<dyn FittedModel>, AppError>;
}

/// Opaque handle returned by [`Forecaster::fit`].
pub trait FittedModel: Send + Sync + Debug {
    /// Point forecasts for steps `1..=horizon`.
    fn forecast(&self, horizon: usize) -> Vec<f64>;

    /// Prediction intervals for steps `1..=horizon` at confidence `level`.
    fn forecast_intervals(&self, horizon: usize, level: f64) -> Vec<Interval>;

    /// Diagnostics describing the fitted model.
    fn summary(&self) -> ModelSummary;
}

/// Fit quality of one model configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FitDiagnostics {
    pub description: String,
    pub n: usize,
    /// Sum of squared one-step errors (in the fitted, possibly transformed, scale).
    pub sse: f64,
    /// In-sample one-step RMSE in the original scale.
    pub rmse: f64,
    pub aic: f64,
}

/// Diagnostics for a fitted model, including the configurations it beat.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSummary {
    pub model: String,
    pub chosen: FitDiagnostics,
    pub candidates: Vec<FitDiagnostics>,
    pub skipped: Vec<String>,
}
