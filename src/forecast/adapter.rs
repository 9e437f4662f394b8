//! Forecast adapter: the pipeline's only contact with the model.
//!
//! Holds at most one fitted handle. `predict*` before `fit` is an error.

use tracing::debug;

use crate::domain::{Forecast, Series};
use crate::error::{AppError, ErrorKind};
use crate::forecast::model::{FittedModel, Forecaster, ModelSummary};

pub struct ForecastAdapter<'a> {
    forecaster: &'a dyn Forecaster,
    fitted: Option<Box<dyn FittedModel>>,
}

impl<'a> ForecastAdapter<'a> {
    pub fn new(forecaster: &'a dyn Forecaster) -> Self {
        Self { forecaster, fitted: None }
    }

    /// Fit the model to the series values in chronological order.
    pub fn fit(&mut self, series: &Series) -> Result<(), AppError> {
        let mut values = Vec::with_capacity(series.len());
        for point in &series.points {
            let Some(v) = point.value else {
                return Err(AppError::new(
                    ErrorKind::ModelFitting,
                    format!(
                        "Missing value for year {} could not be interpolated (leading or trailing gap)",
                        point.year
                    ),
                ));
            };
            values.push(v);
        }

        let fitted = self.forecaster.fit(&values).map_err(|e| {
            AppError::new(
                ErrorKind::ModelFitting,
                format!("{} model fitting failed: {}", self.forecaster.name(), e.message()),
            )
        })?;
        debug!(model = self.forecaster.name(), n = values.len(), "model fitted");

        self.fitted = Some(fitted);
        Ok(())
    }

    /// Point forecasts for the next `horizon` steps.
    pub fn predict(&self, horizon: usize) -> Result<Vec<f64>, AppError> {
        let fitted = self.fitted_for(horizon)?;
        let values = fitted.forecast(horizon);
        check_output(&values, horizon)?;
        Ok(values)
    }

    /// Point forecasts plus prediction-interval bounds at `level`.
    pub fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast, AppError> {
        let fitted = self.fitted_for(horizon)?;
        if !(level.is_finite() && level > 0.0 && level < 1.0) {
            return Err(AppError::new(
                ErrorKind::Config,
                format!("Confidence level must be in (0, 1), got {level}."),
            ));
        }

        let values = fitted.forecast(horizon);
        check_output(&values, horizon)?;

        let intervals = fitted.forecast_intervals(horizon, level);
        let bounds: Vec<f64> = intervals.iter().flat_map(|iv| [iv.lower, iv.upper]).collect();
        check_output(&bounds, 2 * horizon)?;

        Ok(Forecast {
            values,
            intervals: Some(intervals),
            level: Some(level),
        })
    }

    /// Diagnostics of the fitted model, if any.
    pub fn summary(&self) -> Option<ModelSummary> {
        self.fitted.as_ref().map(|f| f.summary())
    }

    fn fitted_for(&self, horizon: usize) -> Result<&dyn FittedModel, AppError> {
        let Some(fitted) = self.fitted.as_deref() else {
            return Err(AppError::new(
                ErrorKind::NotFitted,
                "Model must be trained before making predictions",
            ));
        };
        if horizon == 0 {
            return Err(AppError::new(
                ErrorKind::InvalidHorizon,
                "Forecast horizon must be a positive integer.",
            ));
        }
        Ok(fitted)
    }
}

fn check_output(values: &[f64], expected: usize) -> Result<(), AppError> {
    if values.len() != expected {
        return Err(AppError::new(
            ErrorKind::ModelFitting,
            format!("Model returned {} values, expected {expected}", values.len()),
        ));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(AppError::new(
            ErrorKind::ModelFitting,
            "Non-finite model output during forecasting.",
        ));
    }
    Ok(())
}
