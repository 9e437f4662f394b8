//! Shared forecast pipeline used by both the HTTP server and the CLI.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! payload -> normalize -> fit -> predict -> format -> clamp -> combine
//!
//! The front ends can then focus on transport (HTTP bodies vs files).

use serde_json::Value;
use tracing::info;

use crate::domain::{Forecast, ForecastConfig, Observation, Series};
use crate::error::{AppError, ErrorKind};
use crate::forecast::{ForecastAdapter, Forecaster, ModelSummary};
use crate::io::ingest::{Record, normalize};
use crate::report::{combine, format_predictions, validate};

/// All computed outputs of a single forecast run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Historical records followed by predicted ones (the response body).
    pub records: Vec<Record>,
    /// Predicted records after clamping.
    pub predictions: Vec<Observation>,
    pub summary: ModelSummary,
    /// The normalized series the model was fit to.
    pub series: Series,
    pub duplicate_years: Vec<i64>,
    pub interpolated: usize,
}

/// Execute the full pipeline on one payload.
pub fn run_forecast(
    payload: Value,
    config: &ForecastConfig,
    forecaster: &dyn Forecaster,
) -> Result<PipelineOutput, AppError> {
    config.validate()?;

    // 1) Validate and normalize the payload.
    let normalized = normalize(payload, &config.value_field)?;
    let series = normalized.series;

    // 2) Fit and forecast.
    let mut adapter = ForecastAdapter::new(forecaster);
    adapter.fit(&series)?;
    let forecast = match config.confidence_level {
        Some(level) => adapter.predict_with_intervals(config.horizon, level)?,
        None => Forecast {
            values: adapter.predict(config.horizon)?,
            intervals: None,
            level: None,
        },
    };
    let summary = adapter
        .summary()
        .ok_or_else(|| AppError::new(ErrorKind::NotFitted, "Model must be trained before making predictions"))?;

    // 3) Assemble: years, rounding, clamping, merge.
    // Years are bounded by the normalizer, so this cannot overflow.
    let first_year = series
        .last_year()
        .map(|y| y + 1)
        .ok_or_else(|| AppError::new(ErrorKind::InvalidInputShape, "Input list is empty"))?;
    let predictions = validate(
        format_predictions(&forecast, first_year),
        config.min_value,
        config.max_value,
    );
    let records = combine(normalized.records, &predictions, &config.value_field);

    info!(
        model = %summary.chosen.description,
        historical = series.len(),
        predicted = predictions.len(),
        first_predicted = first_year,
        "forecast complete"
    );

    Ok(PipelineOutput {
        records,
        predictions,
        summary,
        series,
        duplicate_years: normalized.duplicate_years,
        interpolated: normalized.interpolated,
    })
}
