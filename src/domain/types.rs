//! Shared domain types.
//!
//! These types are intentionally kept small and serializable so they can be:
//!
//! - passed between the normalizer, the model adapter and the assembler
//! - written to JSON output files
//! - built from CLI flags or environment variables

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorKind};

/// Wire name of the indicator value in request/response records.
pub const DEFAULT_VALUE_FIELD: &str = "tfr";

/// Number of years forecast when no horizon is given.
pub const DEFAULT_HORIZON: usize = 10;

/// Plausible range of a fertility rate (children per woman).
pub const DEFAULT_MIN_VALUE: f64 = 0.0;
pub const DEFAULT_MAX_VALUE: f64 = 10.0;

pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Accepted calendar years (inclusive).
pub const MIN_YEAR: i64 = 0;
pub const MAX_YEAR: i64 = 9999;

/// Keys written by the assembler; a value field may not reuse them.
pub const RESERVED_FIELDS: [&str; 4] = ["year", "predicted", "lower", "upper"];

/// Tri-state model option.
///
/// `Auto` leaves the decision to the model's own selection criterion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
    #[default]
    Auto,
    On,
    Off,
}

impl Toggle {
    /// Settings the model has to try for this option.
    pub fn candidates(self) -> &'static [bool] {
        match self {
            Toggle::Auto => &[false, true],
            Toggle::On => &[true],
            Toggle::Off => &[false],
        }
    }
}

/// Structural options passed to the forecasting model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOptions {
    /// Variance-stabilizing (Box-Cox) transform before fitting.
    pub seasonal_transform: Toggle,
    /// Fit a trend component.
    pub trend: Toggle,
    /// Let the trend decay toward zero over the horizon.
    pub damped_trend: Toggle,
}

/// One year of the normalized series.
///
/// `value` is `None` only where a gap could not be interpolated
/// (leading or trailing missing values).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub year: i64,
    pub value: Option<f64>,
}

/// Chronologically ordered series, the unit of work for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_year(&self) -> Option<i64> {
        self.points.first().map(|p| p.year)
    }

    pub fn last_year(&self) -> Option<i64> {
        self.points.last().map(|p| p.year)
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Number of points that still carry no value.
    pub fn missing(&self) -> usize {
        self.points.iter().filter(|p| p.value.is_none()).count()
    }
}

/// Prediction-interval bounds for one forecast step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

/// Raw model output: one value per future step, optionally with bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub values: Vec<f64>,
    pub intervals: Option<Vec<Interval>>,
    /// Confidence level of `intervals`.
    pub level: Option<f64>,
}

/// A model-generated record, before it is merged with the historical ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub year: i64,
    pub value: f64,
    pub predicted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<Interval>,
}

/// Everything one forecast run needs besides the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    pub horizon: usize,
    /// Name of the value key in records (`tfr` by default).
    pub value_field: String,
    pub min_value: f64,
    pub max_value: f64,
    pub model: ModelOptions,
    /// When set, predicted records carry interval bounds at this level.
    pub confidence_level: Option<f64>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            value_field: DEFAULT_VALUE_FIELD.to_string(),
            min_value: DEFAULT_MIN_VALUE,
            max_value: DEFAULT_MAX_VALUE,
            model: ModelOptions::default(),
            confidence_level: None,
        }
    }
}

impl ForecastConfig {
    /// Reject settings no run could succeed with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.horizon == 0 {
            return Err(AppError::new(
                ErrorKind::InvalidHorizon,
                "Forecast horizon must be a positive integer.",
            ));
        }
        if self.value_field.trim().is_empty() || RESERVED_FIELDS.contains(&self.value_field.as_str()) {
            return Err(AppError::new(
                ErrorKind::Config,
                format!("Invalid value field name '{}'.", self.value_field),
            ));
        }
        if !(self.min_value.is_finite() && self.max_value.is_finite() && self.min_value <= self.max_value) {
            return Err(AppError::new(
                ErrorKind::Config,
                format!(
                    "Invalid value bounds: min={}, max={} (must be finite and min<=max).",
                    self.min_value, self.max_value
                ),
            ));
        }
        if let Some(level) = self.confidence_level {
            if !(level.is_finite() && level > 0.0 && level < 1.0) {
                return Err(AppError::new(
                    ErrorKind::Config,
                    format!("Confidence level must be in (0, 1), got {level}."),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ForecastConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.horizon, 10);
        assert_eq!(config.value_field, "tfr");
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let config = ForecastConfig {
            horizon: 0,
            ..ForecastConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidHorizon);
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let config = ForecastConfig {
            min_value: 5.0,
            max_value: 1.0,
            ..ForecastConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::Config);
    }

    #[test]
    fn reserved_value_fields_are_rejected() {
        for name in ["year", "predicted", "lower", "upper", " "] {
            let config = ForecastConfig {
                value_field: name.to_string(),
                ..ForecastConfig::default()
            };
            let err = config.validate().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Config, "{name}");
            assert!(err.message().contains(name), "{}", err.message());
        }
    }

    #[test]
    fn toggle_candidates() {
        assert_eq!(Toggle::Auto.candidates(), &[false, true]);
        assert_eq!(Toggle::On.candidates(), &[true]);
        assert_eq!(Toggle::Off.candidates(), &[false]);
    }

    #[test]
    fn series_tracks_missing_values() {
        let series = Series {
            points: vec![
                SeriesPoint { year: 2000, value: None },
                SeriesPoint { year: 2001, value: Some(1.5) },
            ],
        };
        assert_eq!(series.missing(), 1);
        assert_eq!(series.first_year(), Some(2000));
        assert_eq!(series.last_year(), Some(2001));
    }
}
