//! Command-line parsing for the TFR forecaster.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    DEFAULT_CONFIDENCE_LEVEL, DEFAULT_HORIZON, DEFAULT_MAX_VALUE, DEFAULT_MIN_VALUE, DEFAULT_VALUE_FIELD,
    ForecastConfig, ModelOptions, Toggle,
};

pub const DEFAULT_HISTORICAL_DATA: &str = "data/fertility_poland_1939_2023.json";
pub const DEFAULT_PREDICTION_DATA: &str = "data/fertility_poland_prediction.json";

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "tfr", version, about = "Total Fertility Rate forecaster (HTTP API + batch)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Forecast a series from a JSON/CSV file and write the combined JSON.
    Predict(PredictArgs),
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Download the fertility-rate indicator from the World Bank API.
    Fetch(FetchArgs),
    /// Plot a combined output file in the terminal.
    Plot(PlotArgs),
}

/// Forecast options shared by `predict` and `serve`.
#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    /// Number of years to forecast.
    #[arg(long, env = "TFR_STEPS", default_value_t = DEFAULT_HORIZON)]
    pub steps: usize,

    /// Name of the value key in records.
    #[arg(long, default_value = DEFAULT_VALUE_FIELD)]
    pub value_field: String,

    /// Lower clamp for predicted values.
    #[arg(long, default_value_t = DEFAULT_MIN_VALUE, allow_negative_numbers = true)]
    pub min_value: f64,

    /// Upper clamp for predicted values.
    #[arg(long, default_value_t = DEFAULT_MAX_VALUE)]
    pub max_value: f64,

    /// Box-Cox transform before fitting.
    #[arg(long, value_enum, default_value_t = Toggle::Auto)]
    pub seasonal_transform: Toggle,

    /// Trend component.
    #[arg(long, value_enum, default_value_t = Toggle::Auto)]
    pub trend: Toggle,

    /// Damped trend.
    #[arg(long, value_enum, default_value_t = Toggle::Auto)]
    pub damped_trend: Toggle,

    /// Add prediction-interval bounds (`lower`/`upper`) to predicted records.
    #[arg(long)]
    pub intervals: bool,

    /// Confidence level of the bounds.
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE_LEVEL)]
    pub level: f64,
}

impl ForecastArgs {
    pub fn to_config(&self) -> ForecastConfig {
        ForecastConfig {
            horizon: self.steps,
            value_field: self.value_field.clone(),
            min_value: self.min_value,
            max_value: self.max_value,
            model: ModelOptions {
                seasonal_transform: self.seasonal_transform,
                trend: self.trend,
                damped_trend: self.damped_trend,
            },
            confidence_level: self.intervals.then_some(self.level),
        }
    }
}

#[derive(Debug, Args)]
pub struct PredictArgs {
    /// Historical series (JSON list of records, or CSV with `Year,FertilityRate`).
    #[arg(long, value_name = "PATH", default_value = DEFAULT_HISTORICAL_DATA)]
    pub input: PathBuf,

    /// Combined output JSON.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_PREDICTION_DATA)]
    pub output: PathBuf,

    #[command(flatten)]
    pub forecast: ForecastArgs,

    /// Render an ASCII plot in the terminal.
    #[arg(long)]
    pub plot: bool,

    /// Also write an SVG chart.
    #[arg(long, value_name = "SVG")]
    pub plot_output: Option<PathBuf>,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, env = "TFR_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "TFR_PORT", default_value_t = 5000)]
    pub port: u16,

    /// File served by `GET /getUnpredictedData`.
    #[arg(long, env = "TFR_HISTORICAL_DATA", value_name = "PATH", default_value = DEFAULT_HISTORICAL_DATA)]
    pub historical_data: PathBuf,

    /// File served by `GET /getData`.
    #[arg(long, env = "TFR_PREDICTION_DATA", value_name = "PATH", default_value = DEFAULT_PREDICTION_DATA)]
    pub prediction_data: PathBuf,

    #[command(flatten)]
    pub forecast: ForecastArgs,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// ISO country code.
    #[arg(long, default_value = "PL")]
    pub country: String,

    #[arg(long, default_value_t = 1939)]
    pub start: i64,

    #[arg(long, default_value_t = 2023)]
    pub end: i64,

    /// `.csv` writes `Year,FertilityRate`; anything else writes JSON records.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_HISTORICAL_DATA)]
    pub output: PathBuf,

    /// Name of the value key in JSON output.
    #[arg(long, default_value = DEFAULT_VALUE_FIELD)]
    pub value_field: String,
}

/// Options for plotting a saved output file.
#[derive(Debug, Args)]
pub struct PlotArgs {
    /// Combined JSON produced by `tfr predict`.
    #[arg(long, value_name = "JSON", default_value = DEFAULT_PREDICTION_DATA)]
    pub input: PathBuf,

    #[arg(long, default_value = DEFAULT_VALUE_FIELD)]
    pub value_field: String,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}
