//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - model options (`Toggle`, `ModelOptions`)
//! - the normalized series (`Series`, `SeriesPoint`)
//! - forecast outputs (`Forecast`, `Observation`, `Interval`)
//! - per-run configuration (`ForecastConfig`)

pub mod types;

pub use types::*;
