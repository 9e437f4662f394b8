//! `tfr-forecast` library crate.
//!
//! The binary (`tfr`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the HTTP server and the batch CLI share one pipeline
//! - the forecasting model can be swapped behind `forecast::Forecaster`

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
pub mod server;
