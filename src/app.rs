//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - initialises logging and loads `.env`
//! - parses CLI arguments
//! - runs batch forecasts and prints reports/plots
//! - starts the HTTP server
//! - downloads source data

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, FetchArgs, PlotArgs, PredictArgs, ServeArgs};
use crate::data::{TFR_INDICATOR, WorldBankClient, write_points};
use crate::error::{AppError, ErrorKind};
use crate::forecast::Bats;
use crate::io::ingest::{Record, load_payload, validate_records};
use crate::io::store::write_json_file;
use crate::plot::{PlotData, render_ascii_plot, write_svg_chart};
use crate::server::{ServiceConfig, Server};

pub mod pipeline;

const DEFAULT_LOG_FILTER: &str = "tfr_forecast=info,tower_http=info";

/// Entry point for the `tfr` binary.
pub fn run() -> Result<(), AppError> {
    // Optional: a missing .env is fine.
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Predict(args) => handle_predict(args),
        Command::Serve(args) => handle_serve(args),
        Command::Fetch(args) => handle_fetch(args),
        Command::Plot(args) => handle_plot(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    // Logs go to stderr so reports on stdout stay pipeable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let config = args.forecast.to_config();
    config.validate()?;

    let payload = load_payload(&args.input, &config.value_field)?;
    let forecaster = Bats::new(config.model);
    let run = pipeline::run_forecast(payload, &config, &forecaster)?;

    write_json_file(&args.output, &run.records)?;
    info!(path = %args.output.display(), records = run.records.len(), "wrote predictions");

    println!("{}", crate::report::format_run_summary(&run, &config));

    if args.plot || args.plot_output.is_some() {
        let data = PlotData::from_records(&run.records, &config.value_field);
        if args.plot {
            println!("{}", render_ascii_plot(&data, args.width, args.height));
        }
        if let Some(path) = &args.plot_output {
            write_svg_chart(path, &data)?;
        }
    }

    Ok(())
}

fn handle_serve(args: ServeArgs) -> Result<(), AppError> {
    let config = ServiceConfig {
        host: args.host,
        port: args.port,
        historical_data: args.historical_data,
        prediction_data: args.prediction_data,
        forecast: args.forecast.to_config(),
    };
    let forecaster = Arc::new(Bats::new(config.forecast.model));
    let server = Server::new(config, forecaster)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to start async runtime: {e}")))?;

    runtime.block_on(server.serve())
}

fn handle_fetch(args: FetchArgs) -> Result<(), AppError> {
    let client = WorldBankClient::new();
    let points = client.fetch_indicator(&args.country, TFR_INDICATOR, args.start, args.end)?;

    let known = points.iter().filter(|p| p.value.is_some()).count();
    info!(
        country = %args.country,
        years = points.len(),
        known,
        "fetched fertility rates"
    );

    write_points(&args.output, &points, &args.value_field)?;
    println!("Saved {} years ({known} with data) to {}", points.len(), args.output.display());
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let records = read_records(&args)?;
    let data = PlotData::from_records(&records, &args.value_field);
    if data.is_empty() {
        return Err(AppError::new(
            ErrorKind::MalformedFile,
            format!("No numeric records to plot in '{}'.", args.input.display()),
        ));
    }

    println!("{}", render_ascii_plot(&data, args.width, args.height));
    Ok(())
}

fn read_records(args: &PlotArgs) -> Result<Vec<Record>, AppError> {
    let payload = load_payload(&args.input, &args.value_field)?;
    validate_records(payload, &args.value_field)
        .map_err(|e| AppError::new(ErrorKind::MalformedFile, format!("{}: {}", args.input.display(), e.message())))
}
