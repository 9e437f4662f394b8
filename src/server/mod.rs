//! HTTP API.
//!
//! One `Server` is built from a validated `ServiceConfig` at startup and shared
//! with the handlers through axum `State`; nothing else is global.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::domain::ForecastConfig;
use crate::error::{AppError, ErrorKind};
use crate::forecast::Forecaster;

pub mod routes;

/// Everything the server needs, resolved from flags/environment.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Served by `GET /getUnpredictedData`.
    pub historical_data: PathBuf,
    /// Served by `GET /getData`.
    pub prediction_data: PathBuf,
    pub forecast: ForecastConfig,
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.host.trim().is_empty() {
            return Err(AppError::new(ErrorKind::Config, "Host must not be empty."));
        }
        self.forecast.validate()
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// State shared across handlers.
#[derive(Clone)]
pub struct Server {
    pub config: Arc<ServiceConfig>,
    pub forecaster: Arc<dyn Forecaster>,
}

impl Server {
    pub fn new(config: ServiceConfig, forecaster: Arc<dyn Forecaster>) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            forecaster,
        })
    }

    /// Router with all routes and middleware.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/health", get(routes::health))
            .route("/predictData", post(routes::predict_data))
            .route("/getUnpredictedData", get(routes::get_unpredicted_data))
            .route("/getData", get(routes::get_data))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(self.clone())
    }

    /// Bind and serve until Ctrl-C.
    pub async fn serve(self) -> Result<(), AppError> {
        let addr = self.config.addr();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to bind {addr}: {e}")))?;

        info!(
            "tfr-forecast v{} listening on {addr} (model: {})",
            env!("CARGO_PKG_VERSION"),
            self.forecaster.name()
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::new(ErrorKind::Io, format!("Server error: {e}")))
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            // Without a signal handler, run until the process is killed.
            warn!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    }
}
