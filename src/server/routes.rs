//! API route handlers

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::{error, warn};

use crate::app::pipeline::run_forecast;
use crate::error::{AppError, ErrorKind};
use crate::io::ingest::Record;
use crate::io::store::read_json_file;
use crate::server::Server;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else if self.kind() == ErrorKind::FileNotFound {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        if status.is_server_error() {
            error!(kind = ?self.kind(), "{}", self.message());
        } else {
            warn!(kind = ?self.kind(), "{}", self.message());
        }

        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

/// Liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// `POST /predictData`: historical records in, historical + predicted records out.
pub async fn predict_data(State(server): State<Server>, body: Bytes) -> Result<Json<Vec<Record>>, AppError> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::new(ErrorKind::InvalidInputShape, format!("Malformed JSON body: {e}")))?;

    // Fitting is CPU-bound; keep it off the async workers.
    let output = blocking(move || run_forecast(payload, &server.config.forecast, server.forecaster.as_ref())).await?;
    Ok(Json(output.records))
}

/// `GET /getUnpredictedData`: the stored historical series.
pub async fn get_unpredicted_data(State(server): State<Server>) -> Result<Json<Value>, AppError> {
    let path = server.config.historical_data.clone();
    blocking(move || read_json_file(&path)).await.map(Json)
}

/// `GET /getData`: the stored batch prediction output.
pub async fn get_data(State(server): State<Server>) -> Result<Json<Value>, AppError> {
    let path = server.config.prediction_data.clone();
    blocking(move || read_json_file(&path)).await.map(Json)
}

async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::new(ErrorKind::ModelFitting, format!("Worker task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::ForecastConfig;
    use crate::forecast::Bats;
    use crate::server::ServiceConfig;

    fn server(historical: PathBuf, prediction: PathBuf, horizon: usize) -> Server {
        let config = ServiceConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            historical_data: historical,
            prediction_data: prediction,
            forecast: ForecastConfig {
                horizon,
                ..ForecastConfig::default()
            },
        };
        Server::new(config, Arc::new(Bats::default())).unwrap()
    }

    fn default_server() -> Server {
        server(PathBuf::from("missing-historical.json"), PathBuf::from("missing-prediction.json"), 2)
    }

    async fn post(server: &Server, body: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri("/predictData")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(server, req).await
    }

    async fn get(server: &Server, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        send(server, req).await
    }

    async fn send(server: &Server, req: Request<Body>) -> (StatusCode, Value) {
        let resp = server.router().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap();
        (status, value)
    }

    #[tokio::test]
    async fn predict_three_points() {
        let body = r#"[{"year":2018,"tfr":1.4},{"year":2019,"tfr":1.42},{"year":2020,"tfr":1.38}]"#;
        let (status, value) = post(&default_server(), body).await;
        assert_eq!(status, StatusCode::OK);

        let records = value.as_array().unwrap();
        assert_eq!(records.len(), 5);
        assert_eq!(records[3]["year"], json!(2021));
        assert_eq!(records[4]["year"], json!(2022));
        assert_eq!(records[0]["predicted"], json!(false));
        assert_eq!(records[4]["predicted"], json!(true));
        for r in &records[3..] {
            let v = r["tfr"].as_f64().unwrap();
            assert!((0.0..=10.0).contains(&v));
        }
    }

    #[tokio::test]
    async fn object_body_is_bad_request() {
        let (status, value) = post(&default_server(), r#"{"year":2020,"tfr":1.4}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(value["error"].as_str().unwrap().contains("list"));
    }

    #[tokio::test]
    async fn missing_field_is_bad_request() {
        let (status, value) = post(&default_server(), r#"[{"year":2020,"tfr":1.4},{"year":2021}]"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(value["error"].as_str().unwrap().contains("tfr"));
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let (status, value) = post(&default_server(), "[{\"year\": 20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(value.get("error").is_some());
    }

    #[tokio::test]
    async fn model_failure_is_server_error() {
        let (status, value) = post(&default_server(), r#"[{"year":2020,"tfr":1.4}]"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(value["error"].as_str().is_some());
    }

    #[tokio::test]
    async fn missing_data_file_is_not_found() {
        let (status, _) = get(&default_server(), "/getUnpredictedData").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stored_files_are_served() {
        let dir = tempfile::tempdir().unwrap();
        let historical = dir.path().join("historical.json");
        let prediction = dir.path().join("prediction.json");
        std::fs::write(&historical, r#"[{"year":2020,"tfr":1.38}]"#).unwrap();
        std::fs::write(&prediction, "not json").unwrap();

        let server = server(historical, prediction, 2);
        let (status, value) = get(&server, "/getUnpredictedData").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value, json!([{"year": 2020, "tfr": 1.38}]));

        let (status, _) = get(&server, "/getData").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn health_reports_version() {
        let (status, value) = get(&default_server(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["status"], json!("alive"));
        assert_eq!(value["version"], json!(env!("CARGO_PKG_VERSION")));
    }
}
