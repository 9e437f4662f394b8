//! World Bank API integration for the fertility-rate indicator.

use std::collections::BTreeMap;
use std::path::Path;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::domain::SeriesPoint;
use crate::error::{AppError, ErrorKind};
use crate::io::store::write_json_file;

const BASE_URL: &str = "https://api.worldbank.org/v2/country";
const PER_PAGE: usize = 10000;

/// Total fertility rate (births per woman).
pub const TFR_INDICATOR: &str = "SP.DYN.TFRT.IN";

pub struct WorldBankClient {
    client: Client,
    base_url: String,
}

impl WorldBankClient {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Fetch `indicator` for `country` over `start..=end`, one point per year.
    ///
    /// Years the API does not report (or reports as null) come back as `None`.
    pub fn fetch_indicator(
        &self,
        country: &str,
        indicator: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<SeriesPoint>, AppError> {
        if start > end {
            return Err(AppError::new(
                ErrorKind::Config,
                format!("Invalid year range: start={start} > end={end}."),
            ));
        }

        let url = format!("{}/{country}/indicator/{indicator}", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("date", format!("{start}:{end}")),
                ("format", "json".to_string()),
                ("per_page", PER_PAGE.to_string()),
            ])
            .send()
            .map_err(|e| AppError::new(ErrorKind::Network, format!("World Bank request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                ErrorKind::Network,
                format!("World Bank request failed with status {}.", resp.status()),
            ));
        }

        let body: Value = resp
            .json()
            .map_err(|e| AppError::new(ErrorKind::Network, format!("Failed to parse World Bank response: {e}")))?;

        let rows = parse_response(body)?;
        debug!(rows = rows.len(), country, indicator, "fetched indicator rows");
        Ok(reindex(&rows, start, end))
    }
}

impl Default for WorldBankClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct Row {
    date: String,
    value: Option<f64>,
}

/// Extract `(year, value)` rows from the `[metadata, rows]` response shape.
fn parse_response(body: Value) -> Result<Vec<(i64, Option<f64>)>, AppError> {
    let Value::Array(mut parts) = body else {
        return Err(AppError::new(ErrorKind::Network, "Unexpected World Bank response shape."));
    };
    if parts.len() < 2 {
        // Errors come back as a single-element array with a `message` list.
        let detail = parts
            .first()
            .and_then(|meta| meta.get("message"))
            .map(|m| m.to_string())
            .unwrap_or_else(|| "no data".to_string());
        return Err(AppError::new(ErrorKind::Network, format!("World Bank returned no data: {detail}")));
    }

    let rows = match parts.swap_remove(1) {
        Value::Null => Vec::new(),
        other => serde_json::from_value::<Vec<Row>>(other)
            .map_err(|e| AppError::new(ErrorKind::Network, format!("Failed to parse World Bank rows: {e}")))?,
    };

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let year = row.date.trim().parse::<i64>().map_err(|e| {
            AppError::new(ErrorKind::Network, format!("Invalid World Bank date '{}': {e}", row.date))
        })?;
        out.push((year, row.value.filter(|v| v.is_finite())));
    }
    Ok(out)
}

/// One point per year of `start..=end`; years without a row get `None`.
fn reindex(rows: &[(i64, Option<f64>)], start: i64, end: i64) -> Vec<SeriesPoint> {
    let by_year: BTreeMap<i64, Option<f64>> = rows.iter().copied().collect();
    (start..=end)
        .map(|year| SeriesPoint {
            year,
            value: by_year.get(&year).copied().flatten(),
        })
        .collect()
}

/// Write fetched points as JSON records (`{year, <field>}`) or, for `.csv`
/// paths, as `Year,FertilityRate` rows with two decimals.
pub fn write_points(path: &Path, points: &[SeriesPoint], value_field: &str) -> Result<(), AppError> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        write_points_csv(path, points)?;
    } else {
        let records: Vec<Value> = points
            .iter()
            .map(|p| json!({ "year": p.year, value_field: p.value }))
            .collect();
        write_json_file(path, &records)?;
    }

    info!(path = %path.display(), points = points.len(), "wrote fetched series");
    Ok(())
}

fn write_points_csv(path: &Path, points: &[SeriesPoint]) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to create '{}': {e}", parent.display())))?;
    }

    let mut w = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to write '{}': {e}", path.display())))?;

    w.write_record(["Year", "FertilityRate"])
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to write CSV header: {e}")))?;
    for p in points {
        let value = p.value.map(|v| format!("{v:.2}")).unwrap_or_default();
        w.write_record([p.year.to_string(), value])
            .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to write CSV row: {e}")))?;
    }

    w.flush()
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to flush CSV: {e}")))?;
    Ok(())
}
