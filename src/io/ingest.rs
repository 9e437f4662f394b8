//! Payload validation and normalization.
//!
//! This module turns an arbitrary JSON payload (request body or file content)
//! into:
//!
//! - the validated historical records, in their original order (they are echoed
//!   back in the response)
//! - a chronologically ordered `Series` ready for the model
//!
//! Validation is strict on shape (list of objects with `year` + value field) and
//! lenient on content: values are clamped later, not rejected here.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use serde_json::{Map, Number, Value};
use tracing::{debug, warn};

use crate::domain::{MAX_YEAR, MIN_YEAR, Series, SeriesPoint};
use crate::error::{AppError, ErrorKind};
use crate::io::store::read_json_file;
use crate::report::round3;

/// A historical record exactly as supplied (unknown keys are kept).
pub type Record = Map<String, Value>;

/// Normalizer output.
#[derive(Debug, Clone)]
pub struct NormalizedInput {
    /// Validated records in their original (request) order.
    pub records: Vec<Record>,
    /// Sorted, rounded, interpolated series.
    pub series: Series,
    /// Years that occur more than once (kept, not merged).
    pub duplicate_years: Vec<i64>,
    /// Number of interior gaps filled by interpolation.
    pub interpolated: usize,
}

/// Validate a payload and build the model-ready series from it.
pub fn normalize(payload: Value, value_field: &str) -> Result<NormalizedInput, AppError> {
    let records = validate_records(payload, value_field)?;

    let mut points = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        let year = parse_year(record, idx)?;
        let value = parse_value(record, value_field, idx)?.map(round3);
        points.push(SeriesPoint { year, value });
    }

    // Stable: equal years keep their request order.
    points.sort_by_key(|p| p.year);

    let duplicate_years = find_duplicates(&points);
    if !duplicate_years.is_empty() {
        warn!(years = ?duplicate_years, "duplicate years in input; keeping all records");
    }

    let interpolated = interpolate_gaps(&mut points);
    let series = Series { points };
    debug!(
        n = series.len(),
        interpolated,
        missing = series.missing(),
        "normalized input series"
    );

    Ok(NormalizedInput {
        records,
        series,
        duplicate_years,
        interpolated,
    })
}

/// Check the payload shape: a non-empty list of objects with `year` and the value field.
pub fn validate_records(payload: Value, value_field: &str) -> Result<Vec<Record>, AppError> {
    let Value::Array(items) = payload else {
        return Err(AppError::new(
            ErrorKind::InvalidInputShape,
            format!("Input must be a list of year/{value_field} objects"),
        ));
    };
    if items.is_empty() {
        return Err(AppError::new(
            ErrorKind::InvalidInputShape,
            "Input list is empty; at least one record is required",
        ));
    }

    let mut records = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        let Value::Object(map) = item else {
            return Err(AppError::new(
                ErrorKind::MissingField,
                format!("Each item must contain 'year' and '{value_field}' fields (item {idx} is not an object)"),
            ));
        };

        let missing: Vec<&str> = ["year", value_field]
            .into_iter()
            .filter(|key| !map.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::new(
                ErrorKind::MissingField,
                format!("Item {idx} is missing required field(s): {}", missing.join(", ")),
            ));
        }

        records.push(map);
    }

    Ok(records)
}

/// Read a record-list payload from disk.
///
/// `.csv` files are converted into the same JSON shape the HTTP API accepts;
/// everything else is parsed as JSON.
pub fn load_payload(path: &Path, value_field: &str) -> Result<Value, AppError> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        load_csv_payload(path, value_field)
    } else {
        read_json_file(path)
    }
}

fn parse_year(record: &Record, idx: usize) -> Result<i64, AppError> {
    let year = match record.get("year") {
        Some(Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= MIN_YEAR as f64 && *f <= MAX_YEAR as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    };
    year.filter(|y| (MIN_YEAR..=MAX_YEAR).contains(y)).ok_or_else(|| {
        AppError::new(
            ErrorKind::InvalidFieldType,
            format!("Item {idx}: 'year' must be an integer between {MIN_YEAR} and {MAX_YEAR}"),
        )
    })
}

fn parse_value(record: &Record, value_field: &str, idx: usize) -> Result<Option<f64>, AppError> {
    match record.get(value_field) {
        Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        _ => Err(AppError::new(
            ErrorKind::InvalidFieldType,
            format!("Item {idx}: '{value_field}' must be a number or null"),
        )),
    }
}

fn find_duplicates(sorted: &[SeriesPoint]) -> Vec<i64> {
    let mut out: Vec<i64> = Vec::new();
    for pair in sorted.windows(2) {
        if pair[0].year == pair[1].year && out.last() != Some(&pair[0].year) {
            out.push(pair[0].year);
        }
    }
    out
}

/// Fill interior missing values by linear interpolation between the nearest
/// known neighbours (weighted by year distance). Leading and trailing gaps are
/// left as `None`.
///
/// Returns the number of filled points.
fn interpolate_gaps(points: &mut [SeriesPoint]) -> usize {
    let known: Vec<usize> = points
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.value.map(|_| i))
        .collect();

    let mut filled = 0;
    for pair in known.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if hi - lo < 2 {
            continue;
        }
        let (Some(v_lo), Some(v_hi)) = (points[lo].value, points[hi].value) else {
            continue;
        };
        let span_years = (points[hi].year - points[lo].year) as f64;
        let span_idx = (hi - lo) as f64;

        for k in (lo + 1)..hi {
            // Duplicated years collapse the year span; fall back to position.
            let u = if span_years > 0.0 {
                (points[k].year - points[lo].year) as f64 / span_years
            } else {
                (k - lo) as f64 / span_idx
            };
            points[k].value = Some(round3(v_lo + u * (v_hi - v_lo)));
            filled += 1;
        }
    }
    filled
}

fn load_csv_payload(path: &Path, value_field: &str) -> Result<Value, AppError> {
    let file = File::open(path).map_err(|e| open_error(path, e))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(ErrorKind::MalformedFile, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let year_col = *header_map.get("year").ok_or_else(|| {
        AppError::new(ErrorKind::MalformedFile, "Missing required CSV column: `year`")
    })?;
    let value_col = [value_field.to_ascii_lowercase().as_str(), "fertilityrate", "value"]
        .iter()
        .find_map(|name| header_map.get(*name).copied())
        .ok_or_else(|| {
            AppError::new(
                ErrorKind::MalformedFile,
                format!("Missing value column: expected `{value_field}`, `FertilityRate` or `value`"),
            )
        })?;

    let mut items = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: header line plus 1-based numbering.
        let line = idx + 2;
        let record = result
            .map_err(|e| AppError::new(ErrorKind::MalformedFile, format!("CSV parse error on line {line}: {e}")))?;

        let year_raw = record.get(year_col).unwrap_or("");
        let year: i64 = year_raw.parse().map_err(|_| {
            AppError::new(
                ErrorKind::MalformedFile,
                format!("Invalid year '{year_raw}' on line {line}"),
            )
        })?;

        let value = parse_csv_value(record.get(value_col).unwrap_or("")).map_err(|raw| {
            AppError::new(
                ErrorKind::MalformedFile,
                format!("Invalid value '{raw}' on line {line}"),
            )
        })?;

        let mut map = Map::new();
        map.insert("year".to_string(), Value::from(year));
        map.insert(
            value_field.to_string(),
            value.and_then(Number::from_f64).map(Value::Number).unwrap_or(Value::Null),
        );
        items.push(Value::Object(map));
    }

    Ok(Value::Array(items))
}

fn parse_csv_value(raw: &str) -> Result<Option<f64>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(trimmed.to_string()),
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn open_error(path: &Path, e: std::io::Error) -> AppError {
    if e.kind() == std::io::ErrorKind::NotFound {
        AppError::new(ErrorKind::FileNotFound, format!("Data file not found: '{}'", path.display()))
    } else {
        AppError::new(ErrorKind::Io, format!("Failed to open '{}': {e}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn rejects_non_list_payload() {
        let err = normalize(json!({"year": 2020, "tfr": 1.4}), "tfr").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInputShape);
        assert!(err.is_client_error());

        let err = normalize(json!(42), "tfr").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInputShape);
    }

    #[test]
    fn rejects_empty_list() {
        let err = normalize(json!([]), "tfr").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInputShape);
    }

    #[test]
    fn missing_field_names_the_field() {
        let err = normalize(json!([{"year": 2020, "tfr": 1.4}, {"year": 2021}]), "tfr").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingField);
        assert!(err.message().contains("tfr"), "{}", err.message());
        assert!(err.message().contains("Item 1"), "{}", err.message());

        let err = normalize(json!([{}]), "tfr").unwrap_err();
        assert!(err.message().contains("year, tfr"), "{}", err.message());
    }

    #[test]
    fn non_object_item_is_a_missing_field_error() {
        let err = normalize(json!([[2020, 1.4]]), "tfr").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingField);
    }

    #[test]
    fn wrong_types_are_rejected() {
        let err = normalize(json!([{"year": "2020", "tfr": 1.4}]), "tfr").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFieldType);

        let err = normalize(json!([{"year": 2020, "tfr": "high"}]), "tfr").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFieldType);
    }

    #[test]
    fn years_outside_the_calendar_range_are_rejected() {
        for year in [json!(-5), json!(10000), json!(1e19), json!(2020.5), json!(i64::MAX)] {
            let err = normalize(json!([{"year": year, "tfr": 1.4}]), "tfr").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidFieldType, "{year}");
            assert!(err.message().contains("9999"), "{}", err.message());
        }

        let out = normalize(json!([{"year": 0, "tfr": 1.0}, {"year": 9999.0, "tfr": 2.0}]), "tfr").unwrap();
        let years: Vec<i64> = out.series.points.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![0, 9999]);
    }

    #[test]
    fn extreme_year_span_is_an_error_not_a_panic() {
        let payload = json!([
            {"year": i64::MIN, "tfr": 1.0},
            {"year": 0, "tfr": null},
            {"year": i64::MAX, "tfr": 2.0},
        ]);
        let err = normalize(payload, "tfr").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFieldType);
        assert!(err.message().starts_with("Item 0"), "{}", err.message());
    }

    #[test]
    fn sorts_by_year_and_keeps_record_order() {
        let payload = json!([
            {"year": 2020, "tfr": 1.38},
            {"year": 2018, "tfr": 1.4},
            {"year": 2019, "tfr": 1.42},
        ]);
        let out = normalize(payload, "tfr").unwrap();

        let years: Vec<i64> = out.series.points.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2018, 2019, 2020]);

        let record_years: Vec<i64> = out.records.iter().map(|r| r["year"].as_i64().unwrap()).collect();
        assert_eq!(record_years, vec![2020, 2018, 2019]);
    }

    #[test]
    fn rounds_values_to_three_decimals() {
        let out = normalize(json!([{"year": 2000, "tfr": 1.23456}]), "tfr").unwrap();
        assert_eq!(out.series.points[0].value, Some(1.235));
    }

    #[test]
    fn interpolates_interior_gaps_by_year() {
        let payload = json!([
            {"year": 2000, "tfr": 1.0},
            {"year": 2001, "tfr": null},
            {"year": 2003, "tfr": null},
            {"year": 2004, "tfr": 2.0},
        ]);
        let out = normalize(payload, "tfr").unwrap();
        assert_eq!(out.interpolated, 2);
        assert_eq!(out.series.values(), vec![Some(1.0), Some(1.25), Some(1.75), Some(2.0)]);
    }

    #[test]
    fn leaves_edge_gaps_missing() {
        let payload = json!([
            {"year": 1939, "tfr": null},
            {"year": 1940, "tfr": 3.0},
            {"year": 1941, "tfr": 2.9},
            {"year": 1942, "tfr": null},
        ]);
        let out = normalize(payload, "tfr").unwrap();
        assert_eq!(out.interpolated, 0);
        assert_eq!(out.series.missing(), 2);
    }

    #[test]
    fn duplicate_years_pass_through() {
        let payload = json!([
            {"year": 2001, "tfr": 1.3},
            {"year": 2000, "tfr": 1.1},
            {"year": 2001, "tfr": 1.5},
        ]);
        let out = normalize(payload, "tfr").unwrap();
        assert_eq!(out.duplicate_years, vec![2001]);
        assert_eq!(out.series.len(), 3);
        // Stable sort: the first 2001 record stays ahead of the second.
        assert_eq!(out.series.values(), vec![Some(1.1), Some(1.3), Some(1.5)]);
    }

    #[test]
    fn custom_value_field() {
        let out = normalize(json!([{"year": 2000, "value": 2.5}]), "value").unwrap();
        assert_eq!(out.series.points[0].value, Some(2.5));
        let err = normalize(json!([{"year": 2000, "tfr": 2.5}]), "value").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingField);
    }

    #[test]
    fn loads_world_bank_style_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tfr.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "\u{feff}Year,FertilityRate").unwrap();
        writeln!(file, "1959,").unwrap();
        writeln!(file, "1960,2.98").unwrap();
        writeln!(file, "1961,2.83").unwrap();
        drop(file);

        let payload = load_payload(&path, "tfr").unwrap();
        assert_eq!(
            payload,
            json!([
                {"year": 1959, "tfr": null},
                {"year": 1960, "tfr": 2.98},
                {"year": 1961, "tfr": 2.83},
            ])
        );
    }

    #[test]
    fn csv_with_bad_value_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "year,tfr\n2000,1.2\n2001,abc\n").unwrap();

        let err = load_payload(&path, "tfr").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedFile);
        assert!(err.message().contains("line 3"), "{}", err.message());
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_payload(&dir.path().join("nope.csv"), "tfr").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
    }
}
