//! Charts of combined (historical + predicted) records.
//!
//! - terminal plot in plain characters (`ascii`)
//! - SVG file via plotters (`svg`)

use serde_json::Value;

use crate::io::ingest::Record;

pub mod ascii;
pub mod svg;

pub use ascii::*;
pub use svg::*;

/// Plot-ready view of combined records, split by the `predicted` flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotData {
    /// Name of the plotted value (axis/header label).
    pub label: String,
    pub historical: Vec<(f64, f64)>,
    pub predicted: Vec<(f64, f64)>,
    /// `(year, lower, upper)` for predicted records that carry bounds.
    pub bands: Vec<(f64, f64, f64)>,
}

impl PlotData {
    /// Build from combined records. Records without a numeric year or value are
    /// skipped; a missing `predicted` flag counts as historical.
    pub fn from_records(records: &[Record], value_field: &str) -> Self {
        let mut data = PlotData {
            label: value_field.to_string(),
            ..PlotData::default()
        };

        for r in records {
            let (Some(year), Some(value)) = (
                r.get("year").and_then(Value::as_f64),
                r.get(value_field).and_then(Value::as_f64),
            ) else {
                continue;
            };

            if r.get("predicted").and_then(Value::as_bool).unwrap_or(false) {
                data.predicted.push((year, value));
                if let (Some(lo), Some(hi)) = (
                    r.get("lower").and_then(Value::as_f64),
                    r.get("upper").and_then(Value::as_f64),
                ) {
                    data.bands.push((year, lo, hi));
                }
            } else {
                data.historical.push((year, value));
            }
        }

        data.historical.sort_by(|a, b| a.0.total_cmp(&b.0));
        data.predicted.sort_by(|a, b| a.0.total_cmp(&b.0));
        data
    }

    pub fn is_empty(&self) -> bool {
        self.historical.is_empty() && self.predicted.is_empty()
    }

    /// All plotted values in year order (historical then predicted).
    pub fn line(&self) -> Vec<(f64, f64)> {
        self.historical.iter().chain(&self.predicted).copied().collect()
    }

    pub fn x_range(&self) -> Option<(f64, f64)> {
        range(self.line().iter().map(|p| p.0))
    }

    pub fn y_range(&self) -> Option<(f64, f64)> {
        let values = self.line().into_iter().map(|p| p.1);
        let bounds = self.bands.iter().flat_map(|b| [b.1, b.2]);
        range(values.chain(bounds))
    }
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    (min.is_finite() && max.is_finite()).then_some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn splits_records_by_flag() {
        let records: Vec<Record> = json!([
            {"year": 2001, "tfr": 1.3, "predicted": false},
            {"year": 2000, "tfr": 1.35},
            {"year": 2002, "tfr": null, "predicted": false},
            {"year": 2003, "tfr": 1.28, "predicted": true, "lower": 1.1, "upper": 1.5}
        ])
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_object().unwrap().clone())
        .collect();

        let data = PlotData::from_records(&records, "tfr");
        assert_eq!(data.historical, vec![(2000.0, 1.35), (2001.0, 1.3)]);
        assert_eq!(data.predicted, vec![(2003.0, 1.28)]);
        assert_eq!(data.bands, vec![(2003.0, 1.1, 1.5)]);
        assert_eq!(data.x_range(), Some((2000.0, 2003.0)));
        assert_eq!(data.y_range(), Some((1.1, 1.5)));
    }
}
