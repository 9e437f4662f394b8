//! Result assembly: forecast values -> records, clamping, and the merge with the
//! historical records.

use serde_json::{Number, Value};

use crate::domain::{Forecast, Interval, Observation};
use crate::io::ingest::Record;

/// Round to 3 decimals (half away from zero). Non-finite values pass through.
pub fn round3(x: f64) -> f64 {
    if !x.is_finite() {
        return x;
    }
    (x * 1000.0).round() / 1000.0
}

/// Attach consecutive years to forecast values, starting at `start_year`.
///
/// Values (and interval bounds) are rounded and floored at zero.
pub fn format_predictions(forecast: &Forecast, start_year: i64) -> Vec<Observation> {
    forecast
        .values
        .iter()
        .enumerate()
        .map(|(i, &v)| Observation {
            year: start_year.saturating_add(i as i64),
            value: round3(v).max(0.0),
            predicted: true,
            interval: forecast.intervals.as_ref().and_then(|ivs| ivs.get(i)).map(|iv| Interval {
                lower: round3(iv.lower).max(0.0),
                upper: round3(iv.upper).max(0.0),
            }),
        })
        .collect()
}

/// Clamp every value (and interval bound) into `[min, max]`.
pub fn validate(mut records: Vec<Observation>, min: f64, max: f64) -> Vec<Observation> {
    for r in &mut records {
        r.value = r.value.clamp(min, max);
        if let Some(iv) = &mut r.interval {
            iv.lower = iv.lower.clamp(min, max);
            iv.upper = iv.upper.clamp(min, max);
        }
    }
    records
}

/// Historical records (original order, `predicted: false`, values rounded)
/// followed by the predicted ones.
pub fn combine(historical: Vec<Record>, predicted: &[Observation], value_field: &str) -> Vec<Record> {
    let mut out = Vec::with_capacity(historical.len() + predicted.len());

    for mut record in historical {
        if let Some(v) = record.get(value_field).and_then(Value::as_f64) {
            record.insert(value_field.to_string(), number(round3(v)));
        }
        record.insert("predicted".to_string(), Value::Bool(false));
        out.push(record);
    }

    for obs in predicted {
        let mut record = Record::new();
        record.insert("year".to_string(), Value::from(obs.year));
        record.insert(value_field.to_string(), number(obs.value));
        record.insert("predicted".to_string(), Value::Bool(true));
        if let Some(iv) = obs.interval {
            record.insert("lower".to_string(), number(iv.lower));
            record.insert("upper".to_string(), number(iv.upper));
        }
        out.push(record);
    }

    out
}

fn number(x: f64) -> Value {
    Number::from_f64(x).map_or(Value::Null, Value::Number)
}
