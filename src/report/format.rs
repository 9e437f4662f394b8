//! Formatted terminal output for batch runs.
//!
//! We keep formatting code in one place so:
//! - the model and pipeline code stay clean and testable
//! - output changes are localized

use crate::app::pipeline::PipelineOutput;
use crate::domain::{ForecastConfig, Observation, Toggle};

/// Format the full run summary (dataset stats + fit diagnostics + chosen model).
pub fn format_run_summary(run: &PipelineOutput, config: &ForecastConfig) -> String {
    let mut out = String::new();

    out.push_str("=== tfr - Total Fertility Rate Forecast ===\n");
    out.push_str(&format!(
        "Series: n={} | years=[{}, {}] | interpolated={}\n",
        run.series.len(),
        fmt_year(run.series.first_year()),
        fmt_year(run.series.last_year()),
        run.interpolated,
    ));
    if !run.duplicate_years.is_empty() {
        let years: Vec<String> = run.duplicate_years.iter().map(|y| y.to_string()).collect();
        out.push_str(&format!("Duplicate years: {}\n", years.join(", ")));
    }
    out.push_str(&format!(
        "Options: box-cox={} trend={} damped={} | horizon={}\n",
        fmt_toggle(config.model.seasonal_transform),
        fmt_toggle(config.model.trend),
        fmt_toggle(config.model.damped_trend),
        config.horizon,
    ));

    out.push_str("\nModel diagnostics:\n");
    for fit in &run.summary.candidates {
        let chosen = if fit.description == run.summary.chosen.description { "*" } else { " " };
        out.push_str(&format!(
            "{chosen} {:<44} SSE={:.5} RMSE={:.4} AIC={:.3}\n",
            fit.description, fit.sse, fit.rmse, fit.aic
        ));
    }
    for reason in &run.summary.skipped {
        out.push_str(&format!("  (skipped) {reason}\n"));
    }

    out.push_str("\nChosen model:\n");
    out.push_str(&format!("- {}: {}\n", run.summary.model, run.summary.chosen.description));
    out.push('\n');

    out.push_str(&format_prediction_table(&run.predictions));
    out
}

/// Format predicted records as a table (bounds shown when present).
pub fn format_prediction_table(rows: &[Observation]) -> String {
    let with_bounds = rows.iter().any(|r| r.interval.is_some());
    let mut out = String::new();

    if with_bounds {
        out.push_str(&format!("{:<6} {:>8} {:>8} {:>8}\n", "year", "value", "lower", "upper"));
        out.push_str(&format!("{:-<6} {:-<8} {:-<8} {:-<8}\n", "", "", "", ""));
    } else {
        out.push_str(&format!("{:<6} {:>8}\n", "year", "value"));
        out.push_str(&format!("{:-<6} {:-<8}\n", "", ""));
    }

    for r in rows {
        match (with_bounds, r.interval) {
            (true, Some(iv)) => out.push_str(&format!(
                "{:<6} {:>8.3} {:>8.3} {:>8.3}\n",
                r.year, r.value, iv.lower, iv.upper
            )),
            (true, None) => out.push_str(&format!("{:<6} {:>8.3} {:>8} {:>8}\n", r.year, r.value, "-", "-")),
            (false, _) => out.push_str(&format!("{:<6} {:>8.3}\n", r.year, r.value)),
        }
    }

    out
}

fn fmt_year(year: Option<i64>) -> String {
    year.map_or_else(|| "-".to_string(), |y| y.to_string())
}

fn fmt_toggle(t: Toggle) -> &'static str {
    match t {
        Toggle::Auto => "auto",
        Toggle::On => "on",
        Toggle::Off => "off",
    }
}
