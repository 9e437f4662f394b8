//! SVG chart export via plotters.
//!
//! The chart carries no text (plotters is built without font support): the
//! historical series in blue, the forecast in red, and the prediction band as
//! a translucent polygon. Light horizontal rules mark whole units.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::info;

use crate::error::{AppError, ErrorKind};
use crate::plot::PlotData;

pub const SVG_WIDTH: u32 = 960;
pub const SVG_HEIGHT: u32 = 540;

/// Unit rules are drawn only when the value axis spans at most this many units.
const MAX_RULES: f64 = 50.0;

/// Write the chart to `path`.
pub fn write_svg_chart(path: &Path, data: &PlotData) -> Result<(), AppError> {
    if data.is_empty() {
        return Err(AppError::new(ErrorKind::Config, "Nothing to plot: no numeric records."));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to create '{}': {e}", parent.display())))?;
    }

    let root = SVGBackend::new(path, (SVG_WIDTH, SVG_HEIGHT)).into_drawing_area();
    draw_chart(&root, data)
        .and_then(|_| root.present())
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to render chart '{}': {e}", path.display())))?;

    info!(path = %path.display(), "wrote SVG chart");
    Ok(())
}

fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    data: &PlotData,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let (x0, x1) = match data.x_range() {
        Some((lo, hi)) if hi > lo => (lo, hi),
        Some((lo, _)) => (lo - 1.0, lo + 1.0),
        None => (0.0, 1.0),
    };
    let (y0, y1) = match data.y_range() {
        Some((lo, hi)) if hi > lo => (lo.min(0.0), hi * 1.05),
        Some((lo, _)) => (lo.min(0.0), lo + 1.0),
        None => (0.0, 1.0),
    };

    let mut chart = ChartBuilder::on(root).margin(24).build_cartesian_2d(x0..x1, y0..y1)?;

    if y1 - y0 <= MAX_RULES {
        let grey = RGBColor(220, 220, 220);
        let mut y = y0.ceil();
        while y <= y1 {
            chart.draw_series(LineSeries::new([(x0, y), (x1, y)], &grey))?;
            y += 1.0;
        }
    }

    if !data.bands.is_empty() {
        let mut outline: Vec<(f64, f64)> = data.bands.iter().map(|&(x, _, hi)| (x, hi)).collect();
        outline.extend(data.bands.iter().rev().map(|&(x, lo, _)| (x, lo)));
        chart.draw_series(std::iter::once(Polygon::new(outline, RED.mix(0.15))))?;
    }

    chart.draw_series(LineSeries::new(data.historical.iter().copied(), BLUE.stroke_width(2)))?;
    chart.draw_series(data.historical.iter().map(|&p| Circle::new(p, 3, BLUE.filled())))?;

    // Join the forecast to the last observation so the line is continuous.
    let forecast_line: Vec<(f64, f64)> = data
        .historical
        .last()
        .into_iter()
        .chain(&data.predicted)
        .copied()
        .collect();
    chart.draw_series(LineSeries::new(forecast_line, RED.stroke_width(2)))?;
    chart.draw_series(data.predicted.iter().map(|&p| Circle::new(p, 3, RED.filled())))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_to_string(data: &PlotData) -> String {
        let mut buf = String::new();
        {
            let root = SVGBackend::with_string(&mut buf, (SVG_WIDTH, SVG_HEIGHT)).into_drawing_area();
            draw_chart(&root, data).unwrap();
            root.present().unwrap();
        }
        buf
    }

    fn sample() -> PlotData {
        PlotData {
            label: "tfr".to_string(),
            historical: vec![(2018.0, 1.44), (2019.0, 1.42), (2020.0, 1.38)],
            predicted: vec![(2021.0, 1.36), (2022.0, 1.35)],
            bands: vec![(2021.0, 1.2, 1.5), (2022.0, 1.1, 1.6)],
        }
    }

    #[test]
    fn renders_an_svg_document() {
        let svg = render_to_string(&sample());
        assert!(svg.contains("<svg"));
        assert!(svg.contains("<circle"));
        assert!(svg.contains("<polygon"));
    }

    #[test]
    fn huge_values_skip_unit_rules() {
        let data = PlotData {
            label: "tfr".to_string(),
            historical: vec![(2018.0, 1.4), (2019.0, 1e12)],
            predicted: vec![(2020.0, 10.0)],
            bands: Vec::new(),
        };
        let svg = render_to_string(&data);
        assert!(svg.contains("<svg"));
        // Two data lines (historical, forecast) and no rules.
        assert_eq!(svg.matches("<polyline").count(), 2);

        let with_rules = render_to_string(&sample());
        assert!(with_rules.matches("<polyline").count() > 2);
    }

    #[test]
    fn writes_file_and_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charts").join("tfr.svg");
        write_svg_chart(&path, &sample()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("<svg"));
    }

    #[test]
    fn empty_data_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_svg_chart(&dir.path().join("x.svg"), &PlotData::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
