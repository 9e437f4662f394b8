//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - series line: `-`
//! - historical points: `o`
//! - predicted points: `*`
//! - prediction-interval bounds: `.`

use crate::plot::PlotData;

/// Render combined records as a fixed-size character grid.
pub fn render_ascii_plot(data: &PlotData, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = match data.x_range() {
        Some((lo, hi)) if hi > lo => (lo, hi),
        Some((lo, _)) => (lo - 1.0, lo + 1.0),
        None => (0.0, 1.0),
    };
    let (y_min, y_max) = match data.y_range() {
        Some((lo, hi)) if hi > lo => (lo, hi),
        Some((lo, _)) => (lo - 1.0, lo + 1.0),
        None => (0.0, 1.0),
    };
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw the line first (so points can overlay).
    draw_curve(&mut grid, &data.line(), x_min, x_max, y_min, y_max);

    for &(year, lo, hi) in &data.bands {
        let x = map_x(year, x_min, x_max, width);
        for bound in [lo, hi] {
            let y = map_y(bound, y_min, y_max, height);
            if grid[y][x] == ' ' {
                grid[y][x] = '.';
            }
        }
    }

    for &(year, v) in &data.historical {
        grid[map_y(v, y_min, y_max, height)][map_x(year, x_min, x_max, width)] = 'o';
    }
    for &(year, v) in &data.predicted {
        grid[map_y(v, y_min, y_max, height)][map_x(year, x_min, x_max, width)] = '*';
    }

    // Build final string. We include a small header with ranges.
    let mut out = String::new();
    out.push_str(&format!(
        "Plot: years=[{x_min:.0}, {x_max:.0}] | {}=[{y_min:.2}, {y_max:.2}] | o historical, * predicted\n",
        data.label
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, y) in curve {
        let x = map_x(t, x_min, x_max, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, x, yy, '-');
        } else {
            grid[yy][x] = '-';
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(historical: Vec<(f64, f64)>, predicted: Vec<(f64, f64)>) -> PlotData {
        PlotData {
            label: "tfr".to_string(),
            historical,
            predicted,
            bands: Vec::new(),
        }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let txt = render_ascii_plot(&data(vec![(2000.0, 1.0)], vec![(2009.0, 2.0)]), 10, 5);
        let expected = concat!(
            "Plot: years=[2000, 2009] | tfr=[0.95, 2.05] | o historical, * predicted\n",
            "        -*\n",
            "      --  \n",
            "    --    \n",
            "  --      \n",
            "o-        \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn bands_are_marked() {
        let mut d = data(vec![(2000.0, 1.5), (2001.0, 1.5)], vec![(2002.0, 1.5)]);
        d.bands.push((2002.0, 1.0, 2.0));
        let txt = render_ascii_plot(&d, 12, 7);
        let rows: Vec<&str> = txt.lines().skip(1).collect();
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0].chars().last(), Some('.'));
        assert_eq!(rows[6].chars().last(), Some('.'));
        assert_eq!(rows[3].chars().last(), Some('*'));
    }

    #[test]
    fn empty_data_renders_blank_grid() {
        let txt = render_ascii_plot(&PlotData::default(), 10, 5);
        assert_eq!(txt.lines().count(), 6);
        assert!(txt.lines().skip(1).all(|l| l.trim().is_empty()));
    }
}
